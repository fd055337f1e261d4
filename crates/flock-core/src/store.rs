//! The `MembershipStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `flock-store-sqlite`).
//! Higher layers (`flock-api`, `flock-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  permission::PermissionKey,
  person::{PersonInput, PersonRecord, TrashFilter},
  policy::Actor,
  user::{Credentials, NewUser, Role, UserRecord, UserUpdate},
};

/// Classification a caller needs in order to report a store failure.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// A uniqueness, foreign-key or check constraint rejected the write. The
  /// whole unit of work was rolled back.
  fn is_conflict(&self) -> bool;

  /// The root record of an instance-scoped operation does not exist.
  fn is_not_found(&self) -> bool;
}

/// Abstraction over a Flock storage backend.
///
/// Every write is a single atomic unit: either every row it touches commits,
/// or none do and prior state is left untouched.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait MembershipStore: Send + Sync {
  type Error: StoreError;

  // ── People ────────────────────────────────────────────────────────────

  /// Insert a person with its spiritual and contact sub-records and return
  /// the freshly loaded aggregate.
  fn create_person(
    &self,
    input: PersonInput,
  ) -> impl Future<Output = Result<PersonRecord, Self::Error>> + Send + '_;

  /// Replace every field of a live person and both sub-records.
  ///
  /// Optional fields absent from `input` are cleared. Fails with a not-found
  /// error, writing nothing, if the person is missing or trashed.
  fn update_person(
    &self,
    id: Uuid,
    input: PersonInput,
  ) -> impl Future<Output = Result<PersonRecord, Self::Error>> + Send + '_;

  /// Soft-delete a live person. Sub-records are left in place.
  fn delete_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Clear the tombstone of a trashed person.
  fn restore_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<PersonRecord, Self::Error>> + Send + '_;

  /// Permanently remove a person, trashed or not, with its sub-records.
  fn force_delete_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Retrieve a person by UUID. Returns `None` if not found under `trashed`.
  fn get_person(
    &self,
    id: Uuid,
    trashed: TrashFilter,
  ) -> impl Future<Output = Result<Option<PersonRecord>, Self::Error>> + Send + '_;

  /// List people ordered by first name, descending.
  fn list_people(
    &self,
    trashed: TrashFilter,
  ) -> impl Future<Output = Result<Vec<PersonRecord>, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Insert a user with a hashed password and assign `role_ids`.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<UserRecord, Self::Error>> + Send + '_;

  /// Update name and email, re-hash the password if one is supplied, and
  /// sync the role set to exactly `role_ids`.
  fn update_user(
    &self,
    id: Uuid,
    input: UserUpdate,
  ) -> impl Future<Output = Result<UserRecord, Self::Error>> + Send + '_;

  /// Permanently remove a user and its role assignments.
  fn delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + '_;

  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<UserRecord>, Self::Error>> + Send + '_;

  // ── Authentication & authorization data ───────────────────────────────

  /// Look up the stored credential for `email`, if any user has it.
  fn find_credentials(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + '_;

  /// Materialise the [`Actor`] for a user: its id plus every permission
  /// reachable through its roles. Returns `None` if the user does not exist.
  fn load_actor(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Actor>, Self::Error>> + Send + '_;

  // ── Roles ─────────────────────────────────────────────────────────────

  fn list_roles(
    &self,
  ) -> impl Future<Output = Result<Vec<Role>, Self::Error>> + Send + '_;

  /// Create a role holding exactly `permissions`.
  fn create_role(
    &self,
    name: String,
    permissions: Vec<PermissionKey>,
  ) -> impl Future<Output = Result<Role, Self::Error>> + Send + '_;

  /// Seed the permission catalog, the default roles and
  /// [`crate::provision::default_grants`]. Idempotent.
  fn provision(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
