//! The policy evaluator.
//!
//! Every decision is a pure function of an explicit [`Actor`], an [`Action`]
//! and, for instance-scoped actions, the target. Nothing here performs I/O or
//! consults ambient state; callers load the actor once per request and pass
//! it in.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  permission::{Action, PermissionKey, Resource},
  person::Person,
  user::User,
};

// ─── Actor ───────────────────────────────────────────────────────────────────

/// The permissions an actor holds through its roles, materialised once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(HashSet<PermissionKey>);

impl PermissionSet {
  pub fn contains(&self, key: PermissionKey) -> bool { self.0.contains(&key) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// The held permissions in catalog order.
  pub fn sorted(&self) -> Vec<PermissionKey> {
    let mut keys: Vec<PermissionKey> = self.0.iter().copied().collect();
    keys.sort();
    keys
  }
}

impl FromIterator<PermissionKey> for PermissionSet {
  fn from_iter<I: IntoIterator<Item = PermissionKey>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

impl Serialize for PermissionSet {
  fn serialize<S: serde::Serializer>(
    &self,
    serializer: S,
  ) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(self.sorted())
  }
}

/// An authenticated user as seen by the policy evaluator.
#[derive(Debug, Clone, Serialize)]
pub struct Actor {
  pub user_id:     Uuid,
  pub permissions: PermissionSet,
}

impl Actor {
  pub fn new(user_id: Uuid, permissions: PermissionSet) -> Self {
    Self { user_id, permissions }
  }

  /// Exact-key lookup in the actor's permission set.
  pub fn holds(&self, key: PermissionKey) -> bool {
    self.permissions.contains(key)
  }

  pub fn is(&self, user: &User) -> bool { self.user_id == user.user_id }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Authorization rules for one resource kind.
pub trait Policy {
  /// The instance type instance-scoped actions are checked against.
  type Target;

  const RESOURCE: Resource;

  /// Allow or deny `action`. Never fails.
  fn check(actor: &Actor, action: Action, target: Option<&Self::Target>) -> bool;

  /// The permission that grants `action` when no override applies.
  fn required_permission(action: Action) -> PermissionKey {
    PermissionKey::new(action, Self::RESOURCE)
  }
}

/// People: a plain permission check for every action.
pub struct PersonPolicy;

impl Policy for PersonPolicy {
  type Target = Person;

  const RESOURCE: Resource = Resource::Person;

  fn check(actor: &Actor, action: Action, _target: Option<&Person>) -> bool {
    actor.holds(Self::required_permission(action))
  }
}

/// Users: a permission check, except that an actor may always view, update
/// and delete its own account.
pub struct UserPolicy;

impl Policy for UserPolicy {
  type Target = User;

  const RESOURCE: Resource = Resource::User;

  fn check(actor: &Actor, action: Action, target: Option<&User>) -> bool {
    let self_service =
      matches!(action, Action::View | Action::Update | Action::Delete);

    if self_service && target.is_some_and(|user| actor.is(user)) {
      return true;
    }

    actor.holds(Self::required_permission(action))
  }

  fn required_permission(action: Action) -> PermissionKey {
    // Viewing another account is governed by the listing permission.
    let action = match action {
      Action::View => Action::ViewAny,
      other => other,
    };
    PermissionKey::new(action, Resource::User)
  }
}

/// Run `P::check` and turn a denial into [`Error::Forbidden`].
pub fn authorize<P: Policy>(
  actor: &Actor,
  action: Action,
  target: Option<&P::Target>,
) -> Result<()> {
  if P::check(actor, action, target) {
    Ok(())
  } else {
    Err(Error::Forbidden(P::required_permission(action)))
  }
}
