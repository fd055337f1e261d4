//! Handlers for `/users` endpoints.
//!
//! Viewing, updating and deleting one's own account is always allowed. A
//! caller editing itself through that override cannot change its own roles
//! unless it also holds `"update user"`. Omitting `role_ids` keeps the
//! current set.
//!
//! Request bodies are only decoded once the policy has allowed the action.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use flock_core::{
  permission::{Action, PermissionKey, Resource},
  policy::{Actor, Policy, UserPolicy, authorize},
  store::MembershipStore,
  user::{UserRecord, UserUpdate},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{auth::CurrentActor, error::ApiError, validate};

async fn find<S: MembershipStore>(store: &S, id: Uuid) -> Result<UserRecord, ApiError> {
  store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /users`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<UserRecord>>, ApiError>
where
  S: MembershipStore + 'static,
{
  authorize::<UserPolicy>(&actor, Action::ViewAny, None)?;
  let users = store.list_users().await.map_err(ApiError::store)?;
  Ok(Json(users))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
  #[serde(default)]
  pub name:                  String,
  #[serde(default)]
  pub email:                 String,
  #[serde(default)]
  pub password:              String,
  pub password_confirmation: Option<String>,
  #[serde(default)]
  pub role_ids:              Vec<Uuid>,
}

/// `POST /users`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  body: Result<Json<CreateUserBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MembershipStore + 'static,
{
  authorize::<UserPolicy>(&actor, Action::Create, None)?;
  let Json(body) = body?;
  let input = validate::new_user(body)?;

  let record = store.create_user(input).await.map_err(ApiError::store)?;
  tracing::info!(
    user_id = %record.user.user_id,
    actor = %actor.user_id,
    "user created"
  );
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /users/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<Json<UserRecord>, ApiError>
where
  S: MembershipStore + 'static,
{
  let record = find(store.as_ref(), id).await?;
  authorize::<UserPolicy>(&actor, Action::View, Some(&record.user))?;
  Ok(Json(record))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateUserBody {
  #[serde(default)]
  pub name:                  String,
  #[serde(default)]
  pub email:                 String,
  pub password:              Option<String>,
  pub password_confirmation: Option<String>,
  /// Absent keeps the current role set.
  pub role_ids:              Option<Vec<Uuid>>,
}

/// Reject a role change made through the self-access override alone.
fn guard_role_change(
  actor: &Actor,
  current: &UserRecord,
  input: &UserUpdate,
) -> Result<(), ApiError> {
  let update_user = PermissionKey::new(Action::Update, Resource::User);
  if !actor.is(&current.user) || actor.holds(update_user) {
    return Ok(());
  }

  if validate::same_roles(&input.role_ids, &current.role_ids()) {
    Ok(())
  } else {
    Err(ApiError::Forbidden(UserPolicy::required_permission(Action::Update)))
  }
}

/// `PUT /users/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
  body: Result<Json<UpdateUserBody>, JsonRejection>,
) -> Result<Json<UserRecord>, ApiError>
where
  S: MembershipStore + 'static,
{
  let current = find(store.as_ref(), id).await?;
  authorize::<UserPolicy>(&actor, Action::Update, Some(&current.user))?;
  let Json(body) = body?;
  let input = validate::user_update(body, &current.role_ids())?;
  guard_role_change(&actor, &current, &input)?;

  let record = store.update_user(id, input).await.map_err(ApiError::store)?;
  tracing::info!(user_id = %id, actor = %actor.user_id, "user updated");
  Ok(Json(record))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /users/:id`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: MembershipStore + 'static,
{
  let current = find(store.as_ref(), id).await?;
  authorize::<UserPolicy>(&actor, Action::Delete, Some(&current.user))?;

  store.delete_user(id).await.map_err(ApiError::store)?;
  tracing::info!(user_id = %id, actor = %actor.user_id, "user deleted");
  Ok(StatusCode::NO_CONTENT)
}
