//! Handlers available to any authenticated caller: the role catalog and the
//! caller's own profile.

use std::sync::Arc;

use axum::{Json, extract::State};
use flock_core::{
  policy::PermissionSet,
  store::MembershipStore,
  user::{Role, UserRecord},
};
use serde::Serialize;

use crate::{auth::CurrentActor, error::ApiError};

/// `GET /roles`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  CurrentActor(_actor): CurrentActor,
) -> Result<Json<Vec<Role>>, ApiError>
where
  S: MembershipStore + 'static,
{
  let roles = store.list_roles().await.map_err(ApiError::store)?;
  Ok(Json(roles))
}

#[derive(Debug, Serialize)]
pub struct Me {
  #[serde(flatten)]
  pub user:        UserRecord,
  pub permissions: PermissionSet,
}

/// `GET /me`: the caller's account, roles and effective permissions.
pub async fn me<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
) -> Result<Json<Me>, ApiError>
where
  S: MembershipStore + 'static,
{
  let user = store
    .get_user(actor.user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;
  Ok(Json(Me { user, permissions: actor.permissions }))
}
