//! HTTP Basic-auth extractor resolving the caller to an [`Actor`].

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use flock_core::{policy::Actor, store::MembershipStore};

use crate::error::ApiError;

/// The authenticated caller, with every permission reachable through its
/// roles.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

/// Pull `(email, password)` out of an `Authorization: Basic` header.
///
/// The email is lowercased; stored emails are always lowercase.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((email.trim().to_lowercase(), password.to_owned()))
}

/// Check `password` against the stored credential for `email` and load the
/// matching actor.
pub async fn authenticate<S>(
  store: &S,
  email: String,
  password: &str,
) -> Result<Actor, ApiError>
where
  S: MembershipStore,
{
  let Some(creds) = store
    .find_credentials(email.clone())
    .await
    .map_err(ApiError::store)?
  else {
    tracing::warn!(%email, "authentication failed: unknown email");
    return Err(ApiError::Unauthorized);
  };

  let parsed_hash =
    PasswordHash::new(&creds.password_hash).map_err(|_| ApiError::Unauthorized)?;

  if Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .is_err()
  {
    tracing::warn!(%email, "authentication failed: wrong password");
    return Err(ApiError::Unauthorized);
  }

  // The user may have been deleted between the two reads.
  store
    .load_actor(creds.user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)
}

impl<S> FromRequestParts<Arc<S>> for CurrentActor
where
  S: MembershipStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers)?;
    let actor = authenticate(store.as_ref(), email, &password).await?;
    Ok(CurrentActor(actor))
  }
}
