//! Error types for `flock-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::permission::PermissionKey;

#[derive(Debug, Error)]
pub enum Error {
  /// The policy evaluator denied the action. Carries the permission the actor
  /// would have needed.
  #[error("forbidden: missing permission \"{0}\"")]
  Forbidden(PermissionKey),

  #[error("person not found: {0}")]
  PersonNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("unknown permission: {0:?}")]
  UnknownPermission(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
