//! Error type for `flock-store-sqlite`.

use flock_core::store::StoreError;
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A UNIQUE, FOREIGN KEY, NOT NULL or CHECK constraint rejected a write.
  /// The enclosing transaction has been rolled back.
  #[error("constraint violation: {0}")]
  Conflict(String),

  #[error("database error: {0}")]
  Database(#[source] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {kind} value: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },

  #[error("password hashing failed: {0}")]
  PasswordHash(String),

  #[error("person not found: {0}")]
  PersonNotFound(uuid::Uuid),

  #[error("user not found: {0}")]
  UserNotFound(uuid::Uuid),
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(err: tokio_rusqlite::Error) -> Self {
    match err {
      tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
        code,
        message,
      )) if code.code == ErrorCode::ConstraintViolation => {
        Error::Conflict(message.unwrap_or_else(|| code.to_string()))
      }
      other => Error::Database(other),
    }
  }
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool { matches!(self, Error::Conflict(_)) }

  fn is_not_found(&self) -> bool {
    matches!(self, Error::PersonNotFound(_) | Error::UserNotFound(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
