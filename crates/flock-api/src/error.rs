//! API error type and [`axum::response::IntoResponse`] implementation.

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use flock_core::{permission::PermissionKey, store::StoreError};
use serde_json::json;
use thiserror::Error;

/// Field name → human-readable messages, in field order.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthenticated")]
  Unauthorized,

  /// The policy evaluator denied the action. No side effect has happened.
  #[error("forbidden: missing permission \"{0}\"")]
  Forbidden(PermissionKey),

  #[error("not found: {0}")]
  NotFound(String),

  /// The body was not JSON or did not match the expected shape.
  #[error("invalid request body: {message}")]
  InvalidBody { status: StatusCode, message: String },

  #[error("validation failed")]
  Validation(FieldErrors),

  /// A store constraint rejected the write and it was rolled back.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store failure.
  pub fn store<E: StoreError>(err: E) -> Self {
    if err.is_conflict() {
      ApiError::Conflict(err.to_string())
    } else if err.is_not_found() {
      ApiError::NotFound(err.to_string())
    } else {
      ApiError::Store(Box::new(err))
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::InvalidBody {
      status:  rejection.status(),
      message: rejection.body_text(),
    }
  }
}

impl From<flock_core::Error> for ApiError {
  fn from(err: flock_core::Error) -> Self {
    match err {
      flock_core::Error::Forbidden(key) => ApiError::Forbidden(key),
      flock_core::Error::PersonNotFound(id) => {
        ApiError::NotFound(format!("person {id} not found"))
      }
      flock_core::Error::UserNotFound(id) => {
        ApiError::NotFound(format!("user {id} not found"))
      }
      other => ApiError::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "unauthenticated" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"flock\""),
        );
        res
      }
      ApiError::Forbidden(key) => {
        tracing::debug!(permission = %key, "request denied by policy");
        (
          StatusCode::FORBIDDEN,
          Json(json!({ "error": "this action is unauthorized" })),
        )
          .into_response()
      }
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::InvalidBody { status, message } => {
        (status, Json(json!({ "error": message }))).into_response()
      }
      ApiError::Validation(fields) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": "validation failed", "fields": fields })),
      )
        .into_response(),
      // Constraint details stay in the log; clients get no field attribution.
      ApiError::Conflict(detail) => {
        tracing::warn!(%detail, "write rejected by store constraint");
        (
          StatusCode::CONFLICT,
          Json(json!({ "error": "the request conflicts with existing data" })),
        )
          .into_response()
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": e.to_string() })),
        )
          .into_response()
      }
    }
  }
}
