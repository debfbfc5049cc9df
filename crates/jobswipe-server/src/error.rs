//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("not found: {0}")]
  NotFound(String),
  #[error("forbidden: {0}")]
  Forbidden(String),
  #[error("conflict: {0}")]
  Conflict(String),
  #[error("internal error: {0}")]
  Internal(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl From<jobswipe_core::Error> for Error {
  fn from(e: jobswipe_core::Error) -> Self {
    use jobswipe_core::Error as Core;
    match e {
      Core::EmptyMessage | Core::Validation(_) => Error::BadRequest(e.to_string()),
      Core::MatchNotFound(_) | Core::ProfileNotFound(_) => Error::NotFound(e.to_string()),
      Core::NotParticipant { .. } | Core::RoleNotSet(_) => Error::Forbidden(e.to_string()),
      Core::Store(inner) => Error::Store(inner),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      Error::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
      Error::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      Error::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      Error::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      Error::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      Error::Internal(m) => {
        tracing::error!(error = %m, "internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, m.clone())
      }
      Error::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if matches!(self, Error::Unauthorized) {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}
