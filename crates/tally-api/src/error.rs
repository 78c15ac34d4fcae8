//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  /// The backing store failed; nothing was applied.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub(crate) fn store(error: impl std::error::Error + Send + Sync + 'static) -> Self {
    tracing::error!(%error, "store operation failed");
    Self::Store(Box::new(error))
  }
}

impl From<tally_core::Error> for ApiError {
  fn from(e: tally_core::Error) -> Self { Self::BadRequest(e.to_string()) }
}

impl From<JsonRejection> for ApiError {
  /// Bodies that are not JSON, or not the expected shape.
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<tally_store_file::Error> for ApiError {
  /// Attachment failures: a rejected image is the caller's fault, a failed
  /// write is ours.
  fn from(e: tally_store_file::Error) -> Self {
    use tally_store_file::Error as E;
    match e {
      E::UnsupportedMediaType(_) | E::AttachmentTooLarge(_) => Self::BadRequest(e.to_string()),
      other => {
        tracing::error!(error = %other, "attachment write failed");
        Self::Internal(other.to_string())
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
