//! Error type for `tally-sheets`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The request never produced a response (DNS, TLS, timeout, …).
  #[error("sheet unreachable: {0}")]
  Http(#[from] reqwest::Error),

  #[error("invalid sheet base url: {0}")]
  InvalidBaseUrl(String),

  #[error("sheet rejected credentials ({0})")]
  Unauthorized(StatusCode),

  #[error("sheet request failed ({status}): {body}")]
  Status { status: StatusCode, body: String },

  #[error("malformed row: {0}")]
  MalformedRow(String),

  #[error("core error: {0}")]
  Core(#[from] tally_core::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
