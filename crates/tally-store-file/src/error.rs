//! Error type for `tally-store-file`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error on {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("core error: {0}")]
  Core(#[from] tally_core::Error),

  #[error("unsupported attachment type: {0}")]
  UnsupportedMediaType(String),

  #[error("attachment of {0} bytes exceeds the size limit")]
  AttachmentTooLarge(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
