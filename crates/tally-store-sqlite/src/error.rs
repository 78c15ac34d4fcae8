//! Error type for `tally-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] tally_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// SQLite integers are signed; larger quantities cannot be stored.
  #[error("quantity {0} exceeds the storable range")]
  QuantityOutOfRange(u64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
