//! Error types for `tally-core`.
//!
//! Every variant describes input that was rejected before it reached a store.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("quantity must be a non-negative integer, got {0}")]
  NegativeQuantity(i64),

  #[error("invalid period {0:?}: expected YYYY-MM-DD, YYYY-MM or YYYY")]
  InvalidPeriod(String),

  #[error("unknown granularity {0:?}: expected day, month or year")]
  UnknownGranularity(String),

  #[error("{0} must not be empty")]
  EmptyIdentifier(&'static str),

  #[error("unknown plant: {0}")]
  UnknownPlant(String),

  #[error("unknown line {line:?} for plant {plant:?}")]
  UnknownLine { plant: String, line: String },

  #[error("a line filter requires a plant")]
  LineWithoutPlant,

  #[error("unknown checklist task: {0:?}")]
  UnknownTask(String),

  #[error("unknown month: {0:?}")]
  UnknownMonth(String),

  #[error("invalid sign-off {0:?}: expected \"operator | engineer\"")]
  InvalidSignOff(String),

  #[error("{0} must not contain '|'")]
  SeparatorInSignature(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
