//! Production records: the unit of data the ledger stores.

use std::{fmt, iter::Sum, ops::Add};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error,
  period::Period,
  plant::{Line, Plant},
};

// ─── Quantity ────────────────────────────────────────────────────────────────

/// A non-negative production count.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
  pub const ZERO: Self = Self(0);

  pub const fn new(value: u64) -> Self { Self(value) }

  pub const fn get(self) -> u64 { self.0 }
}

impl From<u64> for Quantity {
  fn from(value: u64) -> Self { Self(value) }
}

impl TryFrom<i64> for Quantity {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self, Error> {
    u64::try_from(value)
      .map(Self)
      .map_err(|_| Error::NegativeQuantity(value))
  }
}

impl Add for Quantity {
  type Output = Self;

  fn add(self, rhs: Self) -> Self { Self(self.0.saturating_add(rhs.0)) }
}

impl Sum for Quantity {
  fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
    iter.fold(Self::ZERO, Add::add)
  }
}

impl<'a> Sum<&'a Quantity> for Quantity {
  fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
    iter.copied().sum()
  }
}

impl fmt::Display for Quantity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

// ─── Key ─────────────────────────────────────────────────────────────────────

/// The composite key under which at most one quantity exists.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LedgerKey {
  pub plant:  Plant,
  pub line:   Line,
  pub period: Period,
}

// ─── Attachment ──────────────────────────────────────────────────────────────

/// An image attached to a submission. Only a reference lives in the ledger;
/// the bytes are stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
  /// Path relative to the configured attachment directory.
  pub path:         String,
  /// SHA-256 hex digest of the stored bytes.
  pub content_hash: String,
  pub media_type:   String,
}

// ─── ProductionRecord ────────────────────────────────────────────────────────

/// A stored quantity for one (plant, line, period).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRecord {
  pub plant:       Plant,
  pub line:        Line,
  pub period:      Period,
  pub quantity:    Quantity,
  pub remarks:     Option<String>,
  pub attachment:  Option<Attachment>,
  /// Server-assigned time of the submission that produced this value.
  pub recorded_at: DateTime<Utc>,
}

impl ProductionRecord {
  pub fn key(&self) -> LedgerKey {
    LedgerKey {
      plant:  self.plant.clone(),
      line:   self.line.clone(),
      period: self.period,
    }
  }
}

// ─── NewRecord ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::LedgerStore::upsert`].
/// `recorded_at` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
  pub plant:      Plant,
  pub line:       Line,
  pub period:     Period,
  pub quantity:   Quantity,
  pub remarks:    Option<String>,
  pub attachment: Option<Attachment>,
}

impl NewRecord {
  /// Convenience constructor with no remarks and no attachment.
  pub fn new(plant: Plant, line: Line, period: Period, quantity: Quantity) -> Self {
    Self { plant, line, period, quantity, remarks: None, attachment: None }
  }

  pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
    self.remarks = Some(remarks.into());
    self
  }

  pub fn into_record(self, recorded_at: DateTime<Utc>) -> ProductionRecord {
    ProductionRecord {
      plant: self.plant,
      line: self.line,
      period: self.period,
      quantity: self.quantity,
      remarks: self.remarks.filter(|r| !r.trim().is_empty()),
      attachment: self.attachment,
      recorded_at,
    }
  }
}
