//! The `LedgerStore` and `ChecklistStore` traits.
//!
//! Traits are implemented by storage backends (`tally-store-file`,
//! `tally-store-sqlite`, `tally-sheets`). Higher layers (`tally-api`,
//! `tally-server`) depend on these abstractions, not on any concrete backend.
//! A store handle is constructed once and passed explicitly to every caller.

use std::future::Future;

use crate::{
  checklist::{ChecklistGrid, ChecklistTask, Month, SignOff},
  ledger::{Rollup, Scope},
  period::Granularity,
  record::{NewRecord, ProductionRecord},
};

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// Abstraction over a production-ledger backend.
///
/// Every operation either completes or leaves the store unchanged and
/// returns an error. Reads always go back to the backing store; nothing is
/// cached between calls.
pub trait LedgerStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Record `input`, replacing in full any value stored for the same
  /// (plant, line, period). The `recorded_at` timestamp is set by the store.
  fn upsert(
    &self,
    input: NewRecord,
  ) -> impl Future<Output = Result<ProductionRecord, Self::Error>> + Send + '_;

  /// Every current record within `scope`, ordered by (plant, line, period).
  /// Each call is a fresh read of the backing store.
  fn list(
    &self,
    scope: Scope,
  ) -> impl Future<Output = Result<Vec<ProductionRecord>, Self::Error>> + Send + '_;

  /// Sum the records within `scope` into buckets of `granularity`.
  fn aggregate(
    &self,
    scope: Scope,
    granularity: Granularity,
  ) -> impl Future<Output = Result<Rollup, Self::Error>> + Send + '_ {
    async move {
      let records = self.list(scope).await?;
      Ok(Rollup::from_records(&records, granularity))
    }
  }
}

// ─── Checklist ───────────────────────────────────────────────────────────────

/// Abstraction over a maintenance-checklist backend.
pub trait ChecklistStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Overwrite the cell for (`task`, `month`).
  fn sign_off(
    &self,
    task: ChecklistTask,
    month: Month,
    sign_off: SignOff,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The whole checklist as currently stored.
  fn grid(&self) -> impl Future<Output = Result<ChecklistGrid, Self::Error>> + Send + '_;
}
