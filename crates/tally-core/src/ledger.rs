//! The in-memory ledger and its rollups.
//!
//! Stores persist records in whatever shape suits them; reads replay those
//! records into a [`Ledger`], which enforces last-write-wins per key. A
//! [`Rollup`] is always derived from ledger records and never persisted.

use std::collections::{BTreeMap, btree_map};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  period::{Granularity, Period},
  plant::{Line, Plant},
  record::{LedgerKey, ProductionRecord, Quantity},
};

/// Upper bound on the number of points [`Rollup::series`] produces.
pub const MAX_SERIES_POINTS: usize = 5_000;

// ─── Scope ───────────────────────────────────────────────────────────────────

/// Which part of the plant → line hierarchy a query covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
  #[default]
  All,
  Plant(Plant),
  Line(Plant, Line),
}

impl Scope {
  /// Build a scope from optional filters; a line without a plant is
  /// ambiguous and rejected.
  pub fn from_parts(plant: Option<Plant>, line: Option<Line>) -> Result<Self> {
    match (plant, line) {
      (None, None) => Ok(Self::All),
      (Some(p), None) => Ok(Self::Plant(p)),
      (Some(p), Some(l)) => Ok(Self::Line(p, l)),
      (None, Some(_)) => Err(Error::LineWithoutPlant),
    }
  }

  pub fn includes(&self, plant: &Plant, line: &Line) -> bool {
    match self {
      Self::All => true,
      Self::Plant(p) => p == plant,
      Self::Line(p, l) => p == plant && l == line,
    }
  }
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// Every current record, keyed by (plant, line, period).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
  entries: BTreeMap<LedgerKey, ProductionRecord>,
}

impl Ledger {
  pub fn new() -> Self { Self::default() }

  /// Insert `record`, replacing in full any record with the same key.
  /// Returns the replaced record.
  pub fn apply(&mut self, record: ProductionRecord) -> Option<ProductionRecord> {
    self.entries.insert(record.key(), record)
  }

  pub fn get(&self, key: &LedgerKey) -> Option<&ProductionRecord> {
    self.entries.get(key)
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Records within `scope`, ordered by (plant, line, period).
  pub fn records<'a>(
    &'a self,
    scope: &'a Scope,
  ) -> impl Iterator<Item = &'a ProductionRecord> + 'a {
    self
      .entries
      .values()
      .filter(move |r| scope.includes(&r.plant, &r.line))
  }

  pub fn into_records(self, scope: &Scope) -> Vec<ProductionRecord> {
    self
      .entries
      .into_values()
      .filter(|r| scope.includes(&r.plant, &r.line))
      .collect()
  }

  pub fn aggregate(&self, scope: &Scope, granularity: Granularity) -> Rollup {
    Rollup::from_records(self.records(scope), granularity)
  }

  /// Sum of every record in `scope` that lies within `period`. Zero when
  /// nothing was recorded.
  pub fn total(&self, scope: &Scope, period: &Period) -> Quantity {
    self
      .records(scope)
      .filter(|r| period.contains(&r.period))
      .map(|r| r.quantity)
      .sum()
  }

  /// Per-line totals within `period`, for every line in `scope` that has at
  /// least one record anywhere in the ledger. Lines without entries in the
  /// period appear with zero.
  pub fn totals_by_line(
    &self,
    scope: &Scope,
    period: &Period,
  ) -> BTreeMap<(Plant, Line), Quantity> {
    let mut totals = BTreeMap::new();
    for r in self.records(scope) {
      let slot = totals
        .entry((r.plant.clone(), r.line.clone()))
        .or_insert(Quantity::ZERO);
      if period.contains(&r.period) {
        *slot = *slot + r.quantity;
      }
    }
    totals
  }
}

impl FromIterator<ProductionRecord> for Ledger {
  /// Replays records in order; later records win.
  fn from_iter<I: IntoIterator<Item = ProductionRecord>>(iter: I) -> Self {
    let mut ledger = Self::new();
    ledger.extend(iter);
    ledger
  }
}

impl Extend<ProductionRecord> for Ledger {
  fn extend<I: IntoIterator<Item = ProductionRecord>>(&mut self, iter: I) {
    for record in iter {
      self.apply(record);
    }
  }
}

impl IntoIterator for Ledger {
  type Item = ProductionRecord;
  type IntoIter = btree_map::IntoValues<LedgerKey, ProductionRecord>;

  fn into_iter(self) -> Self::IntoIter { self.entries.into_values() }
}

// ─── Rollup ──────────────────────────────────────────────────────────────────

/// Quantities summed into buckets of one granularity.
///
/// Only buckets with at least one record are held. Reading any other period
/// yields zero; absence of a record means nothing was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rollup {
  granularity: Granularity,
  totals:      BTreeMap<Period, Quantity>,
}

impl Rollup {
  pub fn empty(granularity: Granularity) -> Self {
    Self { granularity, totals: BTreeMap::new() }
  }

  /// Sum `records` into buckets of `granularity`. A record kept at a coarser
  /// granularity than requested (e.g. a monthly figure in a daily rollup) is
  /// not split across finer buckets and is left out.
  pub fn from_records<'a>(
    records: impl IntoIterator<Item = &'a ProductionRecord>,
    granularity: Granularity,
  ) -> Self {
    let mut rollup = Self::empty(granularity);
    for r in records {
      if let Some(bucket) = r.period.truncate(granularity) {
        let slot = rollup.totals.entry(bucket).or_insert(Quantity::ZERO);
        *slot = *slot + r.quantity;
      }
    }
    rollup
  }

  pub fn granularity(&self) -> Granularity { self.granularity }

  /// Total for `period`. For a period coarser than the rollup this is the
  /// sum of the buckets inside it; a finer period holds no whole bucket and
  /// reads as zero.
  pub fn get(&self, period: &Period) -> Quantity {
    if period.granularity() == self.granularity {
      return self.totals.get(period).copied().unwrap_or_default();
    }
    self
      .totals
      .range(Period::containing(period.start(), self.granularity)..)
      .take_while(|(bucket, _)| bucket.start() <= period.end())
      .filter(|(bucket, _)| period.contains(bucket))
      .map(|(_, q)| *q)
      .sum()
  }

  pub fn total(&self) -> Quantity { self.totals.values().sum() }

  pub fn is_empty(&self) -> bool { self.totals.is_empty() }

  /// Non-empty buckets in chronological order.
  pub fn iter(&self) -> impl Iterator<Item = (&Period, &Quantity)> {
    self.totals.iter()
  }

  /// Every bucket from the one containing `from` to the one containing
  /// `to`, zero-filled. At most [`MAX_SERIES_POINTS`] points are returned.
  pub fn series(&self, from: &Period, to: &Period) -> Vec<(Period, Quantity)> {
    let first = Period::containing(from.start(), self.granularity);
    let last = Period::containing(to.end(), self.granularity);
    std::iter::successors(Some(first), |p| p.succ())
      .take_while(|p| *p <= last)
      .take(MAX_SERIES_POINTS)
      .map(|p| (p, self.get(&p)))
      .collect()
  }
}
