//! [`SqliteStore`]: the SQLite implementation of [`LedgerStore`] and
//! [`ChecklistStore`].

use std::path::Path;

use chrono::Utc;
use tally_core::{
  checklist::{ChecklistGrid, ChecklistTask, Month, SignOff},
  ledger::{Ledger, Scope},
  record::{NewRecord, ProductionRecord},
  store::{ChecklistStore, LedgerStore},
};

use crate::{
  Result,
  encode::{RawRecord, RawSignOff, encode_attachment, encode_dt, encode_quantity},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally ledger backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn scope_filters(scope: &Scope) -> (Option<String>, Option<String>) {
  match scope {
    Scope::All => (None, None),
    Scope::Plant(p) => (Some(p.to_string()), None),
    Scope::Line(p, l) => (Some(p.to_string()), Some(l.to_string())),
  }
}

// ─── LedgerStore impl ────────────────────────────────────────────────────────

impl LedgerStore for SqliteStore {
  type Error = crate::Error;

  async fn upsert(&self, input: NewRecord) -> Result<ProductionRecord> {
    let record = input.into_record(Utc::now());

    let plant_str       = record.plant.to_string();
    let line_str        = record.line.to_string();
    let period_str      = record.period.to_string();
    let granularity_str = record.period.granularity().as_str();
    let quantity_val    = encode_quantity(record.quantity)?;
    let remarks         = record.remarks.clone();
    let attachment_str  = record.attachment.as_ref().map(encode_attachment).transpose()?;
    let recorded_at_str = encode_dt(record.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO production (
             plant, line, period, granularity, quantity,
             remarks, attachment, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT (plant, line, period) DO UPDATE SET
             granularity = excluded.granularity,
             quantity    = excluded.quantity,
             remarks     = excluded.remarks,
             attachment  = excluded.attachment,
             recorded_at = excluded.recorded_at",
          rusqlite::params![
            plant_str,
            line_str,
            period_str,
            granularity_str,
            quantity_val,
            remarks,
            attachment_str,
            recorded_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(
      plant = %record.plant,
      line = %record.line,
      period = %record.period,
      quantity = %record.quantity,
      "upserted production row"
    );
    Ok(record)
  }

  async fn list(&self, scope: Scope) -> Result<Vec<ProductionRecord>> {
    let (plant_str, line_str) = scope_filters(&scope);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT plant, line, period, quantity, remarks, attachment, recorded_at
           FROM production
           WHERE (?1 IS NULL OR plant = ?1)
             AND (?2 IS NULL OR line  = ?2)",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![plant_str, line_str], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // Replaying through a Ledger gives the canonical chronological order.
    let ledger = raws
      .into_iter()
      .map(RawRecord::into_record)
      .collect::<Result<Ledger>>()?;
    Ok(ledger.into_records(&scope))
  }
}

// ─── ChecklistStore impl ─────────────────────────────────────────────────────

impl ChecklistStore for SqliteStore {
  type Error = crate::Error;

  async fn sign_off(
    &self,
    task:     ChecklistTask,
    month:    Month,
    sign_off: SignOff,
  ) -> Result<()> {
    let task_str  = task.label();
    let month_str = month.label();
    let at_str    = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO checklist (task, month, operator, engineer, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (task, month) DO UPDATE SET
             operator    = excluded.operator,
             engineer    = excluded.engineer,
             recorded_at = excluded.recorded_at",
          rusqlite::params![
            task_str,
            month_str,
            sign_off.operator,
            sign_off.engineer,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn grid(&self) -> Result<ChecklistGrid> {
    let raws: Vec<RawSignOff> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT task, month, operator, engineer FROM checklist")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSignOff {
              task:     row.get(0)?,
              month:    row.get(1)?,
              operator: row.get(2)?,
              engineer: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut grid = ChecklistGrid::new();
    for raw in raws {
      let (task, month, sign_off) = raw.into_cell()?;
      grid.set(task, month, sign_off);
    }
    Ok(grid)
  }
}
