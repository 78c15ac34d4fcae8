//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, periods in their textual form,
//! attachments as compact JSON.

use chrono::{DateTime, Utc};
use tally_core::{
  checklist::{ChecklistTask, Month, SignOff},
  plant::{Line, Plant},
  record::{Attachment, ProductionRecord, Quantity},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Quantity ────────────────────────────────────────────────────────────────

pub fn encode_quantity(q: Quantity) -> Result<i64> {
  i64::try_from(q.get()).map_err(|_| Error::QuantityOutOfRange(q.get()))
}

// ─── Attachment ──────────────────────────────────────────────────────────────

pub fn encode_attachment(a: &Attachment) -> Result<String> {
  Ok(serde_json::to_string(a)?)
}

pub fn decode_attachment(s: &str) -> Result<Attachment> {
  Ok(serde_json::from_str(s)?)
}

// ─── Raw row types ───────────────────────────────────────────────────────────

/// Raw `production` row as read from SQLite, before domain decoding.
pub struct RawRecord {
  pub plant:       String,
  pub line:        String,
  pub period:      String,
  pub quantity:    i64,
  pub remarks:     Option<String>,
  pub attachment:  Option<String>,
  pub recorded_at: String,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      plant:       row.get(0)?,
      line:        row.get(1)?,
      period:      row.get(2)?,
      quantity:    row.get(3)?,
      remarks:     row.get(4)?,
      attachment:  row.get(5)?,
      recorded_at: row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<ProductionRecord> {
    Ok(ProductionRecord {
      plant:       Plant::new(&self.plant)?,
      line:        Line::new(&self.line)?,
      period:      self.period.parse()?,
      quantity:    Quantity::try_from(self.quantity)?,
      remarks:     self.remarks,
      attachment:  self.attachment.as_deref().map(decode_attachment).transpose()?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw `checklist` row.
pub struct RawSignOff {
  pub task:     String,
  pub month:    String,
  pub operator: String,
  pub engineer: String,
}

impl RawSignOff {
  pub fn into_cell(self) -> Result<(ChecklistTask, Month, SignOff)> {
    Ok((
      self.task.parse()?,
      self.month.parse()?,
      SignOff::new(&self.operator, &self.engineer)?,
    ))
  }
}
