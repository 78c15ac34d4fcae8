//! [`CsvLogStore`]: an append-only CSV log of submissions.
//!
//! Every upsert appends one row. Reads replay the log in file order, so a
//! later row for the same (plant, line, period) replaces an earlier one.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::{
  ledger::{Ledger, Scope},
  plant::{Line, Plant},
  record::{NewRecord, ProductionRecord, Quantity},
  store::LedgerStore,
};
use tokio::sync::Mutex;

use crate::{Error, Result, fs};

/// One log row. Column order is the header order.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
  recorded_at: DateTime<Utc>,
  plant:       String,
  line:        String,
  period:      String,
  quantity:    u64,
  remarks:     Option<String>,
  /// JSON-encoded [`tally_core::record::Attachment`], empty when absent.
  attachment:  Option<String>,
}

impl CsvRow {
  fn from_record(r: &ProductionRecord) -> Result<Self> {
    Ok(Self {
      recorded_at: r.recorded_at,
      plant:       r.plant.to_string(),
      line:        r.line.to_string(),
      period:      r.period.to_string(),
      quantity:    r.quantity.get(),
      remarks:     r.remarks.clone(),
      attachment:  r.attachment.as_ref().map(serde_json::to_string).transpose()?,
    })
  }

  fn into_record(self) -> Result<ProductionRecord> {
    Ok(ProductionRecord {
      plant:       Plant::new(&self.plant)?,
      line:        Line::new(&self.line)?,
      period:      self.period.parse()?,
      quantity:    Quantity::new(self.quantity),
      remarks:     self.remarks.filter(|r| !r.is_empty()),
      attachment:  self
        .attachment
        .filter(|a| !a.is_empty())
        .map(|a| serde_json::from_str(&a))
        .transpose()?,
      recorded_at: self.recorded_at,
    })
  }
}

/// A ledger persisted as an append-only CSV file.
pub struct CsvLogStore {
  path:  PathBuf,
  write: Mutex<()>,
}

impl CsvLogStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), write: Mutex::new(()) }
  }

  pub fn path(&self) -> &Path { &self.path }

  async fn replay(&self) -> Result<Ledger> {
    let Some(bytes) = fs::read_optional(&self.path).await? else {
      return Ok(Ledger::new());
    };

    let mut reader = csv::ReaderBuilder::new()
      .has_headers(true)
      .flexible(true)
      .from_reader(bytes.as_slice());

    let mut ledger = Ledger::new();
    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
      // +2: one for the header, one for 1-based numbering.
      let line_no = index + 2;
      match row.map_err(Error::from).and_then(CsvRow::into_record) {
        Ok(record) => {
          ledger.apply(record);
        }
        Err(error) => tracing::warn!(
          path = %self.path.display(),
          line_no,
          %error,
          "skipping malformed log row"
        ),
      }
    }
    Ok(ledger)
  }
}

fn encode_row(row: &CsvRow, with_header: bool) -> Result<Vec<u8>> {
  let mut writer = csv::WriterBuilder::new()
    .has_headers(with_header)
    .from_writer(Vec::new());
  writer.serialize(row)?;
  writer.into_inner().map_err(|e| Error::Csv(e.into_error().into()))
}

impl LedgerStore for CsvLogStore {
  type Error = Error;

  async fn upsert(&self, input: NewRecord) -> Result<ProductionRecord> {
    let _guard = self.write.lock().await;

    let record = input.into_record(Utc::now());
    let row = CsvRow::from_record(&record)?;
    fs::append(&self.path, |was_empty| encode_row(&row, was_empty)).await?;

    tracing::debug!(
      path = %self.path.display(),
      plant = %record.plant,
      line = %record.line,
      period = %record.period,
      quantity = %record.quantity,
      "appended log row"
    );
    Ok(record)
  }

  async fn list(&self, scope: Scope) -> Result<Vec<ProductionRecord>> {
    Ok(self.replay().await?.into_records(&scope))
  }
}
