//! [`JsonFileStore`]: the whole ledger as one nested JSON document.
//!
//! ```json
//! { "Plant A": { "Line 1": { "2024-03-05": { "quantity": 1500, "recorded_at": "…" } } } }
//! ```
//!
//! A bare number in place of the entry object (`"2024-03-05": 1500`) is also
//! accepted. Entries without a `recorded_at` get the Unix epoch.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::{
  ledger::{Ledger, Scope},
  plant::{Line, Plant},
  record::{Attachment, NewRecord, ProductionRecord, Quantity},
  store::LedgerStore,
};
use tokio::sync::Mutex;

use crate::{Result, fs};

// ─── On-disk shape ───────────────────────────────────────────────────────────

type Nested = BTreeMap<String, BTreeMap<String, BTreeMap<String, StoredEntry>>>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredEntry {
  Full {
    quantity:    u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remarks:     Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attachment:  Option<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recorded_at: Option<DateTime<Utc>>,
  },
  Bare(u64),
}

fn encode(ledger: &Ledger) -> Nested {
  let mut nested = Nested::new();
  for r in ledger.records(&Scope::All) {
    nested
      .entry(r.plant.to_string())
      .or_default()
      .entry(r.line.to_string())
      .or_default()
      .insert(r.period.to_string(), StoredEntry::Full {
        quantity:    r.quantity.get(),
        remarks:     r.remarks.clone(),
        attachment:  r.attachment.clone(),
        recorded_at: Some(r.recorded_at),
      });
  }
  nested
}

fn decode_entry(
  plant: &str,
  line: &str,
  period: &str,
  entry: StoredEntry,
) -> tally_core::Result<ProductionRecord> {
  let (quantity, remarks, attachment, recorded_at) = match entry {
    StoredEntry::Full { quantity, remarks, attachment, recorded_at } => {
      (quantity, remarks, attachment, recorded_at)
    }
    StoredEntry::Bare(quantity) => (quantity, None, None, None),
  };
  Ok(ProductionRecord {
    plant: Plant::new(plant)?,
    line: Line::new(line)?,
    period: period.parse()?,
    quantity: Quantity::new(quantity),
    remarks,
    attachment,
    recorded_at: recorded_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
  })
}

fn decode(path: &Path, nested: Nested) -> Ledger {
  let mut ledger = Ledger::new();
  for (plant, lines) in nested {
    for (line, periods) in lines {
      for (period, entry) in periods {
        match decode_entry(&plant, &line, &period, entry) {
          Ok(record) => {
            ledger.apply(record);
          }
          Err(error) => tracing::warn!(
            path = %path.display(),
            %plant,
            %line,
            %period,
            %error,
            "skipping invalid ledger entry"
          ),
        }
      }
    }
  }
  ledger
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A ledger persisted as a single JSON file, rewritten on every upsert.
pub struct JsonFileStore {
  path:  PathBuf,
  /// Serialises read-modify-write cycles within this process.
  write: Mutex<()>,
}

impl JsonFileStore {
  /// The file need not exist yet; it is created on the first upsert.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), write: Mutex::new(()) }
  }

  pub fn path(&self) -> &Path { &self.path }

  async fn load(&self) -> Result<Ledger> {
    let Some(bytes) = fs::read_optional(&self.path).await? else {
      return Ok(Ledger::new());
    };
    match serde_json::from_slice::<Nested>(&bytes) {
      Ok(nested) => Ok(decode(&self.path, nested)),
      Err(error) => {
        tracing::warn!(
          path = %self.path.display(),
          %error,
          "ledger file is malformed; treating it as empty"
        );
        Ok(Ledger::new())
      }
    }
  }
}

impl LedgerStore for JsonFileStore {
  type Error = crate::Error;

  async fn upsert(&self, input: NewRecord) -> Result<ProductionRecord> {
    let _guard = self.write.lock().await;

    let mut ledger = self.load().await?;
    let record = input.into_record(Utc::now());
    let replaced = ledger.apply(record.clone());

    let bytes = serde_json::to_vec_pretty(&encode(&ledger))?;
    fs::write_atomic(&self.path, &bytes).await?;

    tracing::debug!(
      path = %self.path.display(),
      plant = %record.plant,
      line = %record.line,
      period = %record.period,
      quantity = %record.quantity,
      replaced = replaced.is_some(),
      "rewrote ledger file"
    );
    Ok(record)
  }

  async fn list(&self, scope: Scope) -> Result<Vec<ProductionRecord>> {
    Ok(self.load().await?.into_records(&scope))
  }
}
