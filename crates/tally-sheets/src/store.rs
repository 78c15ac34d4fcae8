//! [`SheetStore`]: the production ledger as an append-only worksheet log.
//!
//! Row 1 holds [`HEADER`]. Every upsert appends one row; reads replay the
//! rows top to bottom, so a later row for the same (plant, line, period)
//! replaces an earlier one.

use chrono::{DateTime, Utc};
use tally_core::{
  ledger::{Ledger, Scope},
  plant::{Line, Plant},
  record::{NewRecord, ProductionRecord, Quantity},
  store::LedgerStore,
};

use crate::{Error, Result, client::SheetClient};

pub const HEADER: [&str; 7] =
  ["Timestamp", "Plant", "Line", "Period", "Quantity", "Remarks", "Attachment"];

fn encode_row(r: &ProductionRecord) -> Result<Vec<String>> {
  Ok(vec![
    r.recorded_at.to_rfc3339(),
    r.plant.to_string(),
    r.line.to_string(),
    r.period.to_string(),
    r.quantity.to_string(),
    r.remarks.clone().unwrap_or_default(),
    r.attachment
      .as_ref()
      .map(serde_json::to_string)
      .transpose()?
      .unwrap_or_default(),
  ])
}

fn decode_row(row: &[String]) -> Result<ProductionRecord> {
  let cell = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or_default();
  let recorded_at = DateTime::parse_from_rfc3339(cell(0))
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::MalformedRow(format!("timestamp {:?}: {e}", cell(0))))?;
  let quantity: i64 = cell(4)
    .parse()
    .map_err(|_| Error::MalformedRow(format!("quantity {:?}", cell(4))))?;
  let optional = |s: &str| (!s.is_empty()).then(|| s.to_owned());

  Ok(ProductionRecord {
    plant: Plant::new(cell(1))?,
    line: Line::new(cell(2))?,
    period: cell(3).parse()?,
    quantity: Quantity::try_from(quantity)?,
    remarks: optional(cell(5)),
    attachment: optional(cell(6))
      .map(|a| serde_json::from_str(&a))
      .transpose()?,
    recorded_at,
  })
}

fn is_header(row: &[String]) -> bool {
  row
    .first()
    .is_some_and(|c| c.trim().eq_ignore_ascii_case(HEADER[0]))
}

/// A ledger kept as rows appended to a worksheet.
pub struct SheetStore<C> {
  client: C,
}

impl<C: SheetClient> SheetStore<C> {
  pub fn new(client: C) -> Self { Self { client } }

  pub fn client(&self) -> &C { &self.client }

  async fn replay(&self) -> Result<Ledger> {
    let rows = self.client.get_all_values().await?;
    let mut ledger = Ledger::new();
    for (index, row) in rows.iter().enumerate() {
      if (index == 0 && is_header(row)) || row.iter().all(|c| c.trim().is_empty()) {
        continue;
      }
      match decode_row(row) {
        Ok(record) => {
          ledger.apply(record);
        }
        Err(error) => tracing::warn!(row = index + 1, %error, "skipping malformed sheet row"),
      }
    }
    Ok(ledger)
  }
}

impl<C: SheetClient> LedgerStore for SheetStore<C> {
  type Error = Error;

  async fn upsert(&self, input: NewRecord) -> Result<ProductionRecord> {
    let record = input.into_record(Utc::now());
    let row = encode_row(&record)?;

    if self.client.get_all_values().await?.is_empty() {
      self
        .client
        .append_row(HEADER.iter().map(|h| (*h).to_owned()).collect())
        .await?;
    }
    self.client.append_row(row).await?;

    tracing::debug!(
      plant = %record.plant,
      line = %record.line,
      period = %record.period,
      quantity = %record.quantity,
      "appended sheet row"
    );
    Ok(record)
  }

  async fn list(&self, scope: Scope) -> Result<Vec<ProductionRecord>> {
    Ok(self.replay().await?.into_records(&scope))
  }
}

#[cfg(test)]
mod tests {
  use tally_core::period::{Granularity, Period};

  use super::*;
  use crate::MemorySheet;

  fn entry(line: &str, period: &str, qty: u64) -> NewRecord {
    NewRecord::new(
      Plant::new("Plant A").unwrap(),
      Line::new(line).unwrap(),
      period.parse().unwrap(),
      Quantity::new(qty),
    )
  }

  fn period(s: &str) -> Period { s.parse().unwrap() }

  #[tokio::test]
  async fn header_is_written_once_and_later_rows_win() {
    let store = SheetStore::new(MemorySheet::new());
    store.upsert(entry("Line 1", "2024-03-05", 1200)).await.unwrap();
    store.upsert(entry("Line 1", "2024-03-05", 1500).with_remarks("recount")).await.unwrap();

    let rows = store.client().snapshot();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], HEADER.map(str::to_owned).to_vec());

    let records = store.list(Scope::All).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].quantity, Quantity::new(1500));
    assert_eq!(records[0].remarks.as_deref(), Some("recount"));
  }

  #[tokio::test]
  async fn daily_rows_roll_up_to_the_month() {
    let store = SheetStore::new(MemorySheet::new());
    for (day, qty) in [("2024-01-05", 100), ("2024-01-06", 200), ("2024-01-07", 300)] {
      store.upsert(entry("Line 1", day, qty)).await.unwrap();
    }
    store.upsert(entry("Line 2", "2024-01-05", 40)).await.unwrap();

    let scope = Scope::Line(Plant::new("Plant A").unwrap(), Line::new("Line 1").unwrap());
    let monthly = store.aggregate(scope, Granularity::Month).await.unwrap();
    assert_eq!(monthly.get(&period("2024-01")), Quantity::new(600));
    assert_eq!(monthly.get(&period("2024-02")), Quantity::ZERO);
  }

  #[tokio::test]
  async fn malformed_and_blank_rows_are_skipped() {
    let row = |cells: &[&str]| cells.iter().map(|c| (*c).to_owned()).collect::<Vec<_>>();
    let sheet = MemorySheet::with_rows(vec![
      HEADER.map(str::to_owned).to_vec(),
      row(&["2024-01-02T08:00:00Z", "Plant A", "Line 1", "2024-01-02", "100"]),
      row(&["yesterday", "Plant A", "Line 1", "2024-01-03", "5"]),
      row(&["2024-01-03T08:00:00Z", "Plant A", "Line 1", "2024-01-03", "lots"]),
      row(&["2024-01-03T08:00:00Z", "Plant A", "Line 1", "2024-01-03", "-7"]),
      row(&["", "", ""]),
      row(&["2024-01-04T08:00:00Z", "Plant A", "Line 1", "2024-01-04", "50", "ok"]),
    ]);
    let store = SheetStore::new(sheet);

    let records = store.list(Scope::All).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].remarks.as_deref(), Some("ok"));
    assert_eq!(records[1].attachment, None);
  }
}
