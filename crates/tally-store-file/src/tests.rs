//! Tests for the flat-file stores against temporary directories.

use tally_core::{
  checklist::{ChecklistTask, Month, SignOff},
  ledger::Scope,
  period::{Granularity, Period},
  plant::{Line, Plant},
  record::{NewRecord, Quantity},
  store::{ChecklistStore, LedgerStore},
};
use tempfile::TempDir;

use crate::{AttachmentDir, CsvLogStore, Error, JsonChecklistStore, JsonFileStore};

fn entry(plant: &str, line: &str, period: &str, qty: u64) -> NewRecord {
  NewRecord::new(
    Plant::new(plant).unwrap(),
    Line::new(line).unwrap(),
    period.parse().unwrap(),
    Quantity::new(qty),
  )
}

fn period(s: &str) -> Period { s.parse().unwrap() }

fn line_scope() -> Scope {
  Scope::Line(Plant::new("Plant A").unwrap(), Line::new("Line 1").unwrap())
}

// ─── JSON ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn json_missing_file_is_an_empty_store() {
  let dir = TempDir::new().unwrap();
  let store = JsonFileStore::new(dir.path().join("ledger.json"));
  assert!(store.list(Scope::All).await.unwrap().is_empty());
  let rollup = store.aggregate(Scope::All, Granularity::Month).await.unwrap();
  assert_eq!(rollup.get(&period("2024-01")), Quantity::ZERO);
}

#[tokio::test]
async fn json_upsert_replaces_and_persists() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("nested/dir/ledger.json");
  let store = JsonFileStore::new(&path);

  store.upsert(entry("Plant A", "Line 1", "2024-03-05", 1200)).await.unwrap();
  store.upsert(entry("Plant A", "Line 1", "2024-03-05", 1500)).await.unwrap();
  store.upsert(entry("Plant A", "Line 2", "2024-03-05", 10)).await.unwrap();

  // A fresh handle reads what the first one wrote.
  let reopened = JsonFileStore::new(&path);
  let records = reopened.list(line_scope()).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].quantity, Quantity::new(1500));

  let raw: serde_json::Value =
    serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
  assert_eq!(raw["Plant A"]["Line 1"]["2024-03-05"]["quantity"], 1500);
  assert!(!dir.path().join("nested/dir/ledger.json.tmp").exists());
}

#[tokio::test]
async fn json_malformed_file_reads_as_empty_and_is_replaced_on_write() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("ledger.json");
  std::fs::write(&path, b"{ not json").unwrap();

  let store = JsonFileStore::new(&path);
  assert!(store.list(Scope::All).await.unwrap().is_empty());

  store.upsert(entry("Plant A", "Line 1", "2024-01-01", 7)).await.unwrap();
  assert_eq!(store.list(Scope::All).await.unwrap().len(), 1);
}

#[tokio::test]
async fn json_accepts_bare_numbers_and_skips_bad_keys() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("ledger.json");
  std::fs::write(
    &path,
    br#"{"Plant A": {"Line 1": {"2024-01-02": 100, "2024-01-03": {"quantity": 200}, "2024-02-30": 5}}}"#,
  )
  .unwrap();

  let store = JsonFileStore::new(&path);
  let monthly = store.aggregate(line_scope(), Granularity::Month).await.unwrap();
  assert_eq!(monthly.get(&period("2024-01")), Quantity::new(300));
  assert_eq!(store.list(Scope::All).await.unwrap().len(), 2);
}

#[tokio::test]
async fn json_daily_entries_roll_up() {
  let dir = TempDir::new().unwrap();
  let store = JsonFileStore::new(dir.path().join("ledger.json"));
  for (day, qty) in [("2024-01-05", 100), ("2024-01-06", 200), ("2024-01-07", 300)] {
    store.upsert(entry("Plant A", "Line 1", day, qty)).await.unwrap();
  }

  let monthly = store.aggregate(line_scope(), Granularity::Month).await.unwrap();
  let daily = store.aggregate(line_scope(), Granularity::Day).await.unwrap();
  let jan = period("2024-01");
  assert_eq!(monthly.get(&jan), Quantity::new(600));
  let by_day: Quantity = jan.days().map(|d| daily.get(&d)).sum();
  assert_eq!(by_day, Quantity::new(600));
}

// ─── CSV ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn csv_appends_and_replays_last_write_wins() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("ledger.csv");
  let store = CsvLogStore::new(&path);

  store
    .upsert(entry("Plant A", "Line 1", "2024-03-05", 1200).with_remarks("first, with comma"))
    .await
    .unwrap();
  store.upsert(entry("Plant A", "Line 1", "2024-03-05", 1500)).await.unwrap();

  let text = std::fs::read_to_string(&path).unwrap();
  let mut lines = text.lines();
  assert_eq!(
    lines.next(),
    Some("recorded_at,plant,line,period,quantity,remarks,attachment")
  );
  // The log keeps both submissions; only the header appears once.
  assert_eq!(lines.count(), 2);

  let records = store.list(Scope::All).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].quantity, Quantity::new(1500));
  assert_eq!(records[0].remarks, None);
}

#[tokio::test]
async fn csv_skips_malformed_rows() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("ledger.csv");
  std::fs::write(
    &path,
    "recorded_at,plant,line,period,quantity,remarks,attachment\n\
     2024-01-02T08:00:00Z,Plant A,Line 1,2024-01-02,100,,\n\
     garbage\n\
     2024-01-03T08:00:00Z,Plant A,Line 1,2024-01-03,-5,,\n\
     2024-01-04T08:00:00Z,Plant A,Line 1,2024-13-01,5,,\n\
     2024-01-05T08:00:00Z,Plant A,Line 1,2024-01-05,200,ok,\n",
  )
  .unwrap();

  let store = CsvLogStore::new(&path);
  let records = store.list(Scope::All).await.unwrap();
  assert_eq!(records.len(), 2);
  assert_eq!(records[1].remarks.as_deref(), Some("ok"));

  let yearly = store.aggregate(Scope::All, Granularity::Year).await.unwrap();
  assert_eq!(yearly.get(&period("2024")), Quantity::new(300));
}

#[tokio::test]
async fn csv_append_after_a_torn_row_starts_a_new_line() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("ledger.csv");
  std::fs::write(
    &path,
    "recorded_at,plant,line,period,quantity,remarks,attachment\n\
     2024-01-02T08:00:00Z,Plant A,Line 1,2024-01-02,100,,\n\
     2024-01-03T08:00:00Z,Plant A,Li",
  )
  .unwrap();

  let store = CsvLogStore::new(&path);
  store.upsert(entry("Plant A", "Line 1", "2024-01-04", 40)).await.unwrap();

  let records = store.list(line_scope()).await.unwrap();
  let periods: Vec<String> = records.iter().map(|r| r.period.to_string()).collect();
  assert_eq!(periods, vec!["2024-01-02", "2024-01-04"]);
  assert_eq!(records[1].quantity, Quantity::new(40));
  assert!(std::fs::read_to_string(&path).unwrap().ends_with('\n'));
}

#[tokio::test]
async fn csv_attachment_reference_round_trips() {
  let dir = TempDir::new().unwrap();
  let store = CsvLogStore::new(dir.path().join("ledger.csv"));
  let attachments = AttachmentDir::new(dir.path().join("img"));

  let mut input = entry("Plant A", "Line 1", "2024-03-05", 5);
  input.attachment = Some(
    attachments
      .save(&input.plant, &input.line, &input.period, "image/png", b"\x89PNG")
      .await
      .unwrap(),
  );
  store.upsert(input.clone()).await.unwrap();

  let records = store.list(Scope::All).await.unwrap();
  assert_eq!(records[0].attachment, input.attachment);
}

// ─── Attachments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn attachments_are_stored_under_escaped_paths() {
  let dir = TempDir::new().unwrap();
  let attachments = AttachmentDir::new(dir.path());
  let stored = attachments
    .save(
      &Plant::new("../Plant A").unwrap(),
      &Line::new("Line/1").unwrap(),
      &period("2024-03-05"),
      "image/JPEG",
      b"jpeg bytes",
    )
    .await
    .unwrap();

  assert_eq!(stored.path, "%2E%2E%2FPlant%20A/Line%2F1/2024-03-05.jpg");
  assert_eq!(stored.media_type, "image/jpeg");
  assert_eq!(stored.content_hash.len(), 64);
  let on_disk = std::fs::read(attachments.resolve(&stored)).unwrap();
  assert_eq!(on_disk, b"jpeg bytes");
}

#[tokio::test]
async fn similar_names_keep_separate_attachments() {
  let dir = TempDir::new().unwrap();
  let attachments = AttachmentDir::new(dir.path());
  let line = Line::new("Line 1").unwrap();
  let day = period("2024-03-05");

  let mut stored = Vec::new();
  for (plant, bytes) in [("Plant A", b"AAAA"), ("Plant_A", b"BBBB"), ("工厂一", b"CCCC"), ("工厂二", b"DDDD")] {
    let plant = Plant::new(plant).unwrap();
    stored.push(attachments.save(&plant, &line, &day, "image/png", bytes).await.unwrap());
  }

  let paths: std::collections::BTreeSet<_> = stored.iter().map(|a| a.path.clone()).collect();
  assert_eq!(paths.len(), 4);
  assert_eq!(std::fs::read(attachments.resolve(&stored[0])).unwrap(), b"AAAA");
  assert_eq!(std::fs::read(attachments.resolve(&stored[2])).unwrap(), b"CCCC");
}

#[tokio::test]
async fn staged_attachments_replace_the_file_only_on_commit() {
  let dir = TempDir::new().unwrap();
  let attachments = AttachmentDir::new(dir.path());
  let plant = Plant::new("Plant A").unwrap();
  let line = Line::new("Line 1").unwrap();
  let day = period("2024-03-05");

  let original = attachments.save(&plant, &line, &day, "image/png", b"old").await.unwrap();
  let target = attachments.resolve(&original);

  let staged = attachments.stage(&plant, &line, &day, "image/png", b"new").await.unwrap();
  assert_eq!(staged.attachment().path, original.path);
  assert_eq!(std::fs::read(&target).unwrap(), b"old");
  attachments.discard(staged).await;
  assert_eq!(std::fs::read(&target).unwrap(), b"old");
  // Only the committed image remains in the line's directory.
  assert_eq!(std::fs::read_dir(target.parent().unwrap()).unwrap().count(), 1);

  let staged = attachments.stage(&plant, &line, &day, "image/png", b"new").await.unwrap();
  let committed = attachments.commit(staged).await.unwrap();
  assert_eq!(std::fs::read(&target).unwrap(), b"new");
  assert_ne!(committed.content_hash, original.content_hash);
  assert_eq!(std::fs::read_dir(target.parent().unwrap()).unwrap().count(), 1);
}

#[tokio::test]
async fn attachments_reject_unknown_types() {
  let dir = TempDir::new().unwrap();
  let attachments = AttachmentDir::new(dir.path());
  let result = attachments
    .save(
      &Plant::new("Plant A").unwrap(),
      &Line::new("Line 1").unwrap(),
      &period("2024-03-05"),
      "application/pdf",
      b"%PDF",
    )
    .await;
  assert!(matches!(result, Err(Error::UnsupportedMediaType(_))));
}

// ─── Checklist ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn checklist_file_persists_sign_offs() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("checklist.json");
  let store = JsonChecklistStore::new(&path);

  store
    .sign_off(ChecklistTask::CheckBoltsAndNuts, Month::July, SignOff::new("op", "eng").unwrap())
    .await
    .unwrap();

  let grid = JsonChecklistStore::new(&path).grid().await.unwrap();
  assert_eq!(
    grid.get(ChecklistTask::CheckBoltsAndNuts, Month::July).map(ToString::to_string),
    Some("op | eng".to_owned())
  );
}

#[tokio::test]
async fn checklist_malformed_file_reads_as_empty() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("checklist.json");
  std::fs::write(&path, b"[1, 2").unwrap();
  let grid = JsonChecklistStore::new(&path).grid().await.unwrap();
  assert_eq!(grid.signed_count(), 0);
}
