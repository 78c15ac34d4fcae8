//! Router tests, driven through `tower::ServiceExt::oneshot`.

use std::io;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use serde_json::{Value, json};
use tally_core::{
  ledger::Scope,
  period::Period,
  plant::{Line, Plant, Roster},
  record::{NewRecord, ProductionRecord},
  store::LedgerStore,
};
use tally_store_file::{AttachmentDir, JsonChecklistStore, JsonFileStore};
use tally_store_sqlite::SqliteStore;
use tempfile::TempDir;
use tower::ServiceExt as _;

use crate::{AppState, api_router};

fn roster() -> Roster {
  let p = |s: &str| Plant::new(s).unwrap();
  let l = |s: &str| Line::new(s).unwrap();
  Roster::new()
    .with_line(p("Plant A"), l("Line 1"))
    .with_line(p("Plant A"), l("Line 2"))
    .with_line(p("Plant B"), l("Line 1"))
}

fn file_router(dir: &TempDir) -> Router {
  api_router(AppState::new(
    JsonFileStore::new(dir.path().join("ledger.json")),
    JsonChecklistStore::new(dir.path().join("checklist.json")),
    roster(),
    AttachmentDir::new(dir.path().join("attachments")),
  ))
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = router.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, value)
}

async fn submit(router: &Router, line: &str, period: &str, quantity: i64) -> (StatusCode, Value) {
  send(
    router,
    "POST",
    "/records",
    Some(json!({ "plant": "Plant A", "line": line, "period": period, "quantity": quantity })),
  )
  .await
}

// ─── Records ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn resubmission_replaces_the_quantity() {
  let dir = TempDir::new().unwrap();
  let router = file_router(&dir);

  let (status, created) = submit(&router, "Line 1", "2024-03-05", 1200).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["quantity"], 1200);
  assert!(created["recorded_at"].is_string());

  submit(&router, "Line 1", "2024-03-05", 1500).await;

  let (status, records) = send(&router, "GET", "/records?plant=Plant%20A&line=Line%201", None).await;
  assert_eq!(status, StatusCode::OK);
  let records = records.as_array().unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0]["quantity"], 1500);
  assert_eq!(records[0]["period"], "2024-03-05");
}

#[tokio::test]
async fn invalid_submissions_are_rejected_before_the_store() {
  let dir = TempDir::new().unwrap();
  let router = file_router(&dir);

  let cases = [
    json!({ "plant": "Plant A", "line": "Line 1", "period": "2024-03-05", "quantity": -1 }),
    json!({ "plant": "Plant A", "line": "Line 1", "period": "2024-02-30", "quantity": 5 }),
    json!({ "plant": "Plant A", "line": "Line 1", "period": "March", "quantity": 5 }),
    json!({ "plant": "Plant Z", "line": "Line 1", "period": "2024-03-05", "quantity": 5 }),
    json!({ "plant": "Plant B", "line": "Line 2", "period": "2024-03-05", "quantity": 5 }),
    json!({ "plant": "  ", "line": "Line 1", "period": "2024-03-05", "quantity": 5 }),
  ];
  for body in cases {
    let (status, err) = send(&router, "POST", "/records", Some(body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {body}");
    assert!(err["error"].is_string());
  }

  let (_, records) = send(&router, "GET", "/records", None).await;
  assert_eq!(records, json!([]));
  assert!(!dir.path().join("ledger.json").exists());
}

#[tokio::test]
async fn mistyped_bodies_are_bad_requests() {
  let dir = TempDir::new().unwrap();
  let router = file_router(&dir);

  let cases = [
    json!({ "plant": "Plant A", "line": "Line 1", "period": "2024-03-05", "quantity": 12.5 }),
    json!({ "plant": "Plant A", "line": "Line 1", "period": "2024-03-05", "quantity": "1200" }),
    json!({ "plant": "Plant A", "line": "Line 1", "period": "2024-03-05" }),
    json!([1, 2, 3]),
  ];
  for body in cases {
    let (status, err) = send(&router, "POST", "/records", Some(body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {body}");
    assert!(err["error"].is_string(), "no error message for {body}");
  }

  let (status, err) =
    send(&router, "POST", "/checklist", Some(json!({ "task": "clean air governor" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(err["error"].is_string());

  assert!(!dir.path().join("ledger.json").exists());
}

#[tokio::test]
async fn attachments_are_decoded_and_stored() {
  let dir = TempDir::new().unwrap();
  let router = file_router(&dir);

  let body = json!({
    "plant": "Plant A",
    "line": "Line 1",
    "period": "2024-03-05",
    "quantity": 10,
    "remarks": "gauge photo",
    "attachment": { "media_type": "image/png", "data": B64.encode(b"\x89PNG data") },
  });
  let (status, created) = send(&router, "POST", "/records", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["remarks"], "gauge photo");

  let path = created["attachment"]["path"].as_str().unwrap();
  assert_eq!(path, "Plant%20A/Line%201/2024-03-05.png");
  let on_disk = std::fs::read(dir.path().join("attachments").join(path)).unwrap();
  assert_eq!(on_disk, b"\x89PNG data");
}

#[tokio::test]
async fn bad_attachments_are_rejected() {
  let dir = TempDir::new().unwrap();
  let router = file_router(&dir);

  for attachment in [
    json!({ "media_type": "image/png", "data": "not base64!" }),
    json!({ "media_type": "application/pdf", "data": B64.encode(b"%PDF") }),
  ] {
    let body = json!({
      "plant": "Plant A", "line": "Line 1", "period": "2024-03-05", "quantity": 1,
      "attachment": attachment,
    });
    let (status, _) = send(&router, "POST", "/records", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}

#[tokio::test]
async fn line_filter_without_plant_is_a_bad_request() {
  let dir = TempDir::new().unwrap();
  let (status, _) = send(&file_router(&dir), "GET", "/records?line=Line%201", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Rollups ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn monthly_rollup_sums_daily_entries() {
  let dir = TempDir::new().unwrap();
  let router = file_router(&dir);
  for (day, qty) in [("2024-01-05", 100), ("2024-01-06", 200), ("2024-01-07", 300)] {
    submit(&router, "Line 1", day, qty).await;
  }
  submit(&router, "Line 2", "2024-02-01", 40).await;

  let (status, view) = send(
    &router,
    "GET",
    "/rollup?plant=Plant%20A&line=Line%201&granularity=month",
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(view["granularity"], "month");
  assert_eq!(view["total"], 600);
  assert_eq!(view["points"], json!([{ "period": "2024-01", "quantity": 600 }]));
}

#[tokio::test]
async fn ranged_rollup_is_zero_filled() {
  let dir = TempDir::new().unwrap();
  let router = file_router(&dir);
  submit(&router, "Line 1", "2024-01-05", 100).await;
  submit(&router, "Line 2", "2024-03-09", 50).await;

  let (status, view) = send(&router, "GET", "/rollup?from=2024-01&to=2024-04", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    view["points"],
    json!([
      { "period": "2024-01", "quantity": 100 },
      { "period": "2024-02", "quantity": 0 },
      { "period": "2024-03", "quantity": 50 },
      { "period": "2024-04", "quantity": 0 },
    ])
  );
  assert_eq!(view["total"], 150);
}

#[tokio::test]
async fn rollup_rejects_bad_parameters() {
  let dir = TempDir::new().unwrap();
  let router = file_router(&dir);
  for uri in [
    "/rollup?granularity=week",
    "/rollup?from=2024-01",
    "/rollup?from=2024-05&to=2024-01",
    "/rollup/lines",
  ] {
    let (status, _) = send(&router, "GET", uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
  }
}

#[tokio::test]
async fn line_totals_include_idle_roster_lines() {
  let dir = TempDir::new().unwrap();
  let router = file_router(&dir);
  submit(&router, "Line 1", "2024-01-05", 100).await;
  submit(&router, "Line 1", "2024-02-05", 999).await;

  let (status, totals) =
    send(&router, "GET", "/rollup/lines?period=2024-01&plant=Plant%20A", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    totals,
    json!([
      { "plant": "Plant A", "line": "Line 1", "quantity": 100 },
      { "plant": "Plant A", "line": "Line 2", "quantity": 0 },
    ])
  );
}

#[tokio::test]
async fn roster_is_published() {
  let dir = TempDir::new().unwrap();
  let (status, roster) = send(&file_router(&dir), "GET", "/roster", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(roster["Plant A"], json!(["Line 1", "Line 2"]));
}

// ─── Checklist ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn checklist_sign_off_shows_in_the_grid() {
  let dir = TempDir::new().unwrap();
  let router = file_router(&dir);

  let (status, cell) = send(
    &router,
    "POST",
    "/checklist",
    Some(json!({
      "task": "clean air governor",
      "month": "sept",
      "operator": "Ana",
      "engineer": "Ben",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(cell["task"], "CLEAN AIR GOVERNOR");
  assert_eq!(cell["month"], "SEPT");

  let (_, rows) = send(&router, "GET", "/checklist", None).await;
  let rows = rows.as_array().unwrap();
  assert_eq!(rows.len(), 4);
  assert_eq!(rows[1]["cells"]["SEPT"], json!({ "operator": "Ana", "engineer": "Ben" }));
  assert_eq!(rows[1]["cells"]["JAN"], Value::Null);
}

#[tokio::test]
async fn checklist_rejects_unknown_tasks_and_missing_signatures() {
  let dir = TempDir::new().unwrap();
  let router = file_router(&dir);
  for body in [
    json!({ "task": "paint the walls", "month": "JAN", "operator": "a", "engineer": "b" }),
    json!({ "task": "clean air governor", "month": "13", "operator": "a", "engineer": "b" }),
    json!({ "task": "clean air governor", "month": "JAN", "operator": "a", "engineer": " " }),
    json!({ "task": "clean air governor", "month": "JAN", "operator": "a|b", "engineer": "c" }),
  ] {
    let (status, _) = send(&router, "POST", "/checklist", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}

// ─── Backends ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn works_over_sqlite() {
  let dir = TempDir::new().unwrap();
  let router = api_router(AppState::new(
    SqliteStore::open_in_memory().await.unwrap(),
    SqliteStore::open_in_memory().await.unwrap(),
    Roster::new(),
    AttachmentDir::new(dir.path()),
  ));

  let body = json!({ "plant": "Anywhere", "line": "L9", "period": "2024", "quantity": 7 });
  let (status, _) = send(&router, "POST", "/records", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED);

  let (_, view) = send(&router, "GET", "/rollup?granularity=year", None).await;
  assert_eq!(view["points"], json!([{ "period": "2024", "quantity": 7 }]));
}

/// A ledger whose backing store is unreachable.
struct Unreachable;

impl LedgerStore for Unreachable {
  type Error = io::Error;

  async fn upsert(&self, _input: NewRecord) -> Result<ProductionRecord, io::Error> {
    Err(io::Error::new(io::ErrorKind::ConnectionRefused, "sheet unreachable"))
  }

  async fn list(&self, _scope: Scope) -> Result<Vec<ProductionRecord>, io::Error> {
    Err(io::Error::new(io::ErrorKind::ConnectionRefused, "sheet unreachable"))
  }
}

#[tokio::test]
async fn store_failures_are_bad_gateway() {
  let dir = TempDir::new().unwrap();
  let router = api_router(AppState::new(
    Unreachable,
    JsonChecklistStore::new(dir.path().join("checklist.json")),
    Roster::new(),
    AttachmentDir::new(dir.path()),
  ));

  let (status, err) = submit(&router, "Line 1", "2024-01-01", 1).await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert!(err["error"].as_str().unwrap().contains("unreachable"));

  let (status, _) = send(&router, "GET", "/rollup", None).await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn failed_upsert_keeps_the_stored_attachment() {
  let dir = TempDir::new().unwrap();
  let attachments = AttachmentDir::new(dir.path());
  let original = attachments
    .save(
      &Plant::new("Plant A").unwrap(),
      &Line::new("Line 1").unwrap(),
      &"2024-03-05".parse::<Period>().unwrap(),
      "image/png",
      b"old image",
    )
    .await
    .unwrap();
  let on_disk = attachments.resolve(&original);

  let router = api_router(AppState::new(
    Unreachable,
    JsonChecklistStore::new(dir.path().join("checklist.json")),
    Roster::new(),
    attachments,
  ));
  let body = json!({
    "plant": "Plant A", "line": "Line 1", "period": "2024-03-05", "quantity": 1,
    "attachment": { "media_type": "image/png", "data": B64.encode(b"new image") },
  });
  let (status, _) = send(&router, "POST", "/records", Some(body)).await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);

  assert_eq!(std::fs::read(&on_disk).unwrap(), b"old image");
  assert_eq!(std::fs::read_dir(on_disk.parent().unwrap()).unwrap().count(), 1);
}
