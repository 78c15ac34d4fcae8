//! Async HTTP client wrapping the Tally JSON API.

use std::{path::Path, time::Duration};

use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tally_api::{
  checklist::SignedCell,
  rollup::{LineTotal, RollupView},
};
use tally_core::{
  checklist::ChecklistRow,
  period::{Granularity, Period},
  plant::Roster,
  record::ProductionRecord,
};

/// Connection settings for the Tally API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Optional plant / line filter, sent as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
  pub plant: Option<String>,
  pub line:  Option<String>,
}

impl Filter {
  fn query(&self) -> Vec<(&'static str, String)> {
    let mut q = Vec::new();
    if let Some(p) = &self.plant {
      q.push(("plant", p.clone()));
    }
    if let Some(l) = &self.line {
      q.push(("line", l.clone()));
    }
    q
  }
}

/// A production figure to submit.
#[derive(Debug, Clone)]
pub struct Submission {
  pub plant:    String,
  pub line:     String,
  pub period:   String,
  pub quantity: i64,
  pub remarks:  Option<String>,
}

/// Async HTTP client for the Tally JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

/// Turn a non-2xx response into an error carrying the server's message.
async fn check(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let message = resp
    .json::<Value>()
    .await
    .ok()
    .and_then(|v| v["error"].as_str().map(str::to_owned))
    .unwrap_or_default();
  Err(anyhow!("{what} → {status} {message}"))
}

async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
  check(resp, what)
    .await?
    .json()
    .await
    .with_context(|| format!("deserialising {what} response"))
}

/// Media type for an attachment, from its file extension.
pub fn media_type_for(path: &Path) -> Option<&'static str> {
  let ext = path.extension()?.to_str()?.to_ascii_lowercase();
  match ext.as_str() {
    "png" => Some("image/png"),
    "jpg" | "jpeg" => Some("image/jpeg"),
    "gif" => Some("image/gif"),
    "webp" => Some("image/webp"),
    _ => None,
  }
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str { &self.config.base_url }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  // ── Records ───────────────────────────────────────────────────────────────

  /// `GET /api/records`
  pub async fn list_records(&self, filter: &Filter) -> Result<Vec<ProductionRecord>> {
    let resp = self
      .client
      .get(self.url("/records"))
      .query(&filter.query())
      .send()
      .await
      .context("GET /records failed")?;
    decode(resp, "GET /records").await
  }

  /// `POST /api/records`, optionally with an image read from `attachment`.
  pub async fn submit(
    &self,
    submission: &Submission,
    attachment: Option<&Path>,
  ) -> Result<ProductionRecord> {
    let mut body = json!({
      "plant": submission.plant,
      "line": submission.line,
      "period": submission.period,
      "quantity": submission.quantity,
      "remarks": submission.remarks,
    });
    if let Some(path) = attachment {
      let media_type = media_type_for(path)
        .ok_or_else(|| anyhow!("{} is not a png, jpeg, gif or webp image", path.display()))?;
      let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
      body["attachment"] = json!({ "media_type": media_type, "data": STANDARD.encode(bytes) });
    }

    let resp = self
      .client
      .post(self.url("/records"))
      .json(&body)
      .send()
      .await
      .context("POST /records failed")?;
    decode(resp, "POST /records").await
  }

  // ── Rollups ───────────────────────────────────────────────────────────────

  /// `GET /api/rollup`, zero-filled between `range` bounds when given.
  pub async fn rollup(
    &self,
    filter: &Filter,
    granularity: Granularity,
    range: Option<(Period, Period)>,
  ) -> Result<RollupView> {
    let mut query = filter.query();
    query.push(("granularity", granularity.to_string()));
    if let Some((from, to)) = range {
      query.push(("from", from.to_string()));
      query.push(("to", to.to_string()));
    }
    let resp = self
      .client
      .get(self.url("/rollup"))
      .query(&query)
      .send()
      .await
      .context("GET /rollup failed")?;
    decode(resp, "GET /rollup").await
  }

  /// `GET /api/rollup/lines`
  pub async fn line_totals(&self, plant: Option<&str>, period: Period) -> Result<Vec<LineTotal>> {
    let mut query = vec![("period", period.to_string())];
    if let Some(p) = plant {
      query.push(("plant", p.to_owned()));
    }
    let resp = self
      .client
      .get(self.url("/rollup/lines"))
      .query(&query)
      .send()
      .await
      .context("GET /rollup/lines failed")?;
    decode(resp, "GET /rollup/lines").await
  }

  /// `GET /api/roster`
  pub async fn roster(&self) -> Result<Roster> {
    let resp = self
      .client
      .get(self.url("/roster"))
      .send()
      .await
      .context("GET /roster failed")?;
    decode(resp, "GET /roster").await
  }

  // ── Checklist ─────────────────────────────────────────────────────────────

  /// `GET /api/checklist`
  pub async fn checklist(&self) -> Result<Vec<ChecklistRow>> {
    let resp = self
      .client
      .get(self.url("/checklist"))
      .send()
      .await
      .context("GET /checklist failed")?;
    decode(resp, "GET /checklist").await
  }

  /// `POST /api/checklist`
  pub async fn sign(
    &self,
    task: &str,
    month: &str,
    operator: &str,
    engineer: &str,
  ) -> Result<SignedCell> {
    let resp = self
      .client
      .post(self.url("/checklist"))
      .json(&json!({
        "task": task,
        "month": month,
        "operator": operator,
        "engineer": engineer,
      }))
      .send()
      .await
      .context("POST /checklist failed")?;
    decode(resp, "POST /checklist").await
  }
}
