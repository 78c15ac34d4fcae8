//! [`HttpSheetClient`]: a [`SheetClient`] over the Google Sheets v4 REST API.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  Error, Result,
  a1::{cell_range, quote_sheet},
  client::SheetClient,
};

fn default_worksheet() -> String { "Sheet1".to_owned() }

fn default_base_url() -> String { "https://sheets.googleapis.com".to_owned() }

/// Which worksheet to talk to, and with what credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetConfig {
  pub spreadsheet_id: String,
  #[serde(default = "default_worksheet")]
  pub worksheet:      String,
  /// OAuth bearer token with the spreadsheets scope.
  pub access_token:   String,
  #[serde(default = "default_base_url")]
  pub base_url:       String,
}

/// Response body of `GET …/values/{range}`.
#[derive(Deserialize)]
struct ValueRange {
  #[serde(default)]
  values: Vec<Vec<Value>>,
}

fn cell_text(v: Value) -> String {
  match v {
    Value::String(s) => s,
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

/// Async HTTP client for one worksheet.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpSheetClient {
  client: Client,
  config: SheetConfig,
  base:   Url,
}

impl HttpSheetClient {
  pub fn new(config: SheetConfig) -> Result<Self> {
    let base = Url::parse(&config.base_url)
      .map_err(|e| Error::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;
    if base.cannot_be_a_base() {
      return Err(Error::InvalidBaseUrl(config.base_url));
    }
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config, base })
  }

  pub fn worksheet(&self) -> &str { &self.config.worksheet }

  /// `{base}/v4/spreadsheets/{id}/values/{range}`, each segment escaped.
  fn values_url(&self, range: &str) -> Result<Url> {
    let mut url = self.base.clone();
    url
      .path_segments_mut()
      .map_err(|()| Error::InvalidBaseUrl(self.config.base_url.clone()))?
      .pop_if_empty()
      .extend(["v4", "spreadsheets", self.config.spreadsheet_id.as_str(), "values", range]);
    Ok(url)
  }

  async fn send(&self, req: RequestBuilder) -> Result<Response> {
    let resp = req.bearer_auth(&self.config.access_token).send().await?;
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
      return Err(Error::Unauthorized(status));
    }
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Status { status, body });
    }
    Ok(resp)
  }
}

impl SheetClient for HttpSheetClient {
  async fn get_all_values(&self) -> Result<Vec<Vec<String>>> {
    let url = self.values_url(&quote_sheet(&self.config.worksheet))?;
    let resp = self.send(self.client.get(url)).await?;
    let range: ValueRange = resp.json().await?;
    Ok(
      range
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect(),
    )
  }

  async fn append_row(&self, row: Vec<String>) -> Result<()> {
    let segment = format!("{}:append", quote_sheet(&self.config.worksheet));
    let req = self
      .client
      .post(self.values_url(&segment)?)
      .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
      .json(&json!({ "values": [row] }));
    self.send(req).await?;
    Ok(())
  }

  async fn update_cell(&self, row: u32, column: u32, value: String) -> Result<()> {
    let range = cell_range(&self.config.worksheet, row, column);
    let req = self
      .client
      .put(self.values_url(&range)?)
      .query(&[("valueInputOption", "RAW")])
      .json(&json!({ "range": range, "values": [[value]] }));
    self.send(req).await?;
    Ok(())
  }
}
