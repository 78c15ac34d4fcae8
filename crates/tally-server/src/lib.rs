//! Server wiring for Tally.
//!
//! Holds the runtime configuration and mounts [`tally_api`] under `/api`.
//! The binary in `main.rs` picks the backends named by the configuration and
//! serves the result.

use std::path::{Path, PathBuf};

use axum::Router;
use serde::Deserialize;
use tally_api::AppState;
use tally_core::{
  plant::{Line, Plant, Roster},
  store::{ChecklistStore, LedgerStore},
};
use tally_sheets::SheetConfig;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn data_dir() -> PathBuf { PathBuf::from("~/.local/share/tally") }

fn default_attachment_dir() -> PathBuf { data_dir().join("attachments") }

/// Runtime server configuration, deserialised from `tally.toml` and
/// `TALLY_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  #[serde(default = "default_attachment_dir")]
  pub attachment_dir: PathBuf,
  #[serde(default)]
  pub backend:        BackendConfig,
  #[serde(default)]
  pub checklist:      ChecklistConfig,
  /// Plants and lines that submissions may target. Empty admits any.
  #[serde(default)]
  pub roster:         Vec<RosterEntry>,
}

/// Where production records are kept.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
  Json { path: PathBuf },
  Csv { path: PathBuf },
  Sqlite { path: PathBuf },
  Sheet(SheetConfig),
}

impl Default for BackendConfig {
  fn default() -> Self { Self::Json { path: data_dir().join("ledger.json") } }
}

impl BackendConfig {
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Json { .. } => "json",
      Self::Csv { .. } => "csv",
      Self::Sqlite { .. } => "sqlite",
      Self::Sheet(_) => "sheet",
    }
  }
}

/// Where the maintenance checklist is kept.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChecklistConfig {
  Json { path: PathBuf },
  Sqlite { path: PathBuf },
  Sheet(SheetConfig),
}

impl Default for ChecklistConfig {
  fn default() -> Self { Self::Json { path: data_dir().join("checklist.json") } }
}

impl ChecklistConfig {
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Json { .. } => "json",
      Self::Sqlite { .. } => "sqlite",
      Self::Sheet(_) => "sheet",
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
  pub plant: String,
  #[serde(default)]
  pub lines: Vec<String>,
}

/// `TALLY_` prefix; `__` separates nested keys.
fn environment() -> config::Environment {
  config::Environment::with_prefix("TALLY")
    .prefix_separator("_")
    .separator("__")
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under `TALLY_`-prefixed
  /// environment variables (`TALLY_PORT`, `TALLY_BACKEND__PATH`).
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    Self::load_with(path, environment())
  }

  fn load_with(path: &Path, env: config::Environment) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(env)
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Validate the configured roster. A plant entry without lines is kept,
  /// so it still closes the roster to unlisted plants.
  pub fn roster(&self) -> tally_core::Result<Roster> {
    let mut roster = Roster::new();
    for entry in &self.roster {
      let plant = Plant::new(&entry.plant)?;
      roster.insert_plant(plant.clone());
      for line in &entry.lines {
        roster.insert(plant.clone(), Line::new(line)?);
      }
    }
    Ok(roster)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the JSON API under `/api`, with request tracing.
pub fn router<S, C>(state: AppState<S, C>) -> Router
where
  S: LedgerStore + 'static,
  C: ChecklistStore + 'static,
{
  Router::new()
    .nest("/api", tally_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
