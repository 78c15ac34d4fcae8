//! tally-server binary.
//!
//! Reads `tally.toml` (or the path given with `--config`), opens the
//! configured ledger and checklist backends, and serves the JSON API over
//! HTTP.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tally_api::AppState;
use tally_core::store::{ChecklistStore, LedgerStore};
use tally_server::{BackendConfig, ChecklistConfig, ServerConfig, expand_tilde};
use tally_sheets::{HttpSheetClient, SheetChecklist, SheetStore};
use tally_store_file::{AttachmentDir, CsvLogStore, JsonChecklistStore, JsonFileStore};
use tally_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tally production ledger server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tally.toml")]
  config: PathBuf,

  /// Listen on this port instead of the configured one.
  #[arg(short, long)]
  port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to read config from {:?}", cli.config))?;
  if let Some(port) = cli.port {
    cfg.port = port;
  }

  let ledger = cfg.backend.clone();
  match ledger {
    BackendConfig::Json { path } => {
      with_ledger(cfg, JsonFileStore::new(expand_tilde(&path))).await
    }
    BackendConfig::Csv { path } => {
      with_ledger(cfg, CsvLogStore::new(expand_tilde(&path))).await
    }
    BackendConfig::Sqlite { path } => {
      let store = open_sqlite(&path).await?;
      with_ledger(cfg, store).await
    }
    BackendConfig::Sheet(sheet) => {
      let client = HttpSheetClient::new(sheet).context("failed to build sheet client")?;
      with_ledger(cfg, SheetStore::new(client)).await
    }
  }
}

/// Second half of backend selection: pick the checklist store.
async fn with_ledger<S>(cfg: ServerConfig, ledger: S) -> anyhow::Result<()>
where
  S: LedgerStore + 'static,
{
  match cfg.checklist.clone() {
    ChecklistConfig::Json { path } => {
      serve(cfg, ledger, JsonChecklistStore::new(expand_tilde(&path))).await
    }
    ChecklistConfig::Sqlite { path } => {
      let store = open_sqlite(&path).await?;
      serve(cfg, ledger, store).await
    }
    ChecklistConfig::Sheet(sheet) => {
      let client = HttpSheetClient::new(sheet).context("failed to build sheet client")?;
      serve(cfg, ledger, SheetChecklist::new(client)).await
    }
  }
}

async fn open_sqlite(path: &std::path::Path) -> anyhow::Result<SqliteStore> {
  let path = expand_tilde(path);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}

async fn serve<S, C>(cfg: ServerConfig, ledger: S, checklist: C) -> anyhow::Result<()>
where
  S: LedgerStore + 'static,
  C: ChecklistStore + 'static,
{
  let roster = cfg.roster().context("invalid roster in configuration")?;
  let attachments = AttachmentDir::new(expand_tilde(&cfg.attachment_dir));

  tracing::info!(
    backend = cfg.backend.kind(),
    checklist = cfg.checklist.kind(),
    plants = roster.plants().count(),
    attachments = %attachments.root().display(),
    "stores ready"
  );

  let app = tally_server::router(AppState::new(ledger, checklist, roster, attachments));
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
