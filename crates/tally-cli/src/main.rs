//! `tally`: terminal dashboard and command-line client for the Tally
//! production ledger.
//!
//! # Usage
//!
//! ```text
//! tally                                   # dashboard
//! tally submit "Plant A" "Line 1" 2024-03-05 1500 --remarks "recount"
//! tally rollup --plant "Plant A" --granularity month --from 2024-01 --to 2024-12
//! tally sign "clean air governor" sept --operator Ana --engineer Ben
//! tally --config ~/.config/tally/config.toml --url http://plant-server:8080
//! ```

mod app;
mod client;
mod ui;

use std::{io, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, Filter, Submission};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tally_core::period::{Granularity, Period};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tally", about = "Dashboard and client for the Tally production ledger")]
struct Args {
  /// Path to a TOML config file (url, refresh_secs).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the tally server (default: http://localhost:8080).
  #[arg(long, env = "TALLY_URL")]
  url: Option<String>,

  /// Dashboard refresh interval in seconds (default: 60).
  #[arg(long)]
  refresh_secs: Option<u64>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Record a production quantity, replacing any earlier figure.
  Submit {
    plant:      String,
    line:       String,
    /// YYYY-MM-DD, YYYY-MM or YYYY.
    period:     String,
    #[arg(allow_negative_numbers = true)]
    quantity:   i64,
    #[arg(long)]
    remarks:    Option<String>,
    /// Image to attach (png, jpeg, gif or webp).
    #[arg(long, value_name = "FILE")]
    attachment: Option<PathBuf>,
  },
  /// Print stored records.
  List {
    #[arg(long)]
    plant: Option<String>,
    #[arg(long)]
    line:  Option<String>,
  },
  /// Print totals per period.
  Rollup {
    #[arg(long)]
    plant:       Option<String>,
    #[arg(long)]
    line:        Option<String>,
    #[arg(long, default_value = "month")]
    granularity: Granularity,
    /// Zero-fill from this period (requires --to).
    #[arg(long, requires = "to")]
    from:        Option<Period>,
    #[arg(long, requires = "from")]
    to:          Option<Period>,
  },
  /// Print per-line totals for one period.
  Lines {
    period: Period,
    #[arg(long)]
    plant:  Option<String>,
  },
  /// Sign one cell of the maintenance checklist.
  Sign {
    task:     String,
    /// JAN … DEC or 1 … 12.
    month:    String,
    #[arg(long)]
    operator: String,
    #[arg(long)]
    engineer: String,
  },
  /// Print the maintenance checklist.
  Checklist,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:          String,
  refresh_secs: Option<u64>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
  };
  let refresh = Duration::from_secs(
    args
      .refresh_secs
      .or(file_cfg.refresh_secs)
      .unwrap_or(60)
      .max(1),
  );

  let client = ApiClient::new(api_config)?;

  match args.command {
    None => dashboard(client, refresh).await,
    Some(command) => {
      // The dashboard owns the terminal; only one-shot commands log.
      tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
          EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .from_env_lossy(),
        )
        .init();
      run_command(&client, command).await
    }
  }
}

// ─── One-shot commands ────────────────────────────────────────────────────────

async fn run_command(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Submit { plant, line, period, quantity, remarks, attachment } => {
      let submission = Submission { plant, line, period, quantity, remarks };
      let record = client.submit(&submission, attachment.as_deref()).await?;
      println!(
        "recorded {} for {} / {} at {}",
        record.quantity, record.plant, record.line, record.period
      );
    }

    Command::List { plant, line } => {
      let records = client.list_records(&Filter { plant, line }).await?;
      for r in &records {
        println!(
          "{:<10}  {:<16}  {:<16}  {:>10}  {}",
          r.period.to_string(),
          r.plant.as_str(),
          r.line.as_str(),
          r.quantity.to_string(),
          r.remarks.as_deref().unwrap_or_default()
        );
      }
    }

    Command::Rollup { plant, line, granularity, from, to } => {
      let range = from.zip(to);
      let view = client.rollup(&Filter { plant, line }, granularity, range).await?;
      for p in &view.points {
        println!("{:<10}  {:>10}", p.period.to_string(), p.quantity.to_string());
      }
      println!("{:<10}  {:>10}", "total", view.total.to_string());
    }

    Command::Lines { period, plant } => {
      for t in client.line_totals(plant.as_deref(), period).await? {
        println!(
          "{:<16}  {:<16}  {:>10}",
          t.plant.as_str(),
          t.line.as_str(),
          t.quantity.to_string()
        );
      }
    }

    Command::Sign { task, month, operator, engineer } => {
      let cell = client.sign(&task, &month, &operator, &engineer).await?;
      println!("{} / {}: {}", cell.task, cell.month, cell.sign_off);
    }

    Command::Checklist => {
      for row in client.checklist().await? {
        println!("{}", row.task);
        for (month, cell) in &row.cells {
          if let Some(sign_off) = cell {
            println!("  {:<5} {sign_off}", month.label());
          }
        }
      }
    }
  }
  Ok(())
}

// ─── Dashboard ────────────────────────────────────────────────────────────────

async fn dashboard(client: ApiClient, refresh: Duration) -> Result<()> {
  let mut app = App::new(client, refresh);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app).await;

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    if app.refresh_due(std::time::Instant::now()) {
      app.refresh().await;
    }

    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(200))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key).await
    {
      break;
    }
  }

  Ok(())
}
