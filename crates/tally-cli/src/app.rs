//! Dashboard state and key handling.

use std::time::{Duration, Instant};

use chrono::{Datelike, Months, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tally_api::rollup::{LineTotal, RollupView};
use tally_core::{
  checklist::ChecklistRow,
  period::{Granularity, Period},
  plant::Roster,
  record::ProductionRecord,
};

use crate::client::{ApiClient, Filter};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// Records table, period chart and per-line totals.
  Production,
  /// Maintenance checklist grid.
  Checklist,
}

/// The periods the chart covers at `granularity`, ending at the one holding
/// `today`: 31 days, 12 months or 5 years.
pub fn chart_window(today: NaiveDate, granularity: Granularity) -> (Period, Period) {
  let first = match granularity {
    Granularity::Day => today - chrono::Days::new(30),
    Granularity::Month => today
      .with_day(1)
      .and_then(|d| d.checked_sub_months(Months::new(11)))
      .unwrap_or(today),
    Granularity::Year => NaiveDate::from_ymd_opt(today.year() - 4, 1, 1).unwrap_or(today),
  };
  (
    Period::containing(first, granularity),
    Period::containing(today, granularity),
  )
}

fn next_granularity(g: Granularity) -> Granularity {
  match g {
    Granularity::Day => Granularity::Month,
    Granularity::Month => Granularity::Year,
    Granularity::Year => Granularity::Day,
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

pub struct App {
  pub screen:      Screen,
  pub granularity: Granularity,
  /// Plant the dashboard is narrowed to; `None` shows every plant.
  pub plant:       Option<String>,

  pub roster:      Roster,
  pub records:     Vec<ProductionRecord>,
  pub rollup:      Option<RollupView>,
  pub line_totals: Vec<LineTotal>,
  pub checklist:   Vec<ChecklistRow>,

  /// Offset of the first visible row in the records table.
  pub scroll:      usize,
  pub status_msg:  String,

  refresh_every:   Duration,
  last_refresh:    Option<Instant>,
  client:          ApiClient,
}

impl App {
  pub fn new(client: ApiClient, refresh_every: Duration) -> Self {
    Self {
      screen: Screen::Production,
      granularity: Granularity::Month,
      plant: None,
      roster: Roster::new(),
      records: Vec::new(),
      rollup: None,
      line_totals: Vec::new(),
      checklist: Vec::new(),
      scroll: 0,
      status_msg: String::new(),
      refresh_every,
      last_refresh: None,
      client,
    }
  }

  pub fn base_url(&self) -> &str { self.client.base_url() }

  fn filter(&self) -> Filter {
    Filter { plant: self.plant.clone(), line: None }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  pub fn refresh_due(&self, now: Instant) -> bool {
    self
      .last_refresh
      .is_none_or(|at| now.duration_since(at) >= self.refresh_every)
  }

  /// Reload everything shown. A failure is reported in the status bar and
  /// the previous data stays on screen.
  pub async fn refresh(&mut self) {
    self.last_refresh = Some(Instant::now());
    match self.load().await {
      Ok(()) => {
        self.status_msg = format!(
          "Updated {}",
          chrono::Local::now().format("%H:%M:%S")
        );
      }
      Err(e) => {
        tracing::warn!(error = %e, "dashboard refresh failed");
        self.status_msg = format!("Error: {e:#}");
      }
    }
  }

  async fn load(&mut self) -> anyhow::Result<()> {
    let today = chrono::Local::now().date_naive();
    let filter = self.filter();
    let window = chart_window(today, self.granularity);
    let this_month = Period::containing(today, Granularity::Month);

    let (roster, records, rollup, lines, checklist) = tokio::try_join!(
      self.client.roster(),
      self.client.list_records(&filter),
      self.client.rollup(&filter, self.granularity, Some(window)),
      self.client.line_totals(self.plant.as_deref(), this_month),
      self.client.checklist(),
    )?;

    self.roster = roster;
    // Newest first in the table.
    self.records = records;
    self.records.sort_by(|a, b| b.period.cmp(&a.period));
    self.scroll = self.scroll.min(self.records.len().saturating_sub(1));
    self.rollup = Some(rollup);
    self.line_totals = lines;
    self.checklist = checklist;
    Ok(())
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => return false,

      KeyCode::Char('r') => self.refresh().await,

      KeyCode::Tab => {
        self.screen = match self.screen {
          Screen::Production => Screen::Checklist,
          Screen::Checklist => Screen::Production,
        };
      }

      KeyCode::Char('g') => {
        self.granularity = next_granularity(self.granularity);
        self.refresh().await;
      }

      KeyCode::Char('p') => {
        self.plant = self.next_plant();
        self.scroll = 0;
        self.refresh().await;
      }

      KeyCode::Down | KeyCode::Char('j') => {
        if self.scroll + 1 < self.records.len() {
          self.scroll += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.scroll = self.scroll.saturating_sub(1);
      }

      _ => {}
    }
    true
  }

  /// Cycle all plants → each roster plant → all plants.
  fn next_plant(&self) -> Option<String> {
    let plants: Vec<String> = self.roster.plants().map(ToString::to_string).collect();
    match &self.plant {
      None => plants.first().cloned(),
      Some(current) => plants
        .iter()
        .position(|p| p == current)
        .and_then(|i| plants.get(i + 1))
        .cloned(),
    }
  }
}

#[cfg(test)]
mod tests {
  use tally_core::plant::{Line, Plant};

  use super::*;
  use crate::client::ApiConfig;

  fn date(s: &str) -> NaiveDate { s.parse().unwrap() }

  fn app() -> App {
    let client = ApiClient::new(ApiConfig { base_url: "http://127.0.0.1:9".into() }).unwrap();
    App::new(client, Duration::from_secs(60))
  }

  #[test]
  fn chart_windows_end_at_today() {
    let today = date("2024-03-15");
    let (from, to) = chart_window(today, Granularity::Month);
    assert_eq!((from.to_string(), to.to_string()), ("2023-04".into(), "2024-03".into()));

    let (from, to) = chart_window(today, Granularity::Day);
    assert_eq!((from.to_string(), to.to_string()), ("2024-02-14".into(), "2024-03-15".into()));

    let (from, to) = chart_window(today, Granularity::Year);
    assert_eq!((from.to_string(), to.to_string()), ("2020".into(), "2024".into()));
  }

  #[test]
  fn refresh_is_due_first_and_then_after_the_interval() {
    let mut app = app();
    let start = Instant::now();
    assert!(app.refresh_due(start));

    app.last_refresh = Some(start);
    assert!(!app.refresh_due(start + Duration::from_secs(59)));
    assert!(app.refresh_due(start + Duration::from_secs(60)));
  }

  #[test]
  fn plant_filter_cycles_through_the_roster() {
    let mut app = app();
    app.roster = Roster::new()
      .with_line(Plant::new("Plant A").unwrap(), Line::new("L1").unwrap())
      .with_line(Plant::new("Plant B").unwrap(), Line::new("L1").unwrap());

    let mut seen = Vec::new();
    for _ in 0..3 {
      app.plant = app.next_plant();
      seen.push(app.plant.clone());
    }
    assert_eq!(seen, vec![Some("Plant A".into()), Some("Plant B".into()), None]);
  }

  #[tokio::test]
  async fn failed_refresh_keeps_running() {
    let mut app = app();
    app.refresh().await;
    assert!(app.status_msg.starts_with("Error"));
    assert!(!app.refresh_due(Instant::now()));
  }
}
