//! TUI rendering: orchestrates all panes.

pub mod checklist;
pub mod production;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::{App, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  match app.screen {
    Screen::Production => production::draw(f, rows[1], app),
    Screen::Checklist => checklist::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let scope = app.plant.as_deref().unwrap_or("all plants");
  let left = Span::styled(
    format!(" tally  {scope}  by {}", app.granularity),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!("{}  {} ", app.base_url(), Local::now().format("%Y-%m-%d")),
    Style::default().fg(Color::Gray),
  );

  let pad = area
    .width
    .saturating_sub(left.content.chars().count() as u16)
    .saturating_sub(right.content.chars().count() as u16);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match app.screen {
    Screen::Production => (
      "PRODUCTION",
      "↑↓/jk scroll  g granularity  p plant  r refresh  Tab checklist  q quit",
    ),
    Screen::Checklist => ("CHECKLIST", "r refresh  Tab production  q quit"),
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {hints}"), Style::default().fg(Color::DarkGray));
  let msg_style = if app.status_msg.starts_with("Error") {
    Style::default().fg(Color::Red)
  } else {
    Style::default().fg(Color::Green)
  };
  let msg_span = Span::styled(format!("  {}", app.status_msg), msg_style);

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span, msg_span]))
      .style(Style::default().bg(Color::Black)),
    area,
  );
}
