//! Production screen: records table on the left, period chart and line
//! totals on the right.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::Line,
  widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Row, Table},
};

use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
    .split(area);
  let right = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
    .split(cols[1]);

  draw_records(f, cols[0], app);
  draw_chart(f, right[0], app);
  draw_line_totals(f, right[1], app);
}

fn pane(title: String) -> Block<'static> {
  Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}

// ─── Records ──────────────────────────────────────────────────────────────────

fn draw_records(f: &mut Frame, area: Rect, app: &App) {
  let block = pane(format!(" Records ({}) ", app.records.len()));

  if app.records.is_empty() {
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
      Paragraph::new("Nothing recorded yet.").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let header = Row::new(["Period", "Plant", "Line", "Quantity", "Remarks"]).style(
    Style::default()
      .fg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let rows = app.records.iter().skip(app.scroll).map(|r| {
    Row::new([
      r.period.to_string(),
      r.plant.to_string(),
      r.line.to_string(),
      r.quantity.to_string(),
      match (&r.remarks, &r.attachment) {
        (Some(text), Some(_)) => format!("{text} [img]"),
        (Some(text), None) => text.clone(),
        (None, Some(_)) => "[img]".to_owned(),
        (None, None) => String::new(),
      },
    ])
  });

  let widths = [
    Constraint::Length(11),
    Constraint::Percentage(20),
    Constraint::Percentage(20),
    Constraint::Length(10),
    Constraint::Min(0),
  ];
  f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

// ─── Chart ────────────────────────────────────────────────────────────────────

/// Short bar label: the part of the period that varies within the window.
fn bar_label(period: &str) -> String {
  match period.len() {
    10 => period[8..].to_owned(), // day of month
    7 => period[5..].to_owned(),  // month number
    _ => period.to_owned(),
  }
}

fn draw_chart(f: &mut Frame, area: Rect, app: &App) {
  let Some(view) = &app.rollup else {
    f.render_widget(pane(" Production ".into()), area);
    return;
  };

  let block = pane(format!(" Production by {} (total {}) ", view.granularity, view.total));
  let bars: Vec<Bar> = view
    .points
    .iter()
    .map(|p| {
      Bar::default()
        .value(p.quantity.get())
        .label(Line::from(bar_label(&p.period.to_string())))
        .text_value(String::new())
    })
    .collect();

  let inner_width = area.width.saturating_sub(2);
  let count = bars.len().max(1) as u16;
  let bar_width = (inner_width / count).saturating_sub(1).clamp(1, 6);

  f.render_widget(
    BarChart::default()
      .block(block)
      .bar_width(bar_width)
      .bar_gap(1)
      .bar_style(Style::default().fg(Color::Cyan))
      .data(BarGroup::default().bars(&bars)),
    area,
  );
}

// ─── Line totals ──────────────────────────────────────────────────────────────

fn draw_line_totals(f: &mut Frame, area: Rect, app: &App) {
  let block = pane(" This month by line ".into());
  let rows = app.line_totals.iter().map(|t| {
    let style = if t.quantity.get() == 0 {
      Style::default().fg(Color::DarkGray)
    } else {
      Style::default()
    };
    Row::new([t.plant.to_string(), t.line.to_string(), t.quantity.to_string()]).style(style)
  });
  let widths = [
    Constraint::Percentage(40),
    Constraint::Percentage(40),
    Constraint::Percentage(20),
  ];
  f.render_widget(Table::new(rows, widths).block(block), area);
}

#[cfg(test)]
mod tests {
  use super::bar_label;

  #[test]
  fn labels_keep_the_varying_part() {
    assert_eq!(bar_label("2024-03-05"), "05");
    assert_eq!(bar_label("2024-03"), "03");
    assert_eq!(bar_label("2024"), "2024");
  }
}
