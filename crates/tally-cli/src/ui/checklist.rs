//! Checklist screen: one row per task, one column per month.

use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  widgets::{Block, Borders, Cell, Row, Table},
};
use strum::IntoEnumIterator as _;
use tally_core::checklist::Month;

use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" Monthly maintenance checklist ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let header = Row::new(
    std::iter::once(Cell::from("Task")).chain(Month::iter().map(|m| Cell::from(m.label()))),
  )
  .style(
    Style::default()
      .fg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );

  // Each task takes two lines: operator above engineer.
  let rows = app.checklist.iter().map(|row| {
    let cells = row.cells.values().map(|cell| match cell {
      Some(s) => Cell::from(format!("{}\n{}", s.operator, s.engineer))
        .style(Style::default().fg(Color::Green)),
      None => Cell::from("·").style(Style::default().fg(Color::DarkGray)),
    });
    Row::new(std::iter::once(Cell::from(row.task.label())).chain(cells)).height(2)
  });

  let widths = std::iter::once(Constraint::Length(34))
    .chain(Month::iter().map(|_| Constraint::Min(5)));
  f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}
