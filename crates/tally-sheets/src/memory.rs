//! [`MemorySheet`]: an in-process worksheet.

use std::sync::{Mutex, PoisonError};

use crate::{Result, client::SheetClient};

/// A worksheet held in memory. Useful for tests and for running without a
/// remote spreadsheet; contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySheet {
  rows: Mutex<Vec<Vec<String>>>,
}

impl MemorySheet {
  pub fn new() -> Self { Self::default() }

  pub fn with_rows(rows: Vec<Vec<String>>) -> Self { Self { rows: Mutex::new(rows) } }

  /// A copy of the current grid.
  pub fn snapshot(&self) -> Vec<Vec<String>> {
    self.rows.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }
}

impl SheetClient for MemorySheet {
  async fn get_all_values(&self) -> Result<Vec<Vec<String>>> { Ok(self.snapshot()) }

  async fn append_row(&self, row: Vec<String>) -> Result<()> {
    let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
    while rows.last().is_some_and(|r| r.iter().all(String::is_empty)) {
      rows.pop();
    }
    rows.push(row);
    Ok(())
  }

  async fn update_cell(&self, row: u32, column: u32, value: String) -> Result<()> {
    let (r, c) = (row.max(1) as usize - 1, column.max(1) as usize - 1);
    let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
    if rows.len() <= r {
      rows.resize_with(r + 1, Vec::new);
    }
    let cells = &mut rows[r];
    if cells.len() <= c {
      cells.resize(c + 1, String::new());
    }
    cells[c] = value;
    Ok(())
  }
}
