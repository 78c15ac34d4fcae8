//! The [`SheetClient`] trait.

use std::future::Future;

use crate::Result;

/// The three worksheet operations every sheet-backed store is built from.
/// Rows and columns are 1-based, as in the spreadsheet UI.
pub trait SheetClient: Send + Sync {
  /// Every non-empty row of the worksheet as cell text. Trailing empty
  /// cells may be omitted, so rows can differ in length.
  fn get_all_values(&self) -> impl Future<Output = Result<Vec<Vec<String>>>> + Send + '_;

  /// Append `row` after the last non-empty row.
  fn append_row(&self, row: Vec<String>) -> impl Future<Output = Result<()>> + Send + '_;

  /// Overwrite the cell at (`row`, `column`).
  fn update_cell(
    &self,
    row: u32,
    column: u32,
    value: String,
  ) -> impl Future<Output = Result<()>> + Send + '_;
}
