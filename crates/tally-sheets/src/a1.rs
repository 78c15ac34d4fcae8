//! A1 notation helpers for the Sheets REST API.

/// Column letters for a 1-based column: 1 → `A`, 27 → `AA`.
pub fn column_letters(mut column: u32) -> String {
  let mut letters = Vec::new();
  while column > 0 {
    let rem = (column - 1) % 26;
    letters.push(b'A' + rem as u8);
    column = (column - 1) / 26;
  }
  letters.reverse();
  String::from_utf8(letters).unwrap_or_default()
}

/// `'Sheet name'`, with embedded quotes doubled.
pub fn quote_sheet(name: &str) -> String {
  format!("'{}'", name.replace('\'', "''"))
}

/// A1 range for a single cell on a named worksheet.
pub fn cell_range(sheet: &str, row: u32, column: u32) -> String {
  format!("{}!{}{row}", quote_sheet(sheet), column_letters(column))
}
