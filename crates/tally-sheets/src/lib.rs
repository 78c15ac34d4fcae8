//! Spreadsheet backends for the Tally production ledger.
//!
//! A worksheet is addressed the way the plant dashboards always did: read
//! every row, append a row, or overwrite one cell by 1-based row and column.
//! [`SheetClient`] captures those three calls; [`HttpSheetClient`] speaks
//! the Google Sheets v4 REST API and [`MemorySheet`] keeps the grid in
//! memory.
//!
//! On top of a client, [`SheetStore`] keeps the production ledger as an
//! append-only log and [`SheetChecklist`] keeps the maintenance checklist as
//! a task × month grid. Obtaining an access token is the caller's business.

mod a1;
mod checklist;
mod client;
mod http;
mod memory;
mod store;

pub mod error;

pub use checklist::SheetChecklist;
pub use client::SheetClient;
pub use error::{Error, Result};
pub use http::{HttpSheetClient, SheetConfig};
pub use memory::MemorySheet;
pub use store::{HEADER, SheetStore};
