//! Flat-file backends for the Tally production ledger.
//!
//! - [`JsonFileStore`] keeps the nested `plant → line → period` mapping in
//!   one JSON document and rewrites it wholesale on every save.
//! - [`CsvLogStore`] appends one row per submission; reads replay the log.
//! - [`JsonChecklistStore`] keeps the maintenance checklist grid.
//! - [`AttachmentDir`] stores submitted images next to the ledger.
//!
//! A missing file is an empty store. Malformed content is logged and treated
//! as empty rather than failing the request.

mod attachments;
mod checklist;
mod csv_log;
mod fs;
mod json;

pub mod error;

pub use attachments::{AttachmentDir, MAX_ATTACHMENT_BYTES, StagedAttachment};
pub use checklist::JsonChecklistStore;
pub use csv_log::CsvLogStore;
pub use error::{Error, Result};
pub use json::JsonFileStore;

#[cfg(test)]
mod tests;
