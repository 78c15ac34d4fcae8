//! Core types and trait definitions for the Tally production ledger.
//!
//! No HTTP, filesystem or database code lives here; every other crate
//! depends on this one.

pub mod checklist;
pub mod error;
pub mod ledger;
pub mod period;
pub mod plant;
pub mod record;
pub mod store;

pub use error::{Error, Result};
