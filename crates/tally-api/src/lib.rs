//! JSON REST API for Tally.
//!
//! Exposes an axum [`Router`] backed by any [`LedgerStore`] and
//! [`ChecklistStore`]. All user input is validated here, before it reaches a
//! store. Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tally_api::api_router(state))
//! ```

pub mod checklist;
pub mod error;
pub mod records;
pub mod rollup;
pub mod roster;

use std::sync::Arc;

use axum::{Router, routing::get};
use tally_core::{
  plant::Roster,
  store::{ChecklistStore, LedgerStore},
};
use tally_store_file::AttachmentDir;

pub use error::ApiError;

/// Everything a handler needs, constructed once at startup.
pub struct AppState<S, C> {
  pub ledger:      Arc<S>,
  pub checklist:   Arc<C>,
  pub roster:      Arc<Roster>,
  pub attachments: Arc<AttachmentDir>,
}

impl<S, C> AppState<S, C> {
  pub fn new(ledger: S, checklist: C, roster: Roster, attachments: AttachmentDir) -> Self {
    Self {
      ledger:      Arc::new(ledger),
      checklist:   Arc::new(checklist),
      roster:      Arc::new(roster),
      attachments: Arc::new(attachments),
    }
  }
}

impl<S, C> Clone for AppState<S, C> {
  fn clone(&self) -> Self {
    Self {
      ledger:      self.ledger.clone(),
      checklist:   self.checklist.clone(),
      roster:      self.roster.clone(),
      attachments: self.attachments.clone(),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(state: AppState<S, C>) -> Router<()>
where
  S: LedgerStore + 'static,
  C: ChecklistStore + 'static,
{
  Router::new()
    // Records
    .route("/records", get(records::list::<S, C>).post(records::submit::<S, C>))
    // Rollups
    .route("/rollup", get(rollup::periods::<S, C>))
    .route("/rollup/lines", get(rollup::lines::<S, C>))
    .route("/roster", get(roster::handler::<S, C>))
    // Maintenance checklist
    .route(
      "/checklist",
      get(checklist::grid::<S, C>).post(checklist::sign::<S, C>),
    )
    .with_state(state)
}

#[cfg(test)]
mod tests;
