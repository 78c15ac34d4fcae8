//! Handler for `GET /roster`: the configured plants and their lines.
//! An empty object means any plant and line is accepted.

use axum::{Json, extract::State};
use tally_core::{
  plant::Roster,
  store::{ChecklistStore, LedgerStore},
};

use crate::AppState;

pub async fn handler<S, C>(State(state): State<AppState<S, C>>) -> Json<Roster>
where
  S: LedgerStore,
  C: ChecklistStore,
{
  Json(Roster::clone(&state.roster))
}
