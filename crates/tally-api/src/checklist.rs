//! Handlers for the maintenance checklist.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/checklist` | Every task with all twelve months |
//! | `POST` | `/checklist` | Body: [`SignBody`]; overwrites one cell |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tally_core::{
  checklist::{ChecklistRow, ChecklistTask, Month, SignOff},
  store::{ChecklistStore, LedgerStore},
};

use crate::{AppState, error::{ApiError, Result}};

/// `GET /checklist`
pub async fn grid<S, C>(State(state): State<AppState<S, C>>) -> Result<Json<Vec<ChecklistRow>>>
where
  S: LedgerStore,
  C: ChecklistStore,
{
  let grid = state.checklist.grid().await.map_err(ApiError::store)?;
  Ok(Json(grid.rows()))
}

#[derive(Debug, Deserialize)]
pub struct SignBody {
  /// Task label, case-insensitive.
  pub task:     String,
  /// `JAN` … `DEC` or the month number.
  pub month:    String,
  pub operator: String,
  pub engineer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignedCell {
  pub task:     ChecklistTask,
  pub month:    Month,
  pub sign_off: SignOff,
}

/// `POST /checklist`: returns the cell as written.
pub async fn sign<S, C>(
  State(state): State<AppState<S, C>>,
  body: std::result::Result<Json<SignBody>, JsonRejection>,
) -> Result<Json<SignedCell>>
where
  S: LedgerStore,
  C: ChecklistStore,
{
  let Json(body) = body?;
  let task: ChecklistTask = body.task.parse()?;
  let month: Month = body.month.parse()?;
  let sign_off = SignOff::new(&body.operator, &body.engineer)?;

  state
    .checklist
    .sign_off(task, month, sign_off.clone())
    .await
    .map_err(ApiError::store)?;
  tracing::info!(%task, %month, "checklist signed");

  Ok(Json(SignedCell { task, month, sign_off }))
}
