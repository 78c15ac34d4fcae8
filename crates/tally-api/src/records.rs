//! Handlers for `/records` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/records` | Optional `?plant=…&line=…` |
//! | `POST` | `/records` | Body: [`SubmitBody`]; returns 201 + stored record |

use axum::{
  Json,
  extract::{Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;
use tally_core::{
  ledger::Scope,
  plant::{Line, Plant},
  record::{NewRecord, ProductionRecord, Quantity},
  store::{ChecklistStore, LedgerStore},
};

use crate::{AppState, error::{ApiError, Result}};

/// Turn optional `plant` / `line` query values into a [`Scope`]. Blank values
/// count as absent.
pub(crate) fn parse_scope(plant: Option<&str>, line: Option<&str>) -> Result<Scope> {
  fn present(v: Option<&str>) -> Option<&str> { v.filter(|s| !s.trim().is_empty()) }
  let plant = present(plant).map(Plant::new).transpose()?;
  let line = present(line).map(Line::new).transpose()?;
  Ok(Scope::from_parts(plant, line)?)
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub plant: Option<String>,
  pub line:  Option<String>,
}

/// `GET /records[?plant=…][&line=…]`
pub async fn list<S, C>(
  State(state): State<AppState<S, C>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ProductionRecord>>>
where
  S: LedgerStore,
  C: ChecklistStore,
{
  let scope = parse_scope(params.plant.as_deref(), params.line.as_deref())?;
  let records = state.ledger.list(scope).await.map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Submit ───────────────────────────────────────────────────────────────────

/// An image sent inline with a submission.
#[derive(Debug, Deserialize)]
pub struct AttachmentBody {
  /// `image/png`, `image/jpeg`, `image/gif` or `image/webp`.
  pub media_type: String,
  /// Standard base64 of the image bytes.
  pub data:       String,
}

/// JSON body accepted by `POST /records`.
///
/// Fields arrive as raw text and a signed quantity so that range and format
/// checks happen after parsing. A body that does not fit this shape at all
/// (missing field, fractional or quoted quantity) is a 400 as well.
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  pub plant:      String,
  pub line:       String,
  /// `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.
  pub period:     String,
  pub quantity:   i64,
  pub remarks:    Option<String>,
  pub attachment: Option<AttachmentBody>,
}

/// `POST /records`: returns 201 + the stored [`ProductionRecord`].
pub async fn submit<S, C>(
  State(state): State<AppState<S, C>>,
  body: std::result::Result<Json<SubmitBody>, JsonRejection>,
) -> Result<impl IntoResponse>
where
  S: LedgerStore,
  C: ChecklistStore,
{
  let Json(body) = body?;
  let mut input = validate(&state, &body).inspect_err(|error| {
    tracing::debug!(%error, plant = %body.plant, line = %body.line, "rejected submission");
  })?;

  let staged = match &body.attachment {
    Some(a) => {
      let bytes = STANDARD
        .decode(a.data.trim())
        .map_err(|e| ApiError::BadRequest(format!("attachment is not valid base64: {e}")))?;
      let staged = state
        .attachments
        .stage(&input.plant, &input.line, &input.period, &a.media_type, &bytes)
        .await?;
      input.attachment = Some(staged.attachment().clone());
      Some(staged)
    }
    None => None,
  };

  // The image only replaces the stored one once the ledger has the record.
  let record = match state.ledger.upsert(input).await {
    Ok(record) => record,
    Err(e) => {
      if let Some(staged) = staged {
        state.attachments.discard(staged).await;
      }
      return Err(ApiError::store(e));
    }
  };
  if let Some(staged) = staged {
    state.attachments.commit(staged).await?;
  }

  tracing::info!(
    plant = %record.plant,
    line = %record.line,
    period = %record.period,
    quantity = %record.quantity,
    "recorded production"
  );
  Ok((StatusCode::CREATED, Json(record)))
}

fn validate<S, C>(state: &AppState<S, C>, body: &SubmitBody) -> Result<NewRecord> {
  let plant = Plant::new(&body.plant)?;
  let line = Line::new(&body.line)?;
  state.roster.check(&plant, &line)?;
  let period = body.period.parse()?;
  let quantity = Quantity::try_from(body.quantity)?;

  let mut input = NewRecord::new(plant, line, period, quantity);
  input.remarks = body.remarks.clone();
  Ok(input)
}
