//! Handlers for `/rollup` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/rollup` | `?granularity=day\|month\|year` (default month), optional `plant`, `line`; `from` + `to` zero-fill the range |
//! | `GET`  | `/rollup/lines` | `?period=…` required, optional `plant`; per-line totals |

use axum::{
  Json,
  extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tally_core::{
  ledger::{Ledger, Scope},
  period::{Granularity, Period},
  plant::{Line, Plant},
  record::Quantity,
  store::{ChecklistStore, LedgerStore},
};

use crate::{
  AppState,
  error::{ApiError, Result},
  records::parse_scope,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
  pub period:   Period,
  pub quantity: Quantity,
}

// ─── Periods ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RollupParams {
  pub plant:       Option<String>,
  pub line:        Option<String>,
  pub granularity: Option<String>,
  pub from:        Option<String>,
  pub to:          Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RollupView {
  pub granularity: Granularity,
  pub total:       Quantity,
  pub points:      Vec<Point>,
}

/// `GET /rollup[?plant=…][&line=…][&granularity=…][&from=…&to=…]`
///
/// Without a range only periods that have production are listed. With one,
/// every period between the bounds is listed and empty ones read as zero.
pub async fn periods<S, C>(
  State(state): State<AppState<S, C>>,
  Query(params): Query<RollupParams>,
) -> Result<Json<RollupView>>
where
  S: LedgerStore,
  C: ChecklistStore,
{
  let scope = parse_scope(params.plant.as_deref(), params.line.as_deref())?;
  let granularity = match params.granularity.as_deref() {
    Some(g) => g.parse()?,
    None => Granularity::Month,
  };
  let range = match (params.from.as_deref(), params.to.as_deref()) {
    (None, None) => None,
    (Some(from), Some(to)) => {
      let (from, to): (Period, Period) = (from.parse()?, to.parse()?);
      if to.end() < from.start() {
        return Err(ApiError::BadRequest(format!("range ends before it starts: {from}..{to}")));
      }
      Some((from, to))
    }
    _ => return Err(ApiError::BadRequest("`from` and `to` must be given together".into())),
  };

  let rollup = state
    .ledger
    .aggregate(scope, granularity)
    .await
    .map_err(ApiError::store)?;

  let points = match range {
    Some((from, to)) => rollup
      .series(&from, &to)
      .into_iter()
      .map(|(period, quantity)| Point { period, quantity })
      .collect(),
    None => rollup
      .iter()
      .map(|(period, quantity)| Point { period: *period, quantity: *quantity })
      .collect::<Vec<_>>(),
  };
  let total = points.iter().map(|p| p.quantity).sum();

  Ok(Json(RollupView { granularity, total, points }))
}

// ─── Lines ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct LinesParams {
  pub plant:  Option<String>,
  pub period: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineTotal {
  pub plant:    Plant,
  pub line:     Line,
  pub quantity: Quantity,
}

/// `GET /rollup/lines?period=…[&plant=…]`
///
/// Every line known to the ledger or the roster within the scope, with its
/// total for `period`. Lines with nothing recorded read as zero.
pub async fn lines<S, C>(
  State(state): State<AppState<S, C>>,
  Query(params): Query<LinesParams>,
) -> Result<Json<Vec<LineTotal>>>
where
  S: LedgerStore,
  C: ChecklistStore,
{
  let scope = parse_scope(params.plant.as_deref(), None)?;
  let period: Period = params
    .period
    .as_deref()
    .ok_or_else(|| ApiError::BadRequest("`period` is required".into()))?
    .parse()?;

  let records = state
    .ledger
    .list(scope.clone())
    .await
    .map_err(ApiError::store)?;
  let ledger: Ledger = records.into_iter().collect();
  let mut totals = ledger.totals_by_line(&scope, &period);

  let roster = &state.roster;
  for plant in roster.plants().filter(|p| in_scope(&scope, p)) {
    for line in roster.lines(plant) {
      totals
        .entry((plant.clone(), line.clone()))
        .or_insert(Quantity::ZERO);
    }
  }

  Ok(Json(
    totals
      .into_iter()
      .map(|((plant, line), quantity)| LineTotal { plant, line, quantity })
      .collect(),
  ))
}

fn in_scope(scope: &Scope, plant: &Plant) -> bool {
  match scope {
    Scope::All => true,
    Scope::Plant(p) | Scope::Line(p, _) => p == plant,
  }
}
