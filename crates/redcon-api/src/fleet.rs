//! Handlers for `/fleet/{uic}/...` endpoints.
//!
//! | Path | Query | Body |
//! |------|-------|------|
//! | `/aircraft` | | Aircraft assigned under the unit |
//! | `/bank_percentage` | `group_by=unit\|model\|subordinates` | [`BankPercentage`] rows |
//! | `/phase_flow` | `group_by=none\|subordinates\|models` | Aircraft, or groups of them |
//! | `/forecast` | | [`ModelForecast`] per model |
//! | `/da_1352` | `start_date?`, `end_date?` | DA-1352 reports |
//! | `/status_over_time` | `start_date?`, `end_date?` | [`StatusOverTime`] per month |
//! | `/flights` | `start_date?`, `end_date?` | [`DayNightReport`] |
//! | `/flight_hours` | | [`FlightHoursSummary`] for the current reporting period |
//!
//! The DA-1352 range defaults to two years back from the end of the current
//! reporting period; the flight range to the last twelve reporting periods.

use std::{collections::HashMap, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Months;
use redcon_core::{
  aircraft::{Aircraft, Da1352},
  flight::{
    DayNightReport, FlightHoursSummary, day_night, default_flight_range, fiscal_year_start,
    flight_hours_summary,
  },
  period::reporting_period,
  report::fleet::{
    self, BankGrouping, BankPercentage, FORECAST_PERIODS, ForecastInputs, HISTORY_YEARS,
    ModelForecast, PhaseFlowGroup, StatusOverTime,
  },
  store::ReadinessStore,
  unit::Unit,
};
use serde::{Deserialize, Serialize};

use crate::{
  auth::Requester,
  error::ApiError,
  params::{OptionalRange, today},
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// The units named in `uics`, in that order. Unknown UICs are skipped.
async fn units_named<S: ReadinessStore>(store: &S, uics: &[String]) -> Result<Vec<Unit>, ApiError> {
  let mut by_uic: HashMap<String, Unit> = store
    .list_units()
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .map(|u| (u.uic.clone(), u))
    .collect();
  Ok(uics.iter().filter_map(|uic| by_uic.remove(uic)).collect())
}

async fn fleet_of<S: ReadinessStore>(store: &S, unit: &Unit) -> Result<Vec<Aircraft>, ApiError> {
  store.list_aircraft(&unit.with_subordinates()).await.map_err(ApiError::store)
}

// ─── Aircraft ────────────────────────────────────────────────────────────────

/// `GET /fleet/{uic}/aircraft`
pub async fn aircraft<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
) -> Result<Json<Vec<Aircraft>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  Ok(Json(fleet_of(store.as_ref(), &unit).await?))
}

// ─── Bank time ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct BankParams {
  #[serde(default)]
  pub group_by: BankGrouping,
}

/// `GET /fleet/{uic}/bank_percentage[?group_by=model]`
pub async fn bank_percentage<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(params): Query<BankParams>,
) -> Result<Json<Vec<BankPercentage>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let aircraft = fleet_of(store.as_ref(), &unit).await?;
  let children = match params.group_by {
    BankGrouping::Subordinates => units_named(store.as_ref(), &unit.child_uics).await?,
    _ => Vec::new(),
  };
  Ok(Json(fleet::bank_hour_percentage(&unit, &children, &aircraft, params.group_by)))
}

// ─── Phase flow ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseFlowGrouping {
  #[default]
  None,
  Subordinates,
  Models,
}

#[derive(Debug, Default, Deserialize)]
pub struct PhaseFlowParams {
  #[serde(default)]
  pub group_by: PhaseFlowGrouping,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PhaseFlow {
  Fleet(Vec<Aircraft>),
  Groups(Vec<PhaseFlowGroup>),
}

/// `GET /fleet/{uic}/phase_flow[?group_by=subordinates]`
pub async fn phase_flow<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(params): Query<PhaseFlowParams>,
) -> Result<Json<PhaseFlow>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let aircraft = fleet_of(store.as_ref(), &unit).await?;
  let flow = match params.group_by {
    PhaseFlowGrouping::None => PhaseFlow::Fleet(fleet::phase_flow(&aircraft)),
    PhaseFlowGrouping::Models => PhaseFlow::Groups(fleet::phase_flow_models(&aircraft)),
    PhaseFlowGrouping::Subordinates => {
      let children = units_named(store.as_ref(), &unit.child_uics).await?;
      PhaseFlow::Groups(fleet::phase_flow_subordinates(&children, &aircraft))
    }
  };
  Ok(Json(flow))
}

// ─── Forecast ────────────────────────────────────────────────────────────────

/// `GET /fleet/{uic}/forecast`
///
/// Companies fly against their parent's projections, split across the
/// parent's subordinates that hold each model.
pub async fn forecast<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
) -> Result<Json<Vec<ModelForecast>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let aircraft = fleet_of(store.as_ref(), &unit).await?;
  let today = today();

  let current = reporting_period(today);
  let mut last = current;
  for _ in 1..FORECAST_PERIODS {
    last = last.next();
  }

  let parent = match (&unit.parent_uic, unit.echelon.is_company()) {
    (Some(parent_uic), true) => store.get_unit(parent_uic).await.map_err(ApiError::store)?,
    _ => None,
  };
  let (projection_scope, divisors) = match parent {
    Some(parent) => {
      let siblings = units_named(store.as_ref(), &parent.child_uics).await?;
      let parent_fleet = fleet_of(store.as_ref(), &parent).await?;
      (parent.with_subordinates(), fleet::projection_divisors(&siblings, &parent_fleet))
    }
    None => (unit.with_subordinates(), HashMap::new()),
  };

  let projections = store
    .list_projections(&projection_scope, current.start, last.end)
    .await
    .map_err(ApiError::store)?;
  let reports = store
    .list_1352(&unit.with_subordinates(), today - Months::new(12 * HISTORY_YEARS), today)
    .await
    .map_err(ApiError::store)?;
  let serials: Vec<String> = aircraft.iter().map(|a| a.serial.clone()).collect();
  let maintenance = store
    .list_maintenance_events(&serials, current.start, last.end)
    .await
    .map_err(ApiError::store)?;

  let inputs = ForecastInputs {
    aircraft:    &aircraft,
    projections: &projections,
    reports:     &reports,
    maintenance: &maintenance,
  };
  Ok(Json(fleet::bank_time_forecast(inputs, &divisors, today)))
}

// ─── DA-1352 ─────────────────────────────────────────────────────────────────

async fn reports_in<S: ReadinessStore>(
  store:     &S,
  requester: &Requester,
  uic:       &str,
  range:     OptionalRange,
) -> Result<Vec<Da1352>, ApiError> {
  let (start, end) = range.or(fleet::default_1352_range(today()))?;
  let unit = requester.view_unit(store, uic).await?;
  store
    .list_1352(&unit.with_subordinates(), start, end)
    .await
    .map_err(ApiError::store)
}

/// `GET /fleet/{uic}/da_1352`
pub async fn da_1352<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(range): Query<OptionalRange>,
) -> Result<Json<Vec<Da1352>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  Ok(Json(reports_in(store.as_ref(), &requester, &uic, range).await?))
}

/// `GET /fleet/{uic}/status_over_time`
pub async fn status_over_time<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(range): Query<OptionalRange>,
) -> Result<Json<Vec<StatusOverTime>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let reports = reports_in(store.as_ref(), &requester, &uic, range).await?;
  Ok(Json(fleet::status_over_time(&reports)))
}

// ─── Flights ─────────────────────────────────────────────────────────────────

/// `GET /fleet/{uic}/flights`
pub async fn flights<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(range): Query<OptionalRange>,
) -> Result<Json<DayNightReport>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let (start, end) = range.or(default_flight_range(today()))?;
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let flights = store
    .list_flights(&unit.with_subordinates(), start, end)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(day_night(&flights)))
}

/// `GET /fleet/{uic}/flight_hours`
pub async fn flight_hours<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
) -> Result<Json<FlightHoursSummary>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let period = reporting_period(today());
  let flights = store
    .list_flights(&unit.with_subordinates(), fiscal_year_start(period.end), period.end)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(flight_hours_summary(&flights, period)))
}
