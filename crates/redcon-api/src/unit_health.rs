//! Handlers for `/unit_health/{uic}/...` endpoints.
//!
//! Every endpoint takes `?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD` and
//! reports on AMTP maintainers assigned under the unit during that range.
//!
//! | Path | Body |
//! |------|------|
//! | `/summary` | [`UnitHealthSummary`] |
//! | `/availability` | Availability counts per unit row |
//! | `/roster` | One row per soldier |
//! | `/missing_packets` | Packet status per soldier |
//! | `/availability_details` | Soldiers grouped by unit, with flag details |
//! | `/evaluation_details` | Evaluation status for the unit's own soldiers |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use redcon_core::{
  report::{
    Dataset, RosterFilter,
    health::{
      self, SoldierEvaluationDetail, SoldierHealth, SoldierMissingPacket, SoldiersByUnit,
      UnitAvailabilitySummary, UnitHealthSummary,
    },
  },
  store::ReadinessStore,
  unit::Unit,
};

use crate::{
  auth::Requester,
  error::ApiError,
  params::{DateRange, today},
};

async fn load<S: ReadinessStore>(
  store:     &S,
  requester: &Requester,
  uic:       &str,
  range:     DateRange,
) -> Result<(Unit, Dataset), ApiError> {
  let (start, end) = range.checked()?;
  let unit = requester.view_unit(store, uic).await?;
  let ds = Dataset::load(store, &unit.with_subordinates(), start, end, RosterFilter::AmtpMaintainers)
    .await
    .map_err(ApiError::store)?;
  tracing::debug!(%uic, soldiers = ds.roster.len(), "loaded unit health dataset");
  Ok((unit, ds))
}

/// `GET /unit_health/{uic}/summary`
pub async fn summary<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(range): Query<DateRange>,
) -> Result<Json<UnitHealthSummary>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let (unit, ds) = load(store.as_ref(), &requester, &uic, range).await?;
  Ok(Json(health::unit_health_summary(&ds, &unit, today())))
}

/// `GET /unit_health/{uic}/availability`
pub async fn availability<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(range): Query<DateRange>,
) -> Result<Json<Vec<UnitAvailabilitySummary>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let (unit, ds) = load(store.as_ref(), &requester, &uic, range).await?;
  Ok(Json(health::units_availability(&ds, &unit)))
}

/// `GET /unit_health/{uic}/roster`
pub async fn roster<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(range): Query<DateRange>,
) -> Result<Json<Vec<SoldierHealth>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let (unit, ds) = load(store.as_ref(), &requester, &uic, range).await?;
  Ok(Json(health::health_roster(&ds, &unit, today())))
}

/// `GET /unit_health/{uic}/missing_packets`
pub async fn missing_packets<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(range): Query<DateRange>,
) -> Result<Json<Vec<SoldierMissingPacket>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let (unit, ds) = load(store.as_ref(), &requester, &uic, range).await?;
  Ok(Json(health::missing_packets(&ds, &unit)))
}

/// `GET /unit_health/{uic}/availability_details`
pub async fn availability_details<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(range): Query<DateRange>,
) -> Result<Json<Vec<SoldiersByUnit>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let (unit, ds) = load(store.as_ref(), &requester, &uic, range).await?;
  Ok(Json(health::availability_details(&ds, &unit)))
}

/// `GET /unit_health/{uic}/evaluation_details`
pub async fn evaluation_details<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(range): Query<DateRange>,
) -> Result<Json<Vec<SoldierEvaluationDetail>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let (unit, ds) = load(store.as_ref(), &requester, &uic, range).await?;
  Ok(Json(health::evaluation_details(&ds, &unit, today())))
}
