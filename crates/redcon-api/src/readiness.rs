//! Handlers for `/readiness/{uic}/...` endpoints.
//!
//! These report on every maintainer assigned under the unit, whatever their
//! MOS.
//!
//! | Path | Query |
//! |------|-------|
//! | `/unavailable` | `start_date`, `end_date` |
//! | `/inexperienced` | `start_date`, `end_date` |
//! | `/strength_by_mos` | `date?` |
//! | `/strength_by_skill` | `date?` |
//! | `/experience_by_mos` | `date?` (the target), `mos?` comma list |
//! | `/actual_vs_authorized` | `date?`, `mos?` comma list |
//! | `/phase_maintainers` | `start_date`, `end_date` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::NaiveDate;
use redcon_core::{
  mtoe::MtoePosition,
  period::{fiscal_year, reporting_period},
  report::{
    Dataset, RosterFilter,
    readiness::{self, ActualVsAuthorized, MlCount, MosExperience, PhaseMaintainer, Strength},
  },
  store::ReadinessStore,
  unit::Unit,
};

use crate::{
  auth::Requester,
  error::ApiError,
  params::{DateRange, OnDate},
};

async fn dataset<S: ReadinessStore>(
  store: &S,
  unit:  &Unit,
  start: NaiveDate,
  end:   NaiveDate,
) -> Result<Dataset, ApiError> {
  Dataset::load(store, &unit.with_subordinates(), start, end, RosterFilter::Maintainers)
    .await
    .map_err(ApiError::store)
}

async fn mtoe_for<S: ReadinessStore>(
  store: &S,
  unit:  &Unit,
  on:    NaiveDate,
) -> Result<Vec<MtoePosition>, ApiError> {
  store
    .list_mtoe(&unit.with_subordinates(), Some(fiscal_year(on)))
    .await
    .map_err(ApiError::store)
}

/// `GET /readiness/{uic}/unavailable`
pub async fn unavailable<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(range): Query<DateRange>,
) -> Result<Json<Vec<MlCount>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let (start, end) = range.checked()?;
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let ds = dataset(store.as_ref(), &unit, start, end).await?;
  Ok(Json(readiness::unavailable_maintainers(&ds)))
}

/// `GET /readiness/{uic}/inexperienced`
pub async fn inexperienced<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(range): Query<DateRange>,
) -> Result<Json<Vec<MlCount>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let (start, end) = range.checked()?;
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let ds = dataset(store.as_ref(), &unit, start, end).await?;
  Ok(Json(readiness::inexperienced_maintainers(&ds)))
}

/// `GET /readiness/{uic}/strength_by_mos[?date=...]`
pub async fn strength_by_mos<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(params): Query<OnDate>,
) -> Result<Json<Vec<Strength>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let on = params.date();
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let ds = dataset(store.as_ref(), &unit, on, on).await?;
  let mtoe = mtoe_for(store.as_ref(), &unit, on).await?;
  Ok(Json(readiness::strength_by_mos(&ds, &mtoe)))
}

/// `GET /readiness/{uic}/strength_by_skill[?date=...]`
pub async fn strength_by_skill<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(params): Query<OnDate>,
) -> Result<Json<Vec<Strength>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let on = params.date();
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let ds = dataset(store.as_ref(), &unit, on, on).await?;
  let mtoe = mtoe_for(store.as_ref(), &unit, on).await?;
  Ok(Json(readiness::strength_by_skill(&ds, &mtoe)))
}

/// `GET /readiness/{uic}/experience_by_mos[?date=...][&mos=15R,15T]`
pub async fn experience_by_mos<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(params): Query<OnDate>,
) -> Result<Json<Vec<MosExperience>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let target = params.date();
  let periods = readiness::experience_periods(target);
  let (Some(first), Some(last)) = (periods.first(), periods.last()) else {
    return Ok(Json(Vec::new()));
  };

  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let ds = dataset(store.as_ref(), &unit, first.start, last.end).await?;
  let mtoe = mtoe_for(store.as_ref(), &unit, target).await?;
  let codes = params.mos_codes();
  Ok(Json(readiness::maintainer_experience_by_mos(&ds, &mtoe, target, codes.as_deref())))
}

/// `GET /readiness/{uic}/actual_vs_authorized[?date=...][&mos=15R,15T]`
pub async fn actual_vs_authorized<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(params): Query<OnDate>,
) -> Result<Json<ActualVsAuthorized>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let on = params.date();
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let ds = dataset(store.as_ref(), &unit, reporting_period(on).previous().start, on).await?;
  let mtoe = mtoe_for(store.as_ref(), &unit, on).await?;
  let codes = params.mos_codes();
  Ok(Json(readiness::actual_vs_authorized(&ds, &unit, &mtoe, on, codes.as_deref())))
}

/// `GET /readiness/{uic}/phase_maintainers`
pub async fn phase_maintainers<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(range): Query<DateRange>,
) -> Result<Json<Vec<PhaseMaintainer>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let (start, end) = range.checked()?;
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let ds = dataset(store.as_ref(), &unit, start, end).await?;
  Ok(Json(readiness::phase_maintainers(&ds, start, end)))
}
