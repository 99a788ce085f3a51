//! Handlers for aircraft reference data.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/aircraft/{serial}` | Viewer of the aircraft's unit |
//! | `POST` | `/aircraft` | Admin only. Body: [`Aircraft`] |
//! | `POST` | `/aircraft/{serial}/maintenance_events` | Manager of the aircraft's unit; returns 201 |
//! | `POST` | `/da_1352` | Admin only. Body: [`Da1352`] |
//! | `POST` | `/flights` | Admin only. Body: [`Flight`]; the model comes from the aircraft |
//! | `POST` | `/projections` | Admin only. Body: [`MonthlyProjection`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use redcon_core::{
  aircraft::{Aircraft, Da1352, MaintenanceEvent, MonthlyProjection, NewMaintenanceEvent},
  flight::Flight,
  store::ReadinessStore,
};

use crate::{auth::Requester, error::ApiError};

async fn fetch_aircraft<S: ReadinessStore>(store: &S, serial: &str) -> Result<Aircraft, ApiError> {
  store
    .get_aircraft(serial)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("aircraft {serial} not found")))
}

/// `GET /aircraft/{serial}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(serial): Path<String>,
) -> Result<Json<Aircraft>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let aircraft = fetch_aircraft(store.as_ref(), &serial).await?;
  requester.view_unit(store.as_ref(), &aircraft.current_unit).await?;
  Ok(Json(aircraft))
}

/// `POST /aircraft`. The aircraft's unit must exist.
pub async fn upsert<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<Aircraft>,
) -> Result<Json<Aircraft>, ApiError>
where
  S: ReadinessStore + 'static,
{
  requester.require_admin()?;
  if store.get_unit(&body.current_unit).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound(format!("unit {} not found", body.current_unit)));
  }
  Ok(Json(store.upsert_aircraft(body).await.map_err(ApiError::store)?))
}

/// `POST /aircraft/{serial}/maintenance_events`
pub async fn add_maintenance_event<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(serial): Path<String>,
  Json(body): Json<NewMaintenanceEvent>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReadinessStore + 'static,
{
  if body.serial != serial {
    return Err(ApiError::BadRequest(format!(
      "body serial {} does not match path serial {serial}",
      body.serial
    )));
  }
  if body.event_end.is_some_and(|end| end < body.event_start) {
    return Err(ApiError::Unprocessable("event_end precedes event_start".into()));
  }
  let aircraft = fetch_aircraft(store.as_ref(), &serial).await?;
  requester.manage_unit(store.as_ref(), &aircraft.current_unit).await?;

  let event = store
    .add_maintenance_event(MaintenanceEvent::from(body))
    .await
    .map_err(ApiError::store)?;
  tracing::info!(%serial, event_id = %event.event_id, "recorded maintenance event");
  Ok((StatusCode::CREATED, Json(event)))
}

/// `POST /da_1352`. Replaces the report for the same serial and month.
pub async fn record_1352<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<Da1352>,
) -> Result<Json<Da1352>, ApiError>
where
  S: ReadinessStore + 'static,
{
  requester.require_admin()?;
  Ok(Json(store.record_1352(body).await.map_err(ApiError::store)?))
}

/// `POST /projections`. Replaces the projection for the same unit, model
/// and month.
pub async fn upsert_projection<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<MonthlyProjection>,
) -> Result<Json<MonthlyProjection>, ApiError>
where
  S: ReadinessStore + 'static,
{
  requester.require_admin()?;
  if store.get_unit(&body.unit_uic).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound(format!("unit {} not found", body.unit_uic)));
  }
  Ok(Json(store.upsert_projection(body).await.map_err(ApiError::store)?))
}

/// `POST /flights`. Replaces the flight with the same id.
pub async fn record_flight<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<Flight>,
) -> Result<Json<Flight>, ApiError>
where
  S: ReadinessStore + 'static,
{
  requester.require_admin()?;
  if body.stop.is_some_and(|stop| stop < body.start) {
    return Err(ApiError::Unprocessable("flight stops before it starts".into()));
  }
  let aircraft = fetch_aircraft(store.as_ref(), &body.serial).await?;
  if store.get_unit(&body.unit_uic).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound(format!("unit {} not found", body.unit_uic)));
  }
  let flight = Flight { model: aircraft.model, ..body };
  Ok(Json(store.record_flight(flight).await.map_err(ApiError::store)?))
}
