//! Handlers for `/events` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/events` | `?user_id` required; optional `event_type`, `start_date`, `end_date` |
//! | `GET`    | `/events/{id}` | Single event |
//! | `POST`   | `/events` | Body: [`NewEvent`]; manager of the soldier's unit; returns 201 |
//! | `DELETE` | `/events/{id}` | Soft delete; 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use redcon_core::{
  error::check_range,
  event::{Event, EventType, NewEvent},
  store::{EventQuery, ReadinessStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{auth::Requester, error::ApiError, soldiers::visible_soldier};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub user_id:    String,
  pub event_type: Option<EventType>,
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
}

/// `GET /events?user_id=<id>[&event_type=Evaluation][&start_date=...][&end_date=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Event>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  if let (Some(start), Some(end)) = (params.start_date, params.end_date) {
    check_range(start, end)?;
  }
  visible_soldier(store.as_ref(), &requester, &params.user_id).await?;

  let query = EventQuery {
    user_ids:        Some(vec![params.user_id]),
    event_type:      params.event_type,
    start:           params.start_date,
    end:             params.end_date,
    include_deleted: false,
  };
  let events = store.list_events(&query).await.map_err(ApiError::store)?;
  Ok(Json(events))
}

async fn live_event<S: ReadinessStore>(store: &S, id: Uuid) -> Result<Event, ApiError> {
  store
    .get_event(id)
    .await
    .map_err(ApiError::store)?
    .filter(|e| !e.event_deleted)
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))
}

/// `GET /events/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(id): Path<Uuid>,
) -> Result<Json<Event>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let event = live_event(store.as_ref(), id).await?;
  visible_soldier(store.as_ref(), &requester, &event.user_id).await?;
  Ok(Json(event))
}

/// `POST /events`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReadinessStore + 'static,
{
  let soldier = store
    .get_soldier(&body.user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("soldier {} not found", body.user_id)))?;
  requester.manage_unit(store.as_ref(), &soldier.unit_uic).await?;

  let mut event = body.into_event(Some(requester.user_id().to_owned()));
  if event.uic.is_none() {
    event.uic = Some(soldier.unit_uic);
  }
  let event = store.record_event(event).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `DELETE /events/{id}`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ReadinessStore + 'static,
{
  let event = live_event(store.as_ref(), id).await?;
  let soldier = store
    .get_soldier(&event.user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("soldier {} not found", event.user_id)))?;
  requester.manage_unit(store.as_ref(), &soldier.unit_uic).await?;

  store.delete_event(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
