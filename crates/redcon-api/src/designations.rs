//! Handlers for `/designations` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/designations/types` | Every designation type |
//! | `POST`   | `/designations/types` | Admin only. Body: [`Designation`] |
//! | `GET`    | `/designations/soldier/{user_id}` | `current=true` keeps only those in force today |
//! | `POST`   | `/designations` | Body: [`NewSoldierDesignation`]; manager of the soldier's unit; returns 201 |
//! | `DELETE` | `/designations/{id}` | Soft delete; manager of the soldier's unit; 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use redcon_core::{
  designation::{Designation, NewSoldierDesignation, SoldierDesignation},
  store::ReadinessStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{auth::Requester, error::ApiError, params::today, soldiers::visible_soldier};

/// `GET /designations/types`
pub async fn types<S>(
  State(store): State<Arc<S>>,
  _requester: Requester,
) -> Result<Json<Vec<Designation>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  Ok(Json(store.list_designations().await.map_err(ApiError::store)?))
}

/// `POST /designations/types`
pub async fn upsert_type<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<Designation>,
) -> Result<Json<Designation>, ApiError>
where
  S: ReadinessStore + 'static,
{
  requester.require_admin()?;
  if body.designation_type.trim().is_empty() {
    return Err(ApiError::Unprocessable("designation type is empty".into()));
  }
  Ok(Json(store.upsert_designation(body).await.map_err(ApiError::store)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct CurrentOnly {
  #[serde(default)]
  pub current: bool,
}

/// `GET /designations/soldier/{user_id}[?current=true]`
pub async fn for_soldier<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(user_id): Path<String>,
  Query(params): Query<CurrentOnly>,
) -> Result<Json<Vec<SoldierDesignation>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  visible_soldier(store.as_ref(), &requester, &user_id).await?;
  let mut held = store.soldier_designations(&user_id).await.map_err(ApiError::store)?;
  if params.current {
    let today = today();
    held.retain(|d| d.is_active(today));
  }
  Ok(Json(held))
}

/// `POST /designations`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<NewSoldierDesignation>,
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

  let known = store.list_designations().await.map_err(ApiError::store)?;
  if !known.iter().any(|d| d.designation_type == body.designation_type) {
    return Err(ApiError::NotFound(format!(
      "designation type {} not found",
      body.designation_type
    )));
  }
  if let Some(uic) = &body.unit_uic
    && store.get_unit(uic).await.map_err(ApiError::store)?.is_none()
  {
    return Err(ApiError::NotFound(format!("unit {uic} not found")));
  }

  let designation = body.into_designation(today(), Some(requester.user_id().to_owned()))?;
  let designation = store
    .add_soldier_designation(designation)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(designation)))
}

/// `DELETE /designations/{id}`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ReadinessStore + 'static,
{
  let designation = store
    .get_soldier_designation(id)
    .await
    .map_err(ApiError::store)?
    .filter(|d| !d.designation_removed)
    .ok_or_else(|| ApiError::NotFound(format!("designation {id} not found")))?;
  let soldier = store
    .get_soldier(&designation.user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("soldier {} not found", designation.user_id)))?;
  requester.manage_unit(store.as_ref(), &soldier.unit_uic).await?;

  store
    .remove_soldier_designation(id, Some(requester.user_id().to_owned()))
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
