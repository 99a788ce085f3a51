//! Handlers for `/mtoe` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/mtoe/{uic}` | Positions for the unit tree; optional `?fiscal_year=2025` |
//! | `POST` | `/mtoe` | Admin only. Body: [`MtoePosition`]; returns 201 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use redcon_core::{mtoe::MtoePosition, store::ReadinessStore};
use serde::Deserialize;

use crate::{auth::Requester, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub fiscal_year: Option<i32>,
}

/// `GET /mtoe/{uic}[?fiscal_year=2025]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<MtoePosition>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let positions = store
    .list_mtoe(&unit.with_subordinates(), params.fiscal_year)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(positions))
}

/// `POST /mtoe`
pub async fn add<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<MtoePosition>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReadinessStore + 'static,
{
  requester.require_admin()?;
  let position = store.add_mtoe(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(position)))
}
