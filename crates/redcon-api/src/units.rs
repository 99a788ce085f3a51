//! Handlers for `/units` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/units` | Units the requester may view |
//! | `GET`  | `/units/{uic}` | Single unit with derived hierarchy |
//! | `POST` | `/units` | Admin only. Body: [`NewUnit`]; returns 201 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use redcon_core::{
  role::can_view_unit,
  store::ReadinessStore,
  unit::{NewUnit, Unit, UnitTree},
};

use crate::{auth::Requester, error::ApiError};

/// `GET /units`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
) -> Result<Json<Vec<Unit>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let mut units = store.list_units().await.map_err(ApiError::store)?;
  units.retain(|u| can_view_unit(&requester.soldier, &requester.roles, u));
  Ok(Json(units))
}

/// `GET /units/{uic}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
) -> Result<Json<Unit>, ApiError>
where
  S: ReadinessStore + 'static,
{
  Ok(Json(requester.view_unit(store.as_ref(), &uic).await?))
}

/// `POST /units`. Replaces an existing unit with the same UIC.
pub async fn upsert<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<NewUnit>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReadinessStore + 'static,
{
  requester.require_admin()?;

  // Surface a cycle as 422 rather than as a storage failure.
  let mut units = store.list_units().await.map_err(ApiError::store)?;
  units.retain(|u| u.uic != body.uic);
  units.push(Unit::from(body.clone()));
  UnitTree::build(units)?;

  let unit = store.upsert_unit(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(unit)))
}
