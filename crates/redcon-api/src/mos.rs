//! Handlers for `/mos` endpoints.

use std::sync::Arc;

use axum::{Json, extract::State};
use redcon_core::{soldier::MosCode, store::ReadinessStore};

use crate::{auth::Requester, error::ApiError};

/// `GET /mos`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  _requester: Requester,
) -> Result<Json<Vec<MosCode>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  Ok(Json(store.list_mos().await.map_err(ApiError::store)?))
}

/// `POST /mos`. Admin only; replaces an existing code.
pub async fn upsert<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<MosCode>,
) -> Result<Json<MosCode>, ApiError>
where
  S: ReadinessStore + 'static,
{
  requester.require_admin()?;
  Ok(Json(store.upsert_mos(body).await.map_err(ApiError::store)?))
}
