//! Handlers for `/roles` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/roles` | The requester's own grants |
//! | `POST`   | `/roles` | Body: [`UserRole`]; manager of the unit; returns 201 |
//! | `DELETE` | `/roles/{user_id}/{uic}` | Manager of the unit; 204, or 404 if absent |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use redcon_core::{role::UserRole, store::ReadinessStore};

use crate::{auth::Requester, error::ApiError};

/// `GET /roles`
pub async fn mine(requester: Requester) -> Json<Vec<UserRole>> {
  Json(requester.roles)
}

/// `POST /roles`. Replaces any existing grant for the same user and unit.
pub async fn grant<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(role): Json<UserRole>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReadinessStore + 'static,
{
  requester.manage_unit(store.as_ref(), &role.unit_uic).await?;
  store
    .get_soldier(&role.user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("soldier {} not found", role.user_id)))?;

  let role = store.grant_role(role).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(role)))
}

/// `DELETE /roles/{user_id}/{uic}`
pub async fn revoke<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path((user_id, uic)): Path<(String, String)>,
) -> Result<StatusCode, ApiError>
where
  S: ReadinessStore + 'static,
{
  requester.manage_unit(store.as_ref(), &uic).await?;
  if !store.revoke_role(&user_id, &uic).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound(format!("no role for {user_id} in {uic}")));
  }
  tracing::info!(%user_id, %uic, by = %requester.user_id(), "revoked role");
  Ok(StatusCode::NO_CONTENT)
}
