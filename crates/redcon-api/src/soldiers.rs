//! Handlers for `/soldiers` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/soldiers` | `?uic` required; optional `maintainers_only`. Includes subordinate units |
//! | `GET`  | `/soldiers/{user_id}` | Single soldier |
//! | `GET`  | `/soldiers/{user_id}/history` | Every snapshot, oldest first |
//! | `POST` | `/soldiers` | Body: [`SoldierBody`]; manager of the target unit; returns 201 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use redcon_core::{
  soldier::{NewSoldier, Soldier, SoldierSnapshot},
  store::{ReadinessStore, SoldierQuery},
};
use serde::Deserialize;

use crate::{auth::Requester, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub uic:              String,
  #[serde(default)]
  pub maintainers_only: bool,
}

/// `GET /soldiers?uic=<uic>[&maintainers_only=true]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Soldier>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let unit = requester.view_unit(store.as_ref(), &params.uic).await?;
  let query = SoldierQuery {
    unit_uics:        Some(unit.with_subordinates()),
    maintainers_only: params.maintainers_only,
    ..Default::default()
  };
  let soldiers = store.list_soldiers(&query).await.map_err(ApiError::store)?;
  Ok(Json(soldiers))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// Load a soldier the requester may see: themselves, or anyone in a unit
/// they can view.
pub(crate) async fn visible_soldier<S: ReadinessStore>(
  store:     &S,
  requester: &Requester,
  user_id:   &str,
) -> Result<Soldier, ApiError> {
  let soldier = store
    .get_soldier(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("soldier {user_id} not found")))?;
  if soldier.user_id != requester.user_id() {
    requester.view_unit(store, &soldier.unit_uic).await?;
  }
  Ok(soldier)
}

/// `GET /soldiers/{user_id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(user_id): Path<String>,
) -> Result<Json<Soldier>, ApiError>
where
  S: ReadinessStore + 'static,
{
  Ok(Json(visible_soldier(store.as_ref(), &requester, &user_id).await?))
}

/// `GET /soldiers/{user_id}/history`
pub async fn history<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(user_id): Path<String>,
) -> Result<Json<Vec<SoldierSnapshot>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  visible_soldier(store.as_ref(), &requester, &user_id).await?;
  let history = store.history_for(&user_id).await.map_err(ApiError::store)?;
  Ok(Json(history))
}

// ─── Upsert ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /soldiers`.
#[derive(Debug, Deserialize)]
pub struct SoldierBody {
  #[serde(flatten)]
  pub soldier:      NewSoldier,
  /// When the change took effect. Defaults to now; backdating lets a late
  /// transfer land in the right reporting period.
  pub effective_at: Option<DateTime<Utc>>,
}

/// `POST /soldiers`
pub async fn upsert<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<SoldierBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReadinessStore + 'static,
{
  let soldier = Soldier::from(body.soldier);
  requester.manage_unit(store.as_ref(), &soldier.unit_uic).await?;

  // A transfer also needs the losing unit's manager.
  let current = store.get_soldier(&soldier.user_id).await.map_err(ApiError::store)?;
  if let Some(current) = current
    && current.unit_uic != soldier.unit_uic
  {
    requester.manage_unit(store.as_ref(), &current.unit_uic).await?;
  }
  if soldier.is_admin && !requester.soldier.is_admin {
    return Err(ApiError::Forbidden("only admins may grant admin".into()));
  }

  let effective_at = body.effective_at.unwrap_or_else(Utc::now);
  let stored = store
    .upsert_soldier(soldier, effective_at)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user_id = %stored.user_id, by = %requester.user_id(), "soldier saved");
  Ok((StatusCode::CREATED, Json(stored)))
}
