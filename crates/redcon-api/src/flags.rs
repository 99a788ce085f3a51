//! Handlers for `/flags` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/flags/soldier/{user_id}` | Soldier's own flags plus flags on any unit in their lineage |
//! | `GET`    | `/flags/unit/{uic}` | Flags on the unit tree and on soldiers assigned to it |
//! | `POST`   | `/flags` | Body: [`NewFlag`]; returns 201 |
//! | `PUT`    | `/flags/{id}` | Body: [`FlagUpdate`] |
//! | `DELETE` | `/flags/{id}` | Soft delete; 204 |
//!
//! Writes need manager access to the flagged unit, or to the flagged
//! soldier's unit.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use redcon_core::{
  flag::{FlagUpdate, NewFlag, SoldierFlag, flag_info_label},
  store::{FlagQuery, ReadinessStore, SoldierQuery},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{auth::Requester, error::ApiError, params::today, soldiers::visible_soldier};

// ─── Output ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct FlagOut {
  #[serde(flatten)]
  pub flag:      SoldierFlag,
  /// Display text for the flag, see [`flag_info_label`].
  pub flag_info: Option<String>,
  /// `"Active"` or `"Inactive"` as of today.
  pub status:    &'static str,
}

impl FlagOut {
  fn new(flag: SoldierFlag) -> Self {
    let status = if flag.is_active(today()) { "Active" } else { "Inactive" };
    FlagOut { flag_info: flag_info_label(&flag), status, flag }
  }
}

#[derive(Debug, Serialize)]
pub struct SoldierFlags {
  pub individual_flags: Vec<FlagOut>,
  pub unit_flags:       Vec<FlagOut>,
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /flags/soldier/{user_id}`
pub async fn for_soldier<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(user_id): Path<String>,
) -> Result<Json<SoldierFlags>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let soldier = visible_soldier(store.as_ref(), &requester, &user_id).await?;
  let lineage = store
    .get_unit(&soldier.unit_uic)
    .await
    .map_err(ApiError::store)?
    .map(|u| u.lineage())
    .unwrap_or_else(|| vec![soldier.unit_uic.clone()]);

  let query = FlagQuery {
    user_ids: Some(vec![soldier.user_id.clone()]),
    unit_uics: Some(lineage),
    ..Default::default()
  };
  let flags = store.list_flags(&query).await.map_err(ApiError::store)?;

  let (individual, unit): (Vec<_>, Vec<_>) = flags.into_iter().partition(|f| f.user_id.is_some());
  Ok(Json(SoldierFlags {
    individual_flags: individual.into_iter().map(FlagOut::new).collect(),
    unit_flags:       unit.into_iter().map(FlagOut::new).collect(),
  }))
}

/// `GET /flags/unit/{uic}`
pub async fn for_unit<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
) -> Result<Json<Vec<FlagOut>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let scope = unit.with_subordinates();
  let soldiers = store
    .list_soldiers(&SoldierQuery { unit_uics: Some(scope.clone()), ..Default::default() })
    .await
    .map_err(ApiError::store)?;

  let query = FlagQuery {
    user_ids: Some(soldiers.into_iter().map(|s| s.user_id).collect()),
    unit_uics: Some(scope),
    ..Default::default()
  };
  let flags = store.list_flags(&query).await.map_err(ApiError::store)?;
  Ok(Json(flags.into_iter().map(FlagOut::new).collect()))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// The unit whose managers may edit `flag`.
async fn owning_unit<S: ReadinessStore>(
  store:   &S,
  user_id: Option<&str>,
  unit:    Option<&str>,
) -> Result<String, ApiError> {
  if let Some(uic) = unit {
    return Ok(uic.to_owned());
  }
  let user_id = user_id.ok_or_else(|| ApiError::Unprocessable("flag has no target".into()))?;
  let soldier = store
    .get_soldier(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("soldier {user_id} not found")))?;
  Ok(soldier.unit_uic)
}

async fn live_flag<S: ReadinessStore>(store: &S, id: Uuid) -> Result<SoldierFlag, ApiError> {
  store
    .get_flag(id)
    .await
    .map_err(ApiError::store)?
    .filter(|f| !f.flag_deleted)
    .ok_or_else(|| ApiError::NotFound(format!("flag {id} not found")))
}

/// `POST /flags`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<NewFlag>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReadinessStore + 'static,
{
  body.validate()?;
  let uic = owning_unit(store.as_ref(), body.user_id.as_deref(), body.unit_uic.as_deref()).await?;
  requester.manage_unit(store.as_ref(), &uic).await?;

  let flag = body.into_flag(Some(requester.user_id().to_owned()));
  let flag = store.create_flag(flag).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(FlagOut::new(flag))))
}

/// `PUT /flags/{id}`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(id): Path<Uuid>,
  Json(body): Json<FlagUpdate>,
) -> Result<Json<FlagOut>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let mut flag = live_flag(store.as_ref(), id).await?;
  let uic = owning_unit(store.as_ref(), flag.user_id.as_deref(), flag.unit_uic.as_deref()).await?;
  requester.manage_unit(store.as_ref(), &uic).await?;

  body.apply(&mut flag, Some(requester.user_id().to_owned()))?;
  let flag = store.update_flag(flag).await.map_err(ApiError::store)?;
  Ok(Json(FlagOut::new(flag)))
}

/// `DELETE /flags/{id}`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ReadinessStore + 'static,
{
  let flag = live_flag(store.as_ref(), id).await?;
  let uic = owning_unit(store.as_ref(), flag.user_id.as_deref(), flag.unit_uic.as_deref()).await?;
  requester.manage_unit(store.as_ref(), &uic).await?;

  store
    .delete_flag(id, Some(requester.user_id().to_owned()))
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
