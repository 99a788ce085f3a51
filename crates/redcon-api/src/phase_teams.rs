//! Handlers for `/phase_teams/{phase_id}`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/phase_teams/{phase_id}` | Viewer of the aircraft's unit; 404 when no team is set |
//! | `PUT`    | `/phase_teams/{phase_id}` | Body: lead, assistant lead, members; manager of the aircraft's unit |
//! | `DELETE` | `/phase_teams/{phase_id}` | Manager of the aircraft's unit; 204 |
//!
//! `phase_id` must name a phase maintenance event. Every team member must be
//! a known soldier.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use redcon_core::{
  aircraft::{MaintenanceEvent, MaintenanceType},
  phase_team::PhaseTeam,
  store::{ReadinessStore, SoldierQuery},
  unit::Unit,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{auth::Requester, error::ApiError};

#[derive(Debug, Clone, Copy)]
enum Access {
  View,
  Manage,
}

/// The phase event and the unit holding its aircraft, checked for `access`.
async fn phase_unit<S: ReadinessStore>(
  store:     &S,
  requester: &Requester,
  phase_id:  Uuid,
  access:    Access,
) -> Result<(MaintenanceEvent, Unit), ApiError> {
  let phase = store
    .get_maintenance_event(phase_id)
    .await
    .map_err(ApiError::store)?
    .filter(|e| e.maintenance_type == MaintenanceType::Phase)
    .ok_or_else(|| ApiError::NotFound(format!("phase {phase_id} not found")))?;
  let aircraft = store
    .get_aircraft(&phase.serial)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("aircraft {} not found", phase.serial)))?;
  let unit = match access {
    Access::View => requester.view_unit(store, &aircraft.current_unit).await?,
    Access::Manage => requester.manage_unit(store, &aircraft.current_unit).await?,
  };
  Ok((phase, unit))
}

/// `GET /phase_teams/{phase_id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(phase_id): Path<Uuid>,
) -> Result<Json<PhaseTeam>, ApiError>
where
  S: ReadinessStore + 'static,
{
  phase_unit(store.as_ref(), &requester, phase_id, Access::View).await?;
  store
    .get_phase_team(phase_id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("no team for phase {phase_id}")))
}

#[derive(Debug, Deserialize)]
pub struct TeamBody {
  pub phase_lead_user_id:           String,
  pub assistant_phase_lead_user_id: String,
  #[serde(default)]
  pub phase_members:                Vec<String>,
}

/// `PUT /phase_teams/{phase_id}`
pub async fn put<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(phase_id): Path<Uuid>,
  Json(body): Json<TeamBody>,
) -> Result<Json<PhaseTeam>, ApiError>
where
  S: ReadinessStore + 'static,
{
  phase_unit(store.as_ref(), &requester, phase_id, Access::Manage).await?;
  let team = PhaseTeam {
    phase_id,
    phase_lead_user_id: body.phase_lead_user_id,
    assistant_phase_lead_user_id: body.assistant_phase_lead_user_id,
    phase_members: body.phase_members,
  }
  .normalized()?;

  let everyone = team.everyone();
  let found = store
    .list_soldiers(&SoldierQuery { user_ids: Some(everyone.clone()), ..Default::default() })
    .await
    .map_err(ApiError::store)?;
  if let Some(missing) = everyone.iter().find(|id| !found.iter().any(|s| &s.user_id == *id)) {
    return Err(ApiError::NotFound(format!("soldier {missing} not found")));
  }

  let team = store.upsert_phase_team(team).await.map_err(ApiError::store)?;
  Ok(Json(team))
}

/// `DELETE /phase_teams/{phase_id}`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(phase_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ReadinessStore + 'static,
{
  phase_unit(store.as_ref(), &requester, phase_id, Access::Manage).await?;
  if !store.delete_phase_team(phase_id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound(format!("no team for phase {phase_id}")));
  }
  tracing::info!(%phase_id, by = %requester.user_id(), "deleted phase team");
  Ok(StatusCode::NO_CONTENT)
}
