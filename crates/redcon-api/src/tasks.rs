//! Handlers for `/tasks` endpoints: task records, individual (ICTL) and
//! unit (UCTL) critical task lists, and a soldier's rollup.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/tasks` | Admin only. Body: [`Task`] |
//! | `GET`  | `/tasks/ictl` | `mos=15R,15T`; proponent lists, no unit |
//! | `POST` | `/tasks/ictl` | Body: [`NewIctl`]; admin, or manager of the list's unit; returns 201 |
//! | `GET`  | `/tasks/ictl/{id}` | The list with its task records |
//! | `GET`  | `/tasks/uctl/{uic}` | Lists owned by the unit and its subordinates |
//! | `GET`  | `/tasks/soldier/{user_id}` | [`SoldierTasks`] |

use std::{collections::HashMap, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use redcon_core::{
  store::{EventQuery, IctlQuery, IctlScope, ReadinessStore},
  task::{Ictl, NewIctl, SoldierTasks, Task, TaskInputs, soldier_tasks},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  auth::Requester,
  error::ApiError,
  params::{comma_list, today},
  soldiers::visible_soldier,
};

// ─── Tasks ───────────────────────────────────────────────────────────────────

/// `POST /tasks`. Replaces the task with the same number.
pub async fn upsert_task<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<Task>,
) -> Result<Json<Task>, ApiError>
where
  S: ReadinessStore + 'static,
{
  requester.require_admin()?;
  if body.task_number.trim().is_empty() {
    return Err(ApiError::Unprocessable("task number is empty".into()));
  }
  Ok(Json(store.upsert_task(body).await.map_err(ApiError::store)?))
}

// ─── Lists ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct MosFilter {
  /// Comma-separated MOS codes.
  pub mos: Option<String>,
}

impl MosFilter {
  fn codes(&self) -> Option<Vec<String>> { self.mos.as_deref().map(comma_list) }
}

/// `GET /tasks/ictl[?mos=15R]`
pub async fn list_ictl<S>(
  State(store): State<Arc<S>>,
  _requester: Requester,
  Query(filter): Query<MosFilter>,
) -> Result<Json<Vec<Ictl>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let query = IctlQuery { scope: IctlScope::Proponent, mos: filter.codes() };
  Ok(Json(store.list_ictls(&query).await.map_err(ApiError::store)?))
}

/// `GET /tasks/uctl/{uic}`
pub async fn list_uctl<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(uic): Path<String>,
) -> Result<Json<Vec<Ictl>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let unit = requester.view_unit(store.as_ref(), &uic).await?;
  let query = IctlQuery { scope: IctlScope::Units(unit.with_subordinates()), mos: None };
  Ok(Json(store.list_ictls(&query).await.map_err(ApiError::store)?))
}

#[derive(Debug, Serialize)]
pub struct IctlDetail {
  #[serde(flatten)]
  pub ictl:  Ictl,
  /// Records for the list's task numbers that exist and are not deleted.
  pub tasks: Vec<Task>,
}

/// `GET /tasks/ictl/{id}`
pub async fn get_ictl<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(id): Path<Uuid>,
) -> Result<Json<IctlDetail>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let ictl = store
    .get_ictl(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("task list {id} not found")))?;
  if let Some(uic) = &ictl.unit_uic {
    requester.view_unit(store.as_ref(), uic).await?;
  }
  let mut tasks = store.list_tasks(&ictl.task_numbers).await.map_err(ApiError::store)?;
  tasks.retain(|t| !t.deleted);
  Ok(Json(IctlDetail { ictl, tasks }))
}

/// `POST /tasks/ictl`
pub async fn create_ictl<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<NewIctl>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReadinessStore + 'static,
{
  match &body.unit_uic {
    Some(uic) => {
      requester.manage_unit(store.as_ref(), uic).await?;
    }
    None => requester.require_admin()?,
  }
  if body.title.trim().is_empty() {
    return Err(ApiError::Unprocessable("task list title is empty".into()));
  }

  let known = store.list_tasks(&body.task_numbers).await.map_err(ApiError::store)?;
  if let Some(missing) = body
    .task_numbers
    .iter()
    .find(|n| !known.iter().any(|t| &t.task_number == *n && !t.deleted))
  {
    return Err(ApiError::NotFound(format!("task {missing} not found")));
  }

  let ictl = store.create_ictl(Ictl::from(body)).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(ictl)))
}

// ─── Soldier rollup ──────────────────────────────────────────────────────────

/// `GET /tasks/soldier/{user_id}`
pub async fn for_soldier<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(user_id): Path<String>,
) -> Result<Json<SoldierTasks>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let soldier = visible_soldier(store.as_ref(), &requester, &user_id).await?;
  let units = store.list_units().await.map_err(ApiError::store)?;
  let lineage = units
    .iter()
    .find(|u| u.uic == soldier.unit_uic)
    .map(|u| u.lineage())
    .unwrap_or_else(|| vec![soldier.unit_uic.clone()]);
  let short_names: HashMap<String, String> =
    units.into_iter().map(|u| (u.uic, u.short_name)).collect();

  let held: Vec<String> = soldier
    .primary_mos
    .iter()
    .chain(&soldier.additional_mos)
    .cloned()
    .collect();
  let ictls = store
    .list_ictls(&IctlQuery { scope: IctlScope::Any, mos: Some(held) })
    .await
    .map_err(ApiError::store)?;
  let numbers: Vec<String> = ictls.iter().flat_map(|l| l.task_numbers.iter().cloned()).collect();
  let tasks = store.list_tasks(&numbers).await.map_err(ApiError::store)?;
  let events = store
    .list_events(&EventQuery { user_ids: Some(vec![soldier.user_id.clone()]), ..Default::default() })
    .await
    .map_err(ApiError::store)?;

  Ok(Json(soldier_tasks(TaskInputs {
    soldier:     &soldier,
    lineage:     &lineage,
    ictls:       &ictls,
    tasks:       &tasks,
    events:      &events,
    short_names: &short_names,
    today:       today(),
  })))
}
