//! Handlers for `/requests` endpoints: access requests, soldier transfers,
//! and their adjudication.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/requests/counts` | Pending requests the requester can adjudicate |
//! | `GET`  | `/requests/permission` | Access requests on units the requester manages |
//! | `POST` | `/requests/permission` | Body: [`NewAccessRequest`]; returns 201 |
//! | `POST` | `/requests/permission/adjudicate` | Body: [`Adjudication`]; manager of every unit |
//! | `GET`  | `/requests/transfer` | Transfers `received` into, or `sent` out of, managed units |
//! | `POST` | `/requests/transfer` | Body: [`NewTransferRequest`]; manager of the gaining unit; returns 201 |
//! | `POST` | `/requests/transfer/adjudicate` | Body: [`Adjudication`]; manager of every losing unit |
//!
//! A new request alerts the managers of the unit it affects, plus every
//! admin. Adjudication withdraws that alert and tells the requester.

use std::{collections::HashMap, sync::Arc};

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use redcon_core::{
  notification::{Notice, TransferParties, access_requested, transfer_requested},
  request::{
    AccessRequest, Adjudication, Decision, NewAccessRequest, NewTransferRequest, TransferRequest,
    settle_access, settle_transfers, unit_managers,
  },
  role::can_manage_unit,
  soldier::Soldier,
  store::{ReadinessStore, SoldierQuery},
  unit::Unit,
};
use serde::Serialize;

use crate::{auth::Requester, error::ApiError};

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn units_by_uic<S: ReadinessStore>(store: &S) -> Result<HashMap<String, Unit>, ApiError> {
  Ok(
    store
      .list_units()
      .await
      .map_err(ApiError::store)?
      .into_iter()
      .map(|u| (u.uic.clone(), u))
      .collect(),
  )
}

fn unit_in<'a>(units: &'a HashMap<String, Unit>, uic: &str) -> Result<&'a Unit, ApiError> {
  units.get(uic).ok_or_else(|| ApiError::NotFound(format!("unit {uic} not found")))
}

async fn soldier_named<S: ReadinessStore>(store: &S, user_id: &str) -> Result<Soldier, ApiError> {
  store
    .get_soldier(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("soldier {user_id} not found")))
}

/// Managers of `unit` and its ancestors, plus every admin.
async fn alert_recipients<S: ReadinessStore>(store: &S, unit: &Unit) -> Result<Vec<String>, ApiError> {
  let roles = store.list_roles().await.map_err(ApiError::store)?;
  let admins = store
    .list_soldiers(&SoldierQuery::default())
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .filter(|s| s.is_admin)
    .map(|s| s.user_id);
  Ok(unit_managers(unit, &roles, admins))
}

fn display_in(units: &HashMap<String, Unit>) -> impl Fn(&str) -> String + '_ {
  |uic| units.get(uic).map(|u| u.display_name.clone()).unwrap_or_else(|| uic.to_owned())
}

fn manages(requester: &Requester, units: &HashMap<String, Unit>, uic: &str) -> bool {
  units
    .get(uic)
    .is_some_and(|u| can_manage_unit(&requester.soldier, &requester.roles, u))
}

/// Pending transfers paired with their soldiers. Requests for soldiers that
/// no longer exist are skipped.
async fn transfers_with_soldiers<S: ReadinessStore>(
  store: &S,
) -> Result<Vec<(TransferRequest, Soldier)>, ApiError> {
  let requests = store.list_transfer_requests().await.map_err(ApiError::store)?;
  let ids: Vec<String> = requests.iter().map(|r| r.soldier_id.clone()).collect();
  let soldiers: HashMap<String, Soldier> = store
    .list_soldiers(&SoldierQuery { user_ids: Some(ids), ..Default::default() })
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .map(|s| (s.user_id.clone(), s))
    .collect();
  Ok(
    requests
      .into_iter()
      .filter_map(|r| soldiers.get(&r.soldier_id).cloned().map(|s| (r, s)))
      .collect(),
  )
}

fn check_ids(body: &Adjudication) -> Result<(), ApiError> {
  if body.request_ids.is_empty() {
    return Err(ApiError::BadRequest("request_ids cannot be empty".into()));
  }
  Ok(())
}

// ─── Counts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RequestCounts {
  pub permission_request_count: usize,
  pub transfer_request_count:   usize,
}

/// `GET /requests/counts`
pub async fn counts<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
) -> Result<Json<RequestCounts>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let units = units_by_uic(store.as_ref()).await?;
  let access = store.list_access_requests().await.map_err(ApiError::store)?;
  let transfers = transfers_with_soldiers(store.as_ref()).await?;

  Ok(Json(RequestCounts {
    permission_request_count: access.iter().filter(|r| manages(&requester, &units, &r.unit_uic)).count(),
    transfer_request_count:   transfers
      .iter()
      .filter(|(r, s)| {
        manages(&requester, &units, &r.gaining_uic) || manages(&requester, &units, &s.unit_uic)
      })
      .count(),
  }))
}

// ─── Access requests ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PendingAccess {
  #[serde(flatten)]
  pub request:   AccessRequest,
  pub name:      Option<String>,
  pub unit_name: String,
}

/// `GET /requests/permission`
pub async fn list_permission<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
) -> Result<Json<Vec<PendingAccess>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let units = units_by_uic(store.as_ref()).await?;
  let display = display_in(&units);
  let mut out = Vec::new();
  for request in store.list_access_requests().await.map_err(ApiError::store)? {
    if !manages(&requester, &units, &request.unit_uic) {
      continue;
    }
    let name = store
      .get_soldier(&request.user_id)
      .await
      .map_err(ApiError::store)?
      .map(|s| s.name_and_rank());
    out.push(PendingAccess { unit_name: display(&request.unit_uic), name, request });
  }
  Ok(Json(out))
}

/// `POST /requests/permission`
pub async fn request_permission<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<NewAccessRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReadinessStore + 'static,
{
  let units = units_by_uic(store.as_ref()).await?;
  let unit = unit_in(&units, &body.unit_uic)?;
  let user_id = requester.user_id().to_owned();

  let pending = store.list_access_requests().await.map_err(ApiError::store)?;
  if pending.iter().any(|r| r.user_id == user_id && r.unit_uic == unit.uic) {
    return Err(ApiError::Unprocessable(format!(
      "{user_id} already requested access to {}",
      unit.uic
    )));
  }

  let request = body.into_request(user_id, Utc::now());
  let requester_unit = units.get(&requester.soldier.unit_uic).unwrap_or(unit);
  let alert = access_requested(&request, &requester.soldier, requester_unit, unit);
  let notice = Notice::to(alert, alert_recipients(store.as_ref(), unit).await?);

  let request = store
    .create_access_request(request, notice)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Debug, Serialize)]
pub struct Adjudicated {
  pub processed_count: usize,
  pub message:         String,
}

/// `POST /requests/permission/adjudicate`
pub async fn adjudicate_permission<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<Adjudication>,
) -> Result<Json<Adjudicated>, ApiError>
where
  S: ReadinessStore + 'static,
{
  check_ids(&body)?;
  let units = units_by_uic(store.as_ref()).await?;
  let requests: Vec<AccessRequest> = store
    .list_access_requests()
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .filter(|r| body.request_ids.contains(&r.request_id))
    .collect();
  if requests.is_empty() {
    return Err(ApiError::NotFound("no access requests found with the given ids".into()));
  }
  if let Some(r) = requests.iter().find(|r| !manages(&requester, &units, &r.unit_uic)) {
    return Err(ApiError::Forbidden(format!(
      "user {} does not manage unit {}",
      requester.user_id(),
      r.unit_uic
    )));
  }

  let decision = Decision::from_approved(body.approved);
  let settlement = settle_access(&requests, decision, display_in(&units), Utc::now());
  store.settle_requests(settlement).await.map_err(ApiError::store)?;

  tracing::info!(count = requests.len(), ?decision, by = %requester.user_id(), "adjudicated access requests");
  Ok(Json(Adjudicated {
    processed_count: requests.len(),
    message:         format!(
      "{} {} access request(s)",
      decision.past_tense(),
      requests.len()
    ),
  }))
}

// ─── Transfer requests ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PendingTransfer {
  #[serde(flatten)]
  pub request:      TransferRequest,
  pub name:         String,
  pub losing_uic:   String,
  pub gaining_name: String,
}

#[derive(Debug, Serialize)]
pub struct TransferInbox {
  /// Requests to move a soldier out of a unit the requester manages.
  pub received: Vec<PendingTransfer>,
  /// Requests into a unit the requester manages.
  pub sent:     Vec<PendingTransfer>,
}

/// `GET /requests/transfer`
pub async fn list_transfers<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
) -> Result<Json<TransferInbox>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let units = units_by_uic(store.as_ref()).await?;
  let display = display_in(&units);
  let mut inbox = TransferInbox { received: Vec::new(), sent: Vec::new() };
  for (request, soldier) in transfers_with_soldiers(store.as_ref()).await? {
    let received = manages(&requester, &units, &soldier.unit_uic);
    let sent = manages(&requester, &units, &request.gaining_uic);
    if !received && !sent {
      continue;
    }
    let pending = PendingTransfer {
      name:         soldier.name_and_rank(),
      losing_uic:   soldier.unit_uic,
      gaining_name: display(&request.gaining_uic),
      request,
    };
    if received {
      inbox.received.push(pending);
    } else {
      inbox.sent.push(pending);
    }
  }
  Ok(Json(inbox))
}

/// `POST /requests/transfer`
pub async fn request_transfer<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<NewTransferRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReadinessStore + 'static,
{
  let gaining = requester.manage_unit(store.as_ref(), &body.gaining_uic).await?;
  let units = units_by_uic(store.as_ref()).await?;
  let pending = store.list_transfer_requests().await.map_err(ApiError::store)?;

  let requests = body.into_requests(requester.user_id(), Utc::now());
  let mut resolved = Vec::with_capacity(requests.len());
  for request in requests {
    let soldier = soldier_named(store.as_ref(), &request.soldier_id).await?;
    if soldier.unit_uic == gaining.uic {
      return Err(ApiError::Unprocessable(format!(
        "{} is already assigned to {}",
        soldier.user_id, gaining.uic
      )));
    }
    if pending
      .iter()
      .any(|p| p.soldier_id == soldier.user_id && p.gaining_uic == gaining.uic)
    {
      return Err(ApiError::Unprocessable(format!(
        "{} already has a pending transfer into {}",
        soldier.user_id, gaining.uic
      )));
    }
    resolved.push((request, soldier));
  }

  let requester_unit = units.get(&requester.soldier.unit_uic).unwrap_or(&gaining);
  let mut created = Vec::with_capacity(resolved.len());
  for (request, soldier) in resolved {
    let losing = unit_in(&units, &soldier.unit_uic)?;
    let alert = transfer_requested(&request, TransferParties {
      requester: &requester.soldier,
      requester_unit,
      soldier: &soldier,
      losing_unit: losing,
      gaining_unit: &gaining,
    });
    let notice = Notice::to(alert, alert_recipients(store.as_ref(), losing).await?);
    created.push(
      store
        .create_transfer_request(request, notice)
        .await
        .map_err(ApiError::store)?,
    );
  }
  Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /requests/transfer/adjudicate`
pub async fn adjudicate_transfers<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<Adjudication>,
) -> Result<Json<Adjudicated>, ApiError>
where
  S: ReadinessStore + 'static,
{
  check_ids(&body)?;
  let units = units_by_uic(store.as_ref()).await?;
  let requests: Vec<(TransferRequest, Soldier)> = transfers_with_soldiers(store.as_ref())
    .await?
    .into_iter()
    .filter(|(r, _)| body.request_ids.contains(&r.request_id))
    .collect();
  if requests.is_empty() {
    return Err(ApiError::NotFound("no transfer requests found with the given ids".into()));
  }
  if let Some((_, s)) = requests.iter().find(|(_, s)| !manages(&requester, &units, &s.unit_uic)) {
    return Err(ApiError::Forbidden(format!(
      "user {} does not manage unit {}",
      requester.user_id(),
      s.unit_uic
    )));
  }

  let decision = Decision::from_approved(body.approved);
  let settlement = settle_transfers(&requests, decision, display_in(&units), Utc::now());
  store.settle_requests(settlement).await.map_err(ApiError::store)?;

  tracing::info!(count = requests.len(), ?decision, by = %requester.user_id(), "adjudicated transfers");
  Ok(Json(Adjudicated {
    processed_count: requests.len(),
    message:         format!("{} {} transfer request(s)", decision.past_tense(), requests.len()),
  }))
}
