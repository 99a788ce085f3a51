//! Access and transfer requests, and how adjudicating them settles.
//!
//! An access request asks for a role on a unit; the unit's managers decide
//! it. A transfer request asks for a soldier to move into the requester's
//! (gaining) unit; the managers of the soldier's current unit decide it.
//! Either way the requester is told the outcome and the request is removed.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::{
  notification::{Notice, decided},
  role::{AccessLevel, UserRole},
  soldier::Soldier,
  unit::Unit,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum RequestKind {
  #[strum(to_string = "Access Request")]
  AccessRequest,
  #[strum(to_string = "Transfer Request")]
  TransferRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
  Approved,
  Denied,
}

impl Decision {
  pub fn from_approved(approved: bool) -> Self {
    if approved { Self::Approved } else { Self::Denied }
  }

  pub fn past_tense(self) -> &'static str {
    match self {
      Self::Approved => "approved",
      Self::Denied => "denied",
    }
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// A pending request for `access_level` on `unit_uic`. Unique per
/// (user, unit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRequest {
  pub request_id:   Uuid,
  pub user_id:      String,
  pub unit_uic:     String,
  pub access_level: AccessLevel,
  pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccessRequest {
  pub unit_uic:     String,
  #[serde(default = "default_level")]
  pub access_level: AccessLevel,
}

fn default_level() -> AccessLevel { AccessLevel::Viewer }

impl NewAccessRequest {
  pub fn into_request(self, user_id: String, at: DateTime<Utc>) -> AccessRequest {
    AccessRequest {
      request_id:   Uuid::new_v4(),
      user_id,
      unit_uic:     self.unit_uic,
      access_level: self.access_level,
      requested_at: at,
    }
  }
}

/// A pending request to move `soldier_id` into `gaining_uic`. Unique per
/// (soldier, gaining unit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
  pub request_id:   Uuid,
  pub requester_id: String,
  pub soldier_id:   String,
  pub gaining_uic:  String,
  pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTransferRequest {
  pub soldier_ids: Vec<String>,
  pub gaining_uic: String,
}

impl NewTransferRequest {
  pub fn into_requests(self, requester_id: &str, at: DateTime<Utc>) -> Vec<TransferRequest> {
    let unique: BTreeSet<String> = self.soldier_ids.into_iter().collect();
    unique
      .into_iter()
      .map(|soldier_id| TransferRequest {
        request_id: Uuid::new_v4(),
        requester_id: requester_id.to_owned(),
        soldier_id,
        gaining_uic: self.gaining_uic.clone(),
        requested_at: at,
      })
      .collect()
  }
}

/// Body of an adjudication: every listed request gets the same decision.
#[derive(Debug, Clone, Deserialize)]
pub struct Adjudication {
  pub request_ids: Vec<Uuid>,
  pub approved:    bool,
}

/// Who is alerted about a request on `unit`: holders of a Manager or Admin
/// role anywhere in its lineage, plus `admins`.
pub fn unit_managers(
  unit:   &Unit,
  roles:  &[UserRole],
  admins: impl IntoIterator<Item = String>,
) -> Vec<String> {
  let lineage = unit.lineage();
  let mut out: BTreeSet<String> = roles
    .iter()
    .filter(|r| {
      matches!(r.access_level, AccessLevel::Admin | AccessLevel::Manager)
        && lineage.contains(&r.unit_uic)
    })
    .map(|r| r.user_id.clone())
    .collect();
  out.extend(admins);
  out.into_iter().collect()
}

// ─── Settlement ──────────────────────────────────────────────────────────────

/// Everything an adjudication writes, applied by the store in one
/// transaction: settled requests are deleted (withdrawing the notifications
/// about them), approved grants and transfers are written, and the
/// requesters are notified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settlement {
  pub access_requests:   Vec<Uuid>,
  pub transfer_requests: Vec<Uuid>,
  pub grants:            Vec<UserRole>,
  /// Soldiers already moved to their gaining unit. Every pending transfer
  /// request for these soldiers is removed with them.
  pub transfers:         Vec<Soldier>,
  pub effective_at:      DateTime<Utc>,
  pub notices:           Vec<Notice>,
}

/// Settle access requests. `display` names a unit for the requester's
/// notification.
pub fn settle_access<F>(
  requests: &[AccessRequest],
  decision: Decision,
  display:  F,
  at:       DateTime<Utc>,
) -> Settlement
where
  F: Fn(&str) -> String,
{
  let mut out = Settlement { effective_at: at, ..Default::default() };
  for r in requests {
    out.access_requests.push(r.request_id);
    if decision == Decision::Approved {
      out.grants.push(UserRole {
        user_id:      r.user_id.clone(),
        unit_uic:     r.unit_uic.clone(),
        access_level: r.access_level,
      });
    }
    let action = format!("{} role in {}", r.access_level, display(&r.unit_uic));
    out.notices.push(Notice::to(
      decided(RequestKind::AccessRequest, action, decision, at),
      [r.user_id.clone()],
    ));
  }
  out
}

/// Settle transfer requests, each paired with the soldier it names.
pub fn settle_transfers<F>(
  requests: &[(TransferRequest, Soldier)],
  decision: Decision,
  display:  F,
  at:       DateTime<Utc>,
) -> Settlement
where
  F: Fn(&str) -> String,
{
  let mut out = Settlement { effective_at: at, ..Default::default() };
  let mut moved = BTreeSet::new();
  for (r, soldier) in requests {
    out.transfer_requests.push(r.request_id);
    // A soldier can only move once per settlement; later requests for the
    // same soldier are settled as superseded.
    if decision == Decision::Approved && moved.insert(soldier.user_id.clone()) {
      out.transfers.push(Soldier { unit_uic: r.gaining_uic.clone(), ..soldier.clone() });
    }
    let action = format!("{} to {}", soldier.name_and_rank(), display(&r.gaining_uic));
    out.notices.push(Notice::to(
      decided(RequestKind::TransferRequest, action, decision, at),
      [r.requester_id.clone()],
    ));
  }
  out
}
