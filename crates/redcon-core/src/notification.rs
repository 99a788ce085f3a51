//! Per-soldier notifications.
//!
//! A [`Notification`] is created once and delivered to any number of
//! soldiers; each delivery carries its own read state. Notifications about a
//! pending request name that request, and are withdrawn when it is settled.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  request::{AccessRequest, Decision, RequestKind, TransferRequest},
  role::{AccessLevel, UserRole},
  soldier::Soldier,
  unit::Unit,
};

// ─── Content ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationContent {
  AccessRequest {
    requester:      String,
    requester_unit: String,
    unit:           String,
    access_level:   AccessLevel,
  },
  TransferRequest {
    requester:      String,
    requester_unit: String,
    soldier:        String,
    losing_unit:    String,
    gaining_unit:   String,
    gaining_short:  String,
  },
  Decision {
    request_type:   RequestKind,
    request_action: String,
    decision:       Decision,
  },
  Release {
    version: String,
    notes:   String,
    url:     Option<String>,
  },
  Announcement {
    title:        String,
    announcement: String,
    url:          Option<String>,
  },
  Bugfix {
    bugfix:  String,
    details: String,
    url:     Option<String>,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub date_generated:  DateTime<Utc>,
  /// The pending request this notification is about, if any.
  pub request_id:      Option<Uuid>,
  pub content:         NotificationContent,
}

impl Notification {
  pub fn new(content: NotificationContent, date_generated: DateTime<Utc>) -> Self {
    Notification { notification_id: Uuid::new_v4(), date_generated, request_id: None, content }
  }

  pub fn about(mut self, request_id: Uuid) -> Self {
    self.request_id = Some(request_id);
    self
  }

  /// One-line summary, used as a title.
  pub fn short_display(&self) -> String {
    use NotificationContent as C;
    match &self.content {
      C::AccessRequest { requester, access_level, .. } => {
        format!("{requester} requests {access_level} access")
      }
      C::TransferRequest { gaining_short, soldier, .. } => format!("{gaining_short} requests {soldier}"),
      C::Decision { request_type, decision, .. } => format!("{request_type} {}", decision.past_tense()),
      C::Release { version, .. } => format!("Release Version {version}"),
      C::Announcement { title, .. } => title.clone(),
      C::Bugfix { bugfix, .. } => format!("Bugfix: {bugfix}"),
    }
  }

  pub fn verbose_display(&self) -> String {
    use NotificationContent as C;
    match &self.content {
      C::AccessRequest { requester, requester_unit, unit, access_level } => {
        format!("{requester} ({requester_unit}) requests {access_level} role for {unit}")
      }
      C::TransferRequest { requester, requester_unit, soldier, losing_unit, gaining_unit, .. } => format!(
        "{requester} ({requester_unit}) requests {soldier} be released from {losing_unit} and \
         transferred into {gaining_unit}"
      ),
      C::Decision { request_type, request_action, decision } => format!(
        "Your {request_type} for {request_action} has been {}",
        decision.past_tense()
      ),
      C::Release { notes, .. } => notes.clone(),
      C::Announcement { announcement, .. } => announcement.clone(),
      C::Bugfix { details, .. } => details.clone(),
    }
  }
}

// ─── Builders ────────────────────────────────────────────────────────────────

/// Alert for the managers of `unit` that `requester` wants a role there.
pub fn access_requested(
  request:        &AccessRequest,
  requester:      &Soldier,
  requester_unit: &Unit,
  unit:           &Unit,
) -> Notification {
  Notification::new(
    NotificationContent::AccessRequest {
      requester:      requester.name_and_rank(),
      requester_unit: requester_unit.display_name.clone(),
      unit:           unit.display_name.clone(),
      access_level:   request.access_level,
    },
    request.requested_at,
  )
  .about(request.request_id)
}

/// The parties to a transfer request, resolved for display.
pub struct TransferParties<'a> {
  pub requester:      &'a Soldier,
  pub requester_unit: &'a Unit,
  pub soldier:        &'a Soldier,
  pub losing_unit:    &'a Unit,
  pub gaining_unit:   &'a Unit,
}

/// Alert for the managers of the losing unit.
pub fn transfer_requested(request: &TransferRequest, parties: TransferParties<'_>) -> Notification {
  Notification::new(
    NotificationContent::TransferRequest {
      requester:      parties.requester.name_and_rank(),
      requester_unit: parties.requester_unit.display_name.clone(),
      soldier:        parties.soldier.name_and_rank(),
      losing_unit:    parties.losing_unit.display_name.clone(),
      gaining_unit:   parties.gaining_unit.display_name.clone(),
      gaining_short:  parties.gaining_unit.short_name.clone(),
    },
    request.requested_at,
  )
  .about(request.request_id)
}

/// Tell a requester how their request was decided.
pub fn decided(
  kind:     RequestKind,
  action:   impl Into<String>,
  decision: Decision,
  at:       DateTime<Utc>,
) -> Notification {
  Notification::new(
    NotificationContent::Decision { request_type: kind, request_action: action.into(), decision },
    at,
  )
}

// ─── Delivery ────────────────────────────────────────────────────────────────

/// A notification together with the soldiers it is delivered to.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
  pub notification: Notification,
  pub recipients:   Vec<String>,
}

impl Notice {
  pub fn to(notification: Notification, recipients: impl IntoIterator<Item = String>) -> Self {
    let recipients: BTreeSet<String> = recipients.into_iter().collect();
    Notice { notification, recipients: recipients.into_iter().collect() }
  }
}

/// One soldier's copy of a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoldierNotification {
  pub user_id:      String,
  #[serde(flatten)]
  pub notification: Notification,
  pub read:         bool,
}

/// Who receives a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
  #[default]
  All,
  /// Holders of a Manager role anywhere.
  Managers,
  /// Anyone who can enter records: every role except Viewer.
  Recorders,
}

impl Audience {
  /// Pick recipients from every soldier and every role grant.
  pub fn recipients(self, soldiers: &[Soldier], roles: &[UserRole]) -> Vec<String> {
    let holders = |keep: fn(AccessLevel) -> bool| -> BTreeSet<String> {
      roles
        .iter()
        .filter(|r| keep(r.access_level))
        .map(|r| r.user_id.clone())
        .collect()
    };
    let wanted = match self {
      Audience::All => return soldiers.iter().map(|s| s.user_id.clone()).collect(),
      Audience::Managers => holders(|l| l == AccessLevel::Manager),
      Audience::Recorders => holders(|l| l != AccessLevel::Viewer),
    };
    soldiers
      .iter()
      .filter(|s| wanted.contains(&s.user_id))
      .map(|s| s.user_id.clone())
      .collect()
  }
}

/// Body of an admin broadcast.
#[derive(Debug, Clone, Deserialize)]
pub struct Broadcast {
  #[serde(default)]
  pub audience: Audience,
  #[serde(flatten)]
  pub content:  NotificationContent,
}

impl Broadcast {
  /// Only release, announcement and bugfix notices may be broadcast.
  pub fn is_broadcastable(&self) -> bool {
    matches!(
      self.content,
      NotificationContent::Release { .. }
        | NotificationContent::Announcement { .. }
        | NotificationContent::Bugfix { .. }
    )
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::soldier::{BirthMonth, NewSoldier};

  fn soldier(id: &str) -> Soldier {
    Soldier::from(NewSoldier {
      user_id:        id.into(),
      rank:           "SGT".into(),
      first_name:     "Pat".into(),
      last_name:      format!("Doe{id}"),
      primary_mos:    None,
      additional_mos: vec![],
      asi_codes:      vec![],
      unit_uic:       "BN".into(),
      is_admin:       false,
      is_maintainer:  true,
      dod_email:      None,
      birth_month:    BirthMonth::Unk,
      reporting_ml:   None,
    })
  }

  fn role(user: &str, level: AccessLevel) -> UserRole {
    UserRole { user_id: user.into(), unit_uic: "BN".into(), access_level: level }
  }

  #[test]
  fn decision_text_names_the_request() {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let n = decided(RequestKind::AccessRequest, "Manager role in Alpha", Decision::Denied, at);
    assert_eq!(n.short_display(), "Access Request denied");
    assert_eq!(n.verbose_display(), "Your Access Request for Manager role in Alpha has been denied");
    assert_eq!(n.request_id, None);
  }

  #[test]
  fn audiences_filter_by_role() {
    let soldiers = vec![soldier("1"), soldier("2"), soldier("3")];
    let roles = vec![
      role("1", AccessLevel::Manager),
      role("2", AccessLevel::Viewer),
      role("3", AccessLevel::Evaluator),
      role("9", AccessLevel::Manager),
    ];
    assert_eq!(Audience::All.recipients(&soldiers, &roles), vec!["1", "2", "3"]);
    assert_eq!(Audience::Managers.recipients(&soldiers, &roles), vec!["1"]);
    assert_eq!(Audience::Recorders.recipients(&soldiers, &roles), vec!["1", "3"]);
  }

  #[test]
  fn notice_recipients_are_deduplicated() {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let n = Notification::new(
      NotificationContent::Announcement { title: "Down".into(), announcement: "x".into(), url: None },
      at,
    );
    let notice = Notice::to(n, ["2".to_owned(), "1".to_owned(), "2".to_owned()]);
    assert_eq!(notice.recipients, vec!["1", "2"]);
  }

  #[test]
  fn only_bulletins_can_be_broadcast() {
    let body: Broadcast = serde_json::from_value(serde_json::json!({
      "audience": "managers",
      "kind": "release",
      "version": "2.1",
      "notes": "New charts",
    }))
    .unwrap();
    assert!(body.is_broadcastable());
    assert_eq!(body.audience, Audience::Managers);

    let body: Broadcast = serde_json::from_value(serde_json::json!({
      "kind": "decision",
      "request_type": "AccessRequest",
      "request_action": "x",
      "decision": "approved",
    }))
    .unwrap();
    assert!(!body.is_broadcastable());
  }
}
