//! Readiness events (evaluations, training, awards) and their task results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::soldier::MaintenanceLevel;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString,
  AsRefStr, Display,
)]
pub enum EventType {
  Evaluation,
  Training,
  Award,
  RecordsReview,
  Other,
}

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
  EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum GoNoGo {
  Go,
  NoGo,
  #[default]
  Na,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTask {
  pub task_number: String,
  pub task_name:   Option<String>,
  #[serde(default)]
  pub go_nogo:     GoNoGo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub event_id:          Uuid,
  pub user_id:           String,
  pub date:              NaiveDate,
  pub uic:               Option<String>,
  pub event_type:        EventType,
  pub evaluation_type:   Option<String>,
  pub training_type:     Option<String>,
  pub award_type:        Option<String>,
  pub mos:               Option<String>,
  pub go_nogo:           Option<GoNoGo>,
  pub total_mx_hours:    Option<f64>,
  pub comment:           String,
  pub maintenance_level: Option<MaintenanceLevel>,
  pub recorded_by:       Option<String>,
  pub event_deleted:     bool,
  pub tasks:             Vec<EventTask>,
}

impl Event {
  /// A passed evaluation; the only kind that resets the evaluation clock.
  pub fn is_go_evaluation(&self) -> bool {
    !self.event_deleted
      && self.event_type == EventType::Evaluation
      && self.go_nogo == Some(GoNoGo::Go)
  }
}

/// Body accepted when recording an event.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
  pub user_id:           String,
  pub date:              NaiveDate,
  pub uic:               Option<String>,
  pub event_type:        EventType,
  pub evaluation_type:   Option<String>,
  pub training_type:     Option<String>,
  pub award_type:        Option<String>,
  pub mos:               Option<String>,
  pub go_nogo:           Option<GoNoGo>,
  pub total_mx_hours:    Option<f64>,
  #[serde(default)]
  pub comment:           String,
  pub maintenance_level: Option<MaintenanceLevel>,
  #[serde(default)]
  pub tasks:             Vec<EventTask>,
}

impl NewEvent {
  pub fn into_event(self, recorded_by: Option<String>) -> Event {
    Event {
      event_id:          Uuid::new_v4(),
      user_id:           self.user_id,
      date:              self.date,
      uic:               self.uic,
      event_type:        self.event_type,
      evaluation_type:   self.evaluation_type,
      training_type:     self.training_type,
      award_type:        self.award_type,
      mos:               self.mos,
      go_nogo:           self.go_nogo,
      total_mx_hours:    self.total_mx_hours,
      comment:           self.comment,
      maintenance_level: self.maintenance_level,
      recorded_by,
      event_deleted:     false,
      tasks:             self.tasks,
    }
  }
}

/// The newest non-deleted event for which `pick` holds. Ties on date go to
/// the later entry in `events`.
pub fn latest_where<'a, F>(events: &'a [Event], pick: F) -> Option<&'a Event>
where
  F: Fn(&Event) -> bool,
{
  events
    .iter()
    .filter(|e| !e.event_deleted && pick(e))
    .max_by_key(|e| e.date)
}

#[cfg(test)]
mod tests {
  use chrono::Datelike;

  use super::*;

  fn event(day: u32, deleted: bool, comment: &str) -> Event {
    let mut event = NewEvent {
      user_id:           "1".into(),
      date:              NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
      uic:               None,
      event_type:        EventType::Training,
      evaluation_type:   None,
      training_type:     None,
      award_type:        None,
      mos:               None,
      go_nogo:           None,
      total_mx_hours:    None,
      comment:           comment.into(),
      maintenance_level: None,
      tasks:             vec![],
    }
    .into_event(None);
    event.event_deleted = deleted;
    event
  }

  #[test]
  fn latest_skips_deleted_and_breaks_ties_by_position() {
    let events = vec![
      event(1, false, "first"),
      event(5, false, "tie a"),
      event(5, false, "tie b"),
      event(9, true, "deleted"),
    ];
    let latest = latest_where(&events, |_| true).unwrap();
    assert_eq!(latest.comment, "tie b");

    let early = latest_where(&events, |e| e.date.day() < 5).unwrap();
    assert_eq!(early.comment, "first");
    assert!(latest_where(&events, |e| e.date.day() > 9).is_none());
  }
}
