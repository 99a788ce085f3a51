//! Individual and unit critical task lists (ICTLs and UCTLs).
//!
//! An ICTL groups tasks for one or more MOS codes. An ICTL that names a unit
//! is that unit's UCTL and applies to soldiers anywhere beneath it. Only
//! approved lists count toward a soldier's critical tasks.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  event::{Event, EventType, latest_where},
  soldier::Soldier,
};

pub const APPROVED: &str = "Approved";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ictl {
  pub ictl_id:         Uuid,
  pub title:           String,
  pub date_published:  NaiveDate,
  pub proponent:       Option<String>,
  /// Set for a unit's UCTL.
  pub unit_uic:        Option<String>,
  pub status:          Option<String>,
  pub skill_level:     Option<String>,
  pub mos:             Vec<String>,
  pub target_audience: Option<String>,
  pub task_numbers:    Vec<String>,
}

impl Ictl {
  pub fn is_approved(&self) -> bool { self.status.as_deref() == Some(APPROVED) }

  pub fn is_uctl(&self) -> bool { self.unit_uic.is_some() }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIctl {
  pub title:           String,
  pub date_published:  NaiveDate,
  pub proponent:       Option<String>,
  pub unit_uic:        Option<String>,
  pub status:          Option<String>,
  pub skill_level:     Option<String>,
  #[serde(default)]
  pub mos:             Vec<String>,
  pub target_audience: Option<String>,
  #[serde(default)]
  pub task_numbers:    Vec<String>,
}

impl From<NewIctl> for Ictl {
  fn from(n: NewIctl) -> Self {
    Ictl {
      ictl_id:         Uuid::new_v4(),
      title:           n.title,
      date_published:  n.date_published,
      proponent:       n.proponent,
      unit_uic:        n.unit_uic,
      status:          n.status,
      skill_level:     n.skill_level,
      mos:             n.mos,
      target_audience: n.target_audience,
      task_numbers:    n.task_numbers,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub task_number:       String,
  pub task_title:        String,
  pub pdf_url:           Option<String>,
  /// The unit that wrote the task, for unit-specific tasks.
  pub unit_uic:          Option<String>,
  pub training_location: Option<String>,
  /// `"Annually"` or `"Semi-annually"` set a due date.
  pub frequency:         Option<String>,
  pub subject_area:      Option<String>,
  #[serde(default)]
  pub deleted:           bool,
}

impl Task {
  /// Days between completions, if the frequency is one that recurs.
  pub fn cycle_days(&self) -> Option<i64> {
    match self.frequency.as_deref() {
      Some("Annually") => Some(365),
      Some("Semi-annually") => Some(180),
      _ => None,
    }
  }
}

// ─── Soldier rollup ──────────────────────────────────────────────────────────

/// One task on one of a soldier's lists, with their latest completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalTask {
  pub ictl_id:           Uuid,
  pub ictl_title:        String,
  /// Owning unit's short name for a UCTL, otherwise the proponent.
  pub ictl_proponent:    Option<String>,
  pub skill_level:       Option<String>,
  /// The list's MOS codes the soldier holds.
  pub mos:               Vec<String>,
  pub task_number:       String,
  pub task_title:        String,
  pub frequency:         Option<String>,
  pub subject_area:      Option<String>,
  pub document_link:     Option<String>,
  pub last_trained:      Option<NaiveDate>,
  pub last_trained_id:   Option<Uuid>,
  pub last_evaluated:    Option<NaiveDate>,
  pub last_evaluated_id: Option<Uuid>,
  /// Days until the task is due again; negative when overdue.
  pub next_due:          Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoldierTasks {
  pub ictl: Vec<CriticalTask>,
  pub uctl: Vec<CriticalTask>,
}

/// Inputs to [`soldier_tasks`].
pub struct TaskInputs<'a> {
  pub soldier:     &'a Soldier,
  /// The soldier's unit followed by its ancestors.
  pub lineage:     &'a [String],
  pub ictls:       &'a [Ictl],
  pub tasks:       &'a [Task],
  /// The soldier's events.
  pub events:      &'a [Event],
  pub short_names: &'a HashMap<String, String>,
  pub today:       NaiveDate,
}

/// The soldier's ICTL and UCTL tasks. A list applies when it is approved and
/// shares an MOS with the soldier; UCTLs must also belong to a unit in the
/// soldier's lineage. Rows are ordered by skill level, then list title.
pub fn soldier_tasks(inputs: TaskInputs<'_>) -> SoldierTasks {
  let soldier = inputs.soldier;
  let held: BTreeSet<&str> = soldier
    .primary_mos
    .iter()
    .chain(soldier.additional_mos.iter())
    .map(String::as_str)
    .collect();
  let tasks: HashMap<&str, &Task> = inputs
    .tasks
    .iter()
    .filter(|t| !t.deleted)
    .map(|t| (t.task_number.as_str(), t))
    .collect();

  let latest = |kind: EventType, number: &str| {
    latest_where(inputs.events, |e| {
      e.user_id == soldier.user_id
        && e.event_type == kind
        && e.tasks.iter().any(|t| t.task_number == number)
    })
  };

  let mut out = SoldierTasks::default();
  for ictl in inputs.ictls.iter().filter(|i| i.is_approved()) {
    let mos: Vec<String> = ictl.mos.iter().filter(|m| held.contains(m.as_str())).cloned().collect();
    if mos.is_empty() {
      continue;
    }
    let list = match &ictl.unit_uic {
      Some(uic) if inputs.lineage.contains(uic) => &mut out.uctl,
      Some(_) => continue,
      None => &mut out.ictl,
    };
    let proponent = ictl
      .unit_uic
      .as_ref()
      .and_then(|uic| inputs.short_names.get(uic).cloned())
      .or_else(|| ictl.proponent.clone());

    for number in &ictl.task_numbers {
      let Some(task) = tasks.get(number.as_str()) else { continue };
      let trained = latest(EventType::Training, number);
      let evaluated = latest(EventType::Evaluation, number);
      let last_completed = trained.map(|e| e.date).max(evaluated.map(|e| e.date));
      let next_due = task
        .cycle_days()
        .zip(last_completed)
        .map(|(cycle, last)| cycle - (inputs.today - last).num_days());

      list.push(CriticalTask {
        ictl_id:           ictl.ictl_id,
        ictl_title:        ictl.title.clone(),
        ictl_proponent:    proponent.clone(),
        skill_level:       ictl.skill_level.clone(),
        mos:               mos.clone(),
        task_number:       task.task_number.clone(),
        task_title:        task.task_title.clone(),
        frequency:         task.frequency.clone(),
        subject_area:      task.subject_area.clone(),
        document_link:     task.pdf_url.clone(),
        last_trained:      trained.map(|e| e.date),
        last_trained_id:   trained.map(|e| e.event_id),
        last_evaluated:    evaluated.map(|e| e.date),
        last_evaluated_id: evaluated.map(|e| e.event_id),
        next_due,
      });
    }
  }

  for list in [&mut out.ictl, &mut out.uctl] {
    list.sort_by(|a, b| {
      (&a.skill_level, &a.ictl_title, &a.task_number).cmp(&(&b.skill_level, &b.ictl_title, &b.task_number))
    });
  }
  out
}
