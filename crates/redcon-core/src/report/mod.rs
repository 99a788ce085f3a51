//! Reporting over the unit hierarchy.
//!
//! A report runs in two steps. [`Dataset::load`] pulls everything a report
//! needs for one unit scope and date range out of a [`ReadinessStore`]; the
//! functions in [`health`], [`readiness`] and [`fleet`] then compute their
//! rows from that snapshot without touching the store again.

pub mod fleet;
pub mod health;
pub mod readiness;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  event::{Event, latest_where},
  flag::{SoldierFlag, most_restrictive},
  history::assigned_during,
  soldier::{BirthMonth, MaintenanceLevel, MosCode, Soldier, SoldierSnapshot},
  store::{EventQuery, FlagQuery, ReadinessStore, SoldierQuery},
  unit::Unit,
};

/// Which soldiers a report considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFilter {
  /// Maintainers whose primary MOS is tracked by the assessment program.
  AmtpMaintainers,
  /// Every maintainer regardless of MOS.
  Maintainers,
}

/// A soldier as a report sees them: identity from the current record,
/// assignment and MOS from the history snapshot that put them in scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSoldier {
  pub user_id:     String,
  pub rank:        String,
  pub first_name:  String,
  pub last_name:   String,
  pub email:       Option<String>,
  pub unit_uic:    String,
  pub mos:         Option<String>,
  pub asi_codes:   Vec<String>,
  pub birth_month: BirthMonth,
}

impl ReportSoldier {
  fn from_parts(current: &Soldier, snap: &SoldierSnapshot) -> Self {
    ReportSoldier {
      user_id:     current.user_id.clone(),
      rank:        current.rank.clone(),
      first_name:  current.first_name.clone(),
      last_name:   current.last_name.clone(),
      email:       current.dod_email.clone(),
      unit_uic:    snap.unit_uic.clone(),
      mos:         snap.primary_mos.clone(),
      asi_codes:   snap.asi_codes.clone(),
      birth_month: current.birth_month,
    }
  }

  pub fn name(&self) -> String { format!("{} {}", self.first_name, self.last_name) }
}

/// Everything a report needs for one scope and date range.
#[derive(Debug, Clone)]
pub struct Dataset {
  pub start:   NaiveDate,
  pub end:     NaiveDate,
  pub units:   BTreeMap<String, Unit>,
  /// Soldiers assigned in scope during `[start, end]`, sorted by user id.
  pub roster:  Vec<ReportSoldier>,
  /// Every snapshot recorded on or before `end`, for all soldiers.
  pub history: Vec<SoldierSnapshot>,
  pub flags:   Vec<SoldierFlag>,
  /// Events of roster soldiers dated on or before `end`.
  pub events:  Vec<Event>,
}

/// Raw inputs for [`Dataset::build`].
#[derive(Debug, Clone, Default)]
pub struct DatasetParts {
  pub units:    Vec<Unit>,
  pub soldiers: Vec<Soldier>,
  pub history:  Vec<SoldierSnapshot>,
  pub mos:      Vec<MosCode>,
  pub flags:    Vec<SoldierFlag>,
  pub events:   Vec<Event>,
}

impl Dataset {
  /// Assemble a dataset from already-fetched rows.
  pub fn build(
    parts:  DatasetParts,
    scope:  &[String],
    start:  NaiveDate,
    end:    NaiveDate,
    filter: RosterFilter,
  ) -> Self {
    let scope: HashSet<&str> = scope.iter().map(String::as_str).collect();
    let amtp: HashSet<&str> = parts
      .mos
      .iter()
      .filter(|m| m.amtp_mos)
      .map(|m| m.mos.as_str())
      .collect();

    let qualifies = |s: &SoldierSnapshot| {
      scope.contains(s.unit_uic.as_str())
        && s.is_maintainer
        && match filter {
          RosterFilter::AmtpMaintainers => {
            s.primary_mos.as_deref().is_some_and(|m| amtp.contains(m))
          }
          RosterFilter::Maintainers => true,
        }
    };

    let current: HashMap<&str, &Soldier> =
      parts.soldiers.iter().map(|s| (s.user_id.as_str(), s)).collect();

    let history: Vec<SoldierSnapshot> = parts
      .history
      .into_iter()
      .filter(|h| h.history_date.date_naive() <= end)
      .collect();

    let roster: Vec<ReportSoldier> = assigned_during(&history, start, end, qualifies)
      .into_values()
      .filter_map(|snap| {
        current
          .get(snap.user_id.as_str())
          .map(|cur| ReportSoldier::from_parts(cur, &snap))
      })
      .collect();

    let on_roster: HashSet<&str> = roster.iter().map(|s| s.user_id.as_str()).collect();
    let events = parts
      .events
      .into_iter()
      .filter(|e| on_roster.contains(e.user_id.as_str()) && e.date <= end)
      .collect();

    tracing::debug!(
      scope = scope.len(),
      roster = roster.len(),
      %start,
      %end,
      "assembled report dataset"
    );

    Dataset {
      start,
      end,
      units: parts.units.into_iter().map(|u| (u.uic.clone(), u)).collect(),
      roster,
      history,
      flags: parts.flags,
      events,
    }
  }

  /// Fetch and assemble the dataset for `scope` over `[start, end]`.
  ///
  /// History is read in full up to `end` because as-of counts look at every
  /// soldier who ever sat in scope. Soldier records and events are fetched
  /// only for those soldiers; flags for them and for the units in the
  /// scope's lineage.
  pub async fn load<S: ReadinessStore>(
    store:  &S,
    scope:  &[String],
    start:  NaiveDate,
    end:    NaiveDate,
    filter: RosterFilter,
  ) -> Result<Self, S::Error> {
    let units   = store.list_units().await?;
    let mos     = store.list_mos().await?;
    let history = store.history_through(end).await?;

    let in_scope: HashSet<&str> = scope.iter().map(String::as_str).collect();
    let user_ids: Vec<String> = history
      .iter()
      .filter(|h| in_scope.contains(h.unit_uic.as_str()))
      .map(|h| h.user_id.clone())
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();
    let flag_units: Vec<String> = units
      .iter()
      .filter(|u| in_scope.contains(u.uic.as_str()))
      .flat_map(Unit::lineage)
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();

    let soldiers = store
      .list_soldiers(&SoldierQuery { user_ids: Some(user_ids.clone()), ..Default::default() })
      .await?;
    let flags = store
      .list_flags(&FlagQuery {
        user_ids: Some(user_ids.clone()),
        unit_uics: Some(flag_units),
        ..Default::default()
      })
      .await?;
    let events = store
      .list_events(&EventQuery { user_ids: Some(user_ids), end: Some(end), ..Default::default() })
      .await?;

    Ok(Self::build(
      DatasetParts { units, soldiers, history, mos, flags, events },
      scope,
      start,
      end,
      filter,
    ))
  }

  // ── Lookups ───────────────────────────────────────────────────────────

  pub fn unit(&self, uic: &str) -> Option<&Unit> { self.units.get(uic) }

  /// Short name of a unit, falling back to the UIC.
  pub fn unit_name(&self, uic: &str) -> String {
    self
      .units
      .get(uic)
      .map(|u| u.short_name.clone())
      .unwrap_or_else(|| uic.to_owned())
  }

  fn lineage(&self, uic: &str) -> Vec<String> {
    self
      .units
      .get(uic)
      .map(Unit::lineage)
      .unwrap_or_else(|| vec![uic.to_owned()])
  }

  /// Roster soldiers assigned to one of `uics`.
  pub fn soldiers_in<'a>(&'a self, uics: &'a [String]) -> impl Iterator<Item = &'a ReportSoldier> + 'a {
    self.roster.iter().filter(move |s| uics.contains(&s.unit_uic))
  }

  /// Non-deleted flags that target the soldier or one of the soldier's units.
  pub fn flags_for<'a>(&'a self, soldier: &ReportSoldier) -> Vec<&'a SoldierFlag> {
    let lineage = self.lineage(&soldier.unit_uic);
    self
      .flags
      .iter()
      .filter(|f| !f.flag_deleted && f.applies_to(&soldier.user_id, &lineage))
      .collect()
  }

  /// The flag deciding availability anywhere in `[start, end]`.
  pub fn restricting_flag(
    &self,
    soldier: &ReportSoldier,
    start:   NaiveDate,
    end:     NaiveDate,
  ) -> Option<&SoldierFlag> {
    most_restrictive(self.flags_for(soldier).into_iter().filter(|f| f.overlaps(start, end)))
  }

  /// The flag deciding availability on a single day.
  pub fn restricting_flag_on(&self, soldier: &ReportSoldier, day: NaiveDate) -> Option<&SoldierFlag> {
    most_restrictive(self.flags_for(soldier).into_iter().filter(|f| f.is_active(day)))
  }

  /// Latest event carrying a maintenance level dated within `[from, to]`.
  pub fn latest_ml_event(&self, user_id: &str, from: NaiveDate, to: NaiveDate) -> Option<&Event> {
    latest_where(&self.events, |e| {
      e.user_id == user_id && e.maintenance_level.is_some() && from <= e.date && e.date <= to
    })
  }

  pub fn latest_ml(&self, user_id: &str, from: NaiveDate, to: NaiveDate) -> Option<MaintenanceLevel> {
    self
      .latest_ml_event(user_id, from, to)
      .and_then(|e| e.maintenance_level)
  }

  /// Latest passed evaluation dated within `[from, to]`.
  pub fn last_go_evaluation(&self, user_id: &str, from: NaiveDate, to: NaiveDate) -> Option<&Event> {
    latest_where(&self.events, |e| {
      e.user_id == user_id && e.is_go_evaluation() && from <= e.date && e.date <= to
    })
  }
}

/// `"Unknown"` when no maintenance level is on record.
pub(crate) fn ml_label(ml: Option<MaintenanceLevel>) -> String {
  ml.map(|m| m.to_string()).unwrap_or_else(|| "Unknown".to_owned())
}

#[cfg(test)]
pub(crate) mod fixtures;
