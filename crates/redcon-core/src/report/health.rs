//! Unit health: availability, evaluation status and experience of the
//! maintainers in a unit and the units below it.
//!
//! The summary has one row for the selected unit and one per direct child.
//! The selected unit's row counts only soldiers assigned to it directly; a
//! child's row counts the child and everything beneath it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::{Dataset, ReportSoldier, ml_label};
use crate::{
  evaluation::{EvaluationBucket, EvaluationStatus, evaluation_status},
  event::{EventTask, EventType, GoNoGo},
  flag::{Availability, FlagDetails},
  history::arrival_at_unit,
  soldier::MaintenanceLevel,
  unit::Unit,
};

// ─── Output types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitAvailabilitySummary {
  pub unit_name:         String,
  pub unit_uic:          String,
  pub available_count:   u32,
  pub limited_count:     u32,
  pub unavailable_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitEvaluationSummary {
  pub unit_name:     String,
  pub unit_uic:      String,
  pub met_count:     u32,
  pub due_count:     u32,
  pub overdue_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MosBreakdown {
  pub mos: String,
  pub ml0: u32,
  pub ml1: u32,
  pub ml2: u32,
  pub ml3: u32,
  pub ml4: u32,
}

impl MosBreakdown {
  fn add(&mut self, ml: MaintenanceLevel) {
    match ml {
      MaintenanceLevel::Ml0 => self.ml0 += 1,
      MaintenanceLevel::Ml1 => self.ml1 += 1,
      MaintenanceLevel::Ml2 => self.ml2 += 1,
      MaintenanceLevel::Ml3 => self.ml3 += 1,
      MaintenanceLevel::Ml4 => self.ml4 += 1,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitMosBreakdownSummary {
  pub unit_name: String,
  pub unit_uic:  String,
  pub mos_list:  Vec<MosBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitHealthSummary {
  pub unit_echelon:         String,
  pub units_availability:   Vec<UnitAvailabilitySummary>,
  pub units_evals:          Vec<UnitEvaluationSummary>,
  pub units_mos_breakdowns: Vec<UnitMosBreakdownSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationEvent {
  pub event_id:          Uuid,
  pub eval_date:         NaiveDate,
  pub go_nogo:           Option<GoNoGo>,
  pub total_mx_hours:    Option<f64>,
  pub comment:           String,
  pub event_type:        EventType,
  pub evaluation_type:   Option<String>,
  pub maintenance_level: Option<MaintenanceLevel>,
  pub mos:               Option<String>,
  pub event_tasks:       Vec<EventTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoldierHealth {
  pub rank:                   String,
  pub name:                   String,
  pub user_id:                String,
  pub email:                  Option<String>,
  pub availability:           String,
  pub unit:                   String,
  pub mos:                    Option<String>,
  pub ml:                     String,
  pub birth_month:            String,
  /// ISO date of the last passed evaluation, or `"None"`.
  pub last_evaluation_date:   String,
  pub last_evaluation_data:   Option<EvaluationEvent>,
  pub evaluation_status:      EvaluationStatus,
  pub flag_availability_data: Option<FlagDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoldierMissingPacket {
  pub name:            String,
  pub user_id:         String,
  /// `"Uploaded"` or `"Missing"`.
  pub packet_status:   String,
  pub arrival_at_unit: Option<NaiveDate>,
  pub unit:            String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoldierAvailabilityDetail {
  pub name:         String,
  pub user_id:      String,
  pub email:        Option<String>,
  pub availability: String,
  pub unit:         String,
  pub mos:          Option<String>,
  pub ml:           String,
  pub flag_details: Option<FlagDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoldiersByUnit {
  pub unit_name: String,
  pub soldiers:  Vec<SoldierAvailabilityDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoldierEvaluationDetail {
  pub name:              String,
  pub user_id:           String,
  pub evaluation_status: EvaluationStatus,
  pub unit:              String,
  pub mos:               Option<String>,
  pub ml:                String,
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// (uic, member uics) for each summary row.
fn summary_rows(ds: &Dataset, unit: &Unit) -> Vec<(String, Vec<String>)> {
  let mut rows = vec![(unit.uic.clone(), vec![unit.uic.clone()])];
  for child in &unit.child_uics {
    let members = ds
      .unit(child)
      .map(Unit::with_subordinates)
      .unwrap_or_else(|| vec![child.clone()]);
    rows.push((child.clone(), members));
  }
  rows
}

fn availability(ds: &Dataset, s: &ReportSoldier) -> Availability {
  Availability::from_flag(ds.restricting_flag(s, ds.start, ds.end))
}

fn status(ds: &Dataset, s: &ReportSoldier, today: NaiveDate) -> EvaluationStatus {
  let last = ds.last_go_evaluation(&s.user_id, NaiveDate::MIN, ds.end).map(|e| e.date);
  evaluation_status(s.birth_month, last, today)
}

fn range_ml(ds: &Dataset, s: &ReportSoldier) -> Option<MaintenanceLevel> {
  ds.latest_ml(&s.user_id, ds.start, ds.end)
}

// ─── Summary ─────────────────────────────────────────────────────────────────

pub fn units_availability(ds: &Dataset, unit: &Unit) -> Vec<UnitAvailabilitySummary> {
  summary_rows(ds, unit)
    .into_iter()
    .map(|(uic, members)| {
      let mut row = UnitAvailabilitySummary {
        unit_name:         ds.unit_name(&uic),
        unit_uic:          uic,
        available_count:   0,
        limited_count:     0,
        unavailable_count: 0,
      };
      for s in ds.soldiers_in(&members) {
        match availability(ds, s) {
          Availability::Available => row.available_count += 1,
          Availability::Limited => row.limited_count += 1,
          Availability::Unavailable => row.unavailable_count += 1,
        }
      }
      row
    })
    .collect()
}

pub fn units_evaluations(ds: &Dataset, unit: &Unit, today: NaiveDate) -> Vec<UnitEvaluationSummary> {
  summary_rows(ds, unit)
    .into_iter()
    .map(|(uic, members)| {
      let mut row = UnitEvaluationSummary {
        unit_name:     ds.unit_name(&uic),
        unit_uic:      uic,
        met_count:     0,
        due_count:     0,
        overdue_count: 0,
      };
      for s in ds.soldiers_in(&members) {
        match status(ds, s, today).bucket() {
          Some(EvaluationBucket::Met) => row.met_count += 1,
          Some(EvaluationBucket::Due) => row.due_count += 1,
          Some(EvaluationBucket::Overdue) => row.overdue_count += 1,
          None => {}
        }
      }
      row
    })
    .collect()
}

pub fn units_mos_breakdown(ds: &Dataset, unit: &Unit) -> Vec<UnitMosBreakdownSummary> {
  summary_rows(ds, unit)
    .into_iter()
    .map(|(uic, members)| {
      let mut by_mos: BTreeMap<String, MosBreakdown> = BTreeMap::new();
      for s in ds.soldiers_in(&members) {
        let (Some(mos), Some(ml)) = (s.mos.clone(), range_ml(ds, s)) else {
          continue;
        };
        by_mos
          .entry(mos.clone())
          .or_insert_with(|| MosBreakdown { mos, ..Default::default() })
          .add(ml);
      }
      UnitMosBreakdownSummary {
        unit_name: ds.unit_name(&uic),
        unit_uic:  uic,
        mos_list:  by_mos.into_values().collect(),
      }
    })
    .collect()
}

pub fn unit_health_summary(ds: &Dataset, unit: &Unit, today: NaiveDate) -> UnitHealthSummary {
  UnitHealthSummary {
    unit_echelon:         unit.echelon.display_name().to_owned(),
    units_availability:   units_availability(ds, unit),
    units_evals:          units_evaluations(ds, unit, today),
    units_mos_breakdowns: units_mos_breakdown(ds, unit),
  }
}

// ─── Roster ──────────────────────────────────────────────────────────────────

pub fn health_roster(ds: &Dataset, unit: &Unit, today: NaiveDate) -> Vec<SoldierHealth> {
  let scope = unit.with_subordinates();
  let mut soldiers: Vec<&ReportSoldier> = ds.soldiers_in(&scope).collect();
  soldiers.sort_by_cached_key(|s| {
    (ds.unit_name(&s.unit_uic), s.last_name.clone(), s.first_name.clone())
  });

  soldiers
    .into_iter()
    .map(|s| {
      let flag = ds.restricting_flag(s, ds.start, ds.end);
      let last = ds.last_go_evaluation(&s.user_id, NaiveDate::MIN, ds.end);
      SoldierHealth {
        rank:                   s.rank.clone(),
        name:                   s.name(),
        user_id:                s.user_id.clone(),
        email:                  s.email.clone(),
        availability:           Availability::from_flag(flag).label().to_owned(),
        unit:                   ds.unit_name(&s.unit_uic),
        mos:                    s.mos.clone(),
        ml:                     ml_label(range_ml(ds, s)),
        birth_month:            s.birth_month.to_string(),
        last_evaluation_date:   last
          .map(|e| e.date.to_string())
          .unwrap_or_else(|| "None".to_owned()),
        last_evaluation_data:   last.map(|e| EvaluationEvent {
          event_id:          e.event_id,
          eval_date:         e.date,
          go_nogo:           e.go_nogo,
          total_mx_hours:    e.total_mx_hours,
          comment:           e.comment.clone(),
          event_type:        e.event_type,
          evaluation_type:   e.evaluation_type.clone(),
          maintenance_level: e.maintenance_level,
          mos:               e.mos.clone(),
          event_tasks:       e.tasks.clone(),
        }),
        evaluation_status:      evaluation_status(s.birth_month, last.map(|e| e.date), today),
        flag_availability_data: flag.map(FlagDetails::from_flag),
      }
    })
    .collect()
}

// ─── Detail reports ──────────────────────────────────────────────────────────

/// Whether each soldier has had an evaluation packet (an ML-bearing event)
/// uploaded during the range.
///
/// Only soldiers assigned by `ds.end` are on the roster, so a soldier arriving
/// after the range never appears, and arrival dates are read from history
/// that stops at `ds.end`.
pub fn missing_packets(ds: &Dataset, unit: &Unit) -> Vec<SoldierMissingPacket> {
  let scope = unit.with_subordinates();
  ds.soldiers_in(&scope)
    .map(|s| {
      let history: Vec<_> = ds
        .history
        .iter()
        .filter(|h| h.user_id == s.user_id)
        .cloned()
        .collect();
      let uploaded = ds.latest_ml_event(&s.user_id, ds.start, ds.end).is_some();
      SoldierMissingPacket {
        name:            s.name(),
        user_id:         s.user_id.clone(),
        packet_status:   if uploaded { "Uploaded" } else { "Missing" }.to_owned(),
        arrival_at_unit: arrival_at_unit(&history, &s.unit_uic),
        unit:            ds.unit_name(&s.unit_uic),
      }
    })
    .collect()
}

/// Per-soldier availability grouped by unit: the selected unit first, then
/// its subordinates breadth-first. Units with no soldiers are omitted.
pub fn availability_details(ds: &Dataset, unit: &Unit) -> Vec<SoldiersByUnit> {
  unit
    .with_subordinates()
    .into_iter()
    .filter_map(|uic| {
      let members = [uic.clone()];
      let soldiers: Vec<SoldierAvailabilityDetail> = ds
        .soldiers_in(&members)
        .map(|s| {
          let flag = ds.restricting_flag(s, ds.start, ds.end);
          SoldierAvailabilityDetail {
            name:         s.name(),
            user_id:      s.user_id.clone(),
            email:        s.email.clone(),
            availability: Availability::from_flag(flag).label().to_owned(),
            unit:         ds.unit_name(&s.unit_uic),
            mos:          s.mos.clone(),
            ml:           ml_label(range_ml(ds, s)),
            flag_details: flag.map(FlagDetails::from_flag),
          }
        })
        .collect();
      (!soldiers.is_empty()).then(|| SoldiersByUnit { unit_name: ds.unit_name(&uic), soldiers })
    })
    .collect()
}

/// Evaluation status of soldiers assigned directly to `unit`, counting only
/// evaluations passed within the range.
pub fn evaluation_details(ds: &Dataset, unit: &Unit, today: NaiveDate) -> Vec<SoldierEvaluationDetail> {
  let members = [unit.uic.clone()];
  ds.soldiers_in(&members)
    .map(|s| {
      let last = ds.last_go_evaluation(&s.user_id, ds.start, ds.end).map(|e| e.date);
      SoldierEvaluationDetail {
        name:              s.name(),
        user_id:           s.user_id.clone(),
        evaluation_status: evaluation_status(s.birth_month, last, today),
        unit:              ds.unit_name(&s.unit_uic),
        mos:               s.mos.clone(),
        ml:                ml_label(range_ml(ds, s)),
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    flag::MxAvailability,
    report::fixtures::{Fixture, ymd},
    soldier::{BirthMonth, MaintenanceLevel},
  };

  fn fixture() -> Fixture {
    let mut fx = Fixture::new();
    fx.soldier("1", "Adams", "BN", "15R", BirthMonth::Mar, ymd(2023, 1, 1))
      .soldier("2", "Baker", "ACO", "15R", BirthMonth::Jun, ymd(2023, 1, 1))
      .soldier("3", "Clark", "APLT", "15T", BirthMonth::Unk, ymd(2023, 1, 1))
      .soldier("4", "Davis", "BCO", "15T", BirthMonth::Jan, ymd(2023, 1, 1))
      .soldier("5", "Evans", "BCO", "92Y", BirthMonth::Jan, ymd(2023, 1, 1));
    fx
  }

  #[test]
  fn summary_rows_split_direct_and_child_scopes() {
    let mut fx = fixture();
    fx.flag(Some("2"), None, MxAvailability::Limited, ymd(2024, 2, 1), None);
    fx.flag(Some("3"), None, MxAvailability::Unavailable, ymd(2024, 2, 1), Some(ymd(2024, 2, 10)));
    let ds = fx.dataset("BN", ymd(2024, 2, 1), ymd(2024, 2, 29));

    let rows = units_availability(&ds, &fx.unit("BN"));
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].unit_uic, "BN");
    assert_eq!((rows[0].available_count, rows[0].limited_count, rows[0].unavailable_count), (1, 0, 0));
    assert_eq!(rows[1].unit_uic, "ACO");
    assert_eq!((rows[1].available_count, rows[1].limited_count, rows[1].unavailable_count), (0, 1, 1));
    // 92Y is not an AMTP MOS, so BCO only counts Davis.
    assert_eq!(rows[2].unit_uic, "BCO");
    assert_eq!(rows[2].available_count, 1);
    assert_eq!(rows[2].unit_name, "BCO short");
  }

  #[test]
  fn unit_flag_reaches_subordinate_soldiers() {
    let mut fx = fixture();
    fx.flag(None, Some("ACO"), MxAvailability::Unavailable, ymd(2024, 1, 1), None);
    let ds = fx.dataset("BN", ymd(2024, 2, 1), ymd(2024, 2, 29));
    let rows = units_availability(&ds, &fx.unit("BN"));
    assert_eq!(rows[1].unavailable_count, 2);
    assert_eq!(rows[0].unavailable_count, 0);
  }

  #[test]
  fn evaluation_counts_skip_unknown_birth_month() {
    let mut fx = fixture();
    // Adams (MAR): window Jan-Mar 2024, evaluated in window.
    fx.go_eval("1", ymd(2024, 1, 20));
    // Baker (JUN): window Apr-Jun 2024 not yet open, last eval in 2022 window missed.
    fx.go_eval("2", ymd(2022, 5, 1));
    let ds = fx.dataset("BN", ymd(2024, 2, 1), ymd(2024, 2, 29));

    let rows = units_evaluations(&ds, &fx.unit("BN"), ymd(2024, 2, 15));
    assert_eq!((rows[0].met_count, rows[0].due_count, rows[0].overdue_count), (1, 0, 0));
    // Baker overdue, Clark skipped.
    assert_eq!((rows[1].met_count, rows[1].due_count, rows[1].overdue_count), (0, 0, 1));
    // Davis (JAN): window Nov 2023-Jan 2024 closed, never evaluated.
    assert_eq!(rows[2].overdue_count, 1);
  }

  #[test]
  fn mos_breakdown_uses_latest_ml_in_range() {
    let mut fx = fixture();
    fx.ml("2", ymd(2024, 2, 3), MaintenanceLevel::Ml1)
      .ml("2", ymd(2024, 2, 20), MaintenanceLevel::Ml2)
      .ml("3", ymd(2023, 12, 1), MaintenanceLevel::Ml3);
    let ds = fx.dataset("BN", ymd(2024, 2, 1), ymd(2024, 2, 29));

    let summary = unit_health_summary(&ds, &fx.unit("BN"), ymd(2024, 2, 15));
    assert_eq!(summary.unit_echelon, "Battalion");
    let aco = &summary.units_mos_breakdowns[1];
    assert_eq!(aco.mos_list.len(), 1);
    assert_eq!(aco.mos_list[0].mos, "15R");
    assert_eq!((aco.mos_list[0].ml1, aco.mos_list[0].ml2), (0, 1));
  }

  #[test]
  fn roster_is_ordered_and_carries_last_evaluation() {
    let mut fx = fixture();
    fx.go_eval("4", ymd(2023, 12, 5));
    let ds = fx.dataset("BN", ymd(2024, 2, 1), ymd(2024, 2, 29));

    let roster = health_roster(&ds, &fx.unit("BN"), ymd(2024, 2, 15));
    let order: Vec<_> = roster.iter().map(|r| r.user_id.as_str()).collect();
    assert_eq!(order, vec!["2", "3", "4", "1"]);

    let davis = roster.iter().find(|r| r.user_id == "4").unwrap();
    assert_eq!(davis.last_evaluation_date, "2023-12-05");
    assert_eq!(davis.evaluation_status, EvaluationStatus::MetNotInWindow);
    assert_eq!(davis.last_evaluation_data.as_ref().unwrap().event_tasks.len(), 1);
    assert_eq!(davis.ml, "Unknown");

    let adams = roster.iter().find(|r| r.user_id == "1").unwrap();
    assert_eq!(adams.last_evaluation_date, "None");
    assert_eq!(adams.availability, "Available");
  }

  #[test]
  fn packets_report_upload_and_arrival() {
    let mut fx = fixture();
    fx.transfer("2", "BCO", ymd(2024, 2, 5));
    fx.ml("2", ymd(2024, 2, 10), MaintenanceLevel::Ml2);
    let ds = fx.dataset("BN", ymd(2024, 2, 1), ymd(2024, 2, 29));

    let packets = missing_packets(&ds, &fx.unit("BN"));
    let baker = packets.iter().find(|p| p.user_id == "2").unwrap();
    assert_eq!(baker.packet_status, "Uploaded");
    assert_eq!(baker.arrival_at_unit, Some(ymd(2024, 2, 5)));
    assert_eq!(baker.unit, "BCO short");

    let adams = packets.iter().find(|p| p.user_id == "1").unwrap();
    assert_eq!(adams.packet_status, "Missing");
  }

  #[test]
  fn packets_ignore_moves_after_the_range() {
    let mut fx = fixture();
    // Joins after the range closes: never on the roster.
    fx.soldier("9", "Late", "BCO", "15R", BirthMonth::Jan, ymd(2024, 3, 20));
    // Leaves ACO after the range: still reported against ACO.
    fx.transfer("2", "BCO", ymd(2024, 3, 10));
    let ds = fx.dataset("BN", ymd(2024, 2, 1), ymd(2024, 2, 29));

    let packets = missing_packets(&ds, &fx.unit("BN"));
    assert!(packets.iter().all(|p| p.user_id != "9"));
    let baker = packets.iter().find(|p| p.user_id == "2").unwrap();
    assert_eq!(baker.unit, "ACO short");
    assert_eq!(baker.arrival_at_unit, Some(ymd(2023, 1, 1)));
  }

  #[test]
  fn availability_details_group_in_hierarchy_order() {
    let mut fx = fixture();
    fx.flag(Some("4"), None, MxAvailability::Limited, ymd(2024, 2, 1), None);
    let ds = fx.dataset("BN", ymd(2024, 2, 1), ymd(2024, 2, 29));

    let groups = availability_details(&ds, &fx.unit("BN"));
    let names: Vec<_> = groups.iter().map(|g| g.unit_name.as_str()).collect();
    assert_eq!(names, vec!["BN short", "ACO short", "BCO short", "APLT short"]);

    let davis = &groups[2].soldiers[0];
    assert_eq!(davis.availability, "Available - Limited");
    let details = davis.flag_details.as_ref().unwrap();
    assert_eq!(details.flag_info.as_deref(), Some("profile"));
    assert_eq!(details.recorded_by.as_deref(), Some("0000000001"));
  }

  #[test]
  fn evaluation_details_only_count_range_evaluations() {
    let mut fx = fixture();
    fx.go_eval("1", ymd(2024, 1, 20));
    let ds = fx.dataset("BN", ymd(2024, 2, 1), ymd(2024, 2, 29));

    let rows = evaluation_details(&ds, &fx.unit("BN"), ymd(2024, 2, 15));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, "1");
    assert_eq!(rows[0].evaluation_status.to_string(), "Due - 45 Days Remaining");
  }
}
