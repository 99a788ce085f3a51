//! Personnel readiness: strength against MTOE authorizations and maintainer
//! experience over time.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Days, NaiveDate};
use serde::Serialize;
use strum::IntoEnumIterator;

use super::{Dataset, ReportSoldier};
use crate::{
  flag::MxAvailability,
  history::as_of_all,
  mtoe::{MtoePosition, authorized_for},
  period::{ReportingPeriod, reporting_period, reporting_periods},
  soldier::MaintenanceLevel,
  unit::Unit,
};

/// MOS codes compared by [`actual_vs_authorized`] when none is requested.
pub const AVIATION_MOS: [&str; 4] = ["15R", "15T", "15U", "15Z"];

// ─── Output types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MlCount {
  pub mos:   String,
  pub ml:    MaintenanceLevel,
  pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Strength {
  /// MOS or ASI code, depending on the report.
  pub code:             String,
  pub available_count:  u32,
  pub total_count:      u32,
  pub authorized_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelCount {
  pub level: MaintenanceLevel,
  pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodLevels {
  /// `"%B %Y"` of the period end.
  pub date:   String,
  pub counts: Vec<LevelCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MosExperience {
  pub mos:                  String,
  pub authorized_personnel: u32,
  pub data:                 Vec<PeriodLevels>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MosActualVsAuthorized {
  pub mos:                       String,
  pub authorized_count:          u32,
  pub actual_count:              u32,
  pub prior_period_actual_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaintainerTotals {
  pub actual_total:              u32,
  pub authorized_total:          u32,
  pub prior_period_actual_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActualVsAuthorized {
  pub maintainer_counts: MaintainerTotals,
  pub crew_counts:       Vec<MosActualVsAuthorized>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseMaintainer {
  pub user_id:           String,
  pub first_name:        String,
  pub last_name:         String,
  /// Latest maintenance level, or `"No ML"`.
  pub ml:                String,
  pub mos:               String,
  /// Whether an Unavailable flag overlaps the phase window.
  pub availability_flag: bool,
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn unavailable_between(ds: &Dataset, s: &ReportSoldier, start: NaiveDate, end: NaiveDate) -> bool {
  ds.restricting_flag(s, start, end)
    .is_some_and(|f| f.mx_availability == MxAvailability::Unavailable)
}

fn count_by_mos_ml(rows: impl IntoIterator<Item = (String, MaintenanceLevel)>) -> Vec<MlCount> {
  let mut counts: BTreeMap<(String, MaintenanceLevel), u32> = BTreeMap::new();
  for key in rows {
    *counts.entry(key).or_default() += 1;
  }
  counts
    .into_iter()
    .map(|((mos, ml), count)| MlCount { mos, ml, count })
    .collect()
}

// ─── Maintainer counts ───────────────────────────────────────────────────────

/// Maintainers with an Unavailable flag in force during the dataset range,
/// counted by MOS and latest maintenance level. Soldiers with no level on
/// record are left out.
pub fn unavailable_maintainers(ds: &Dataset) -> Vec<MlCount> {
  count_by_mos_ml(ds.roster.iter().filter_map(|s| {
    let mos = s.mos.clone()?;
    if !unavailable_between(ds, s, ds.start, ds.end) {
      return None;
    }
    let ml = ds.latest_ml(&s.user_id, NaiveDate::MIN, ds.end)?;
    Some((mos, ml))
  }))
}

/// Maintainers whose latest level within the range is ML0 or ML1.
pub fn inexperienced_maintainers(ds: &Dataset) -> Vec<MlCount> {
  count_by_mos_ml(ds.roster.iter().filter_map(|s| {
    let mos = s.mos.clone()?;
    let ml = ds.latest_ml(&s.user_id, ds.start, ds.end)?;
    ml.is_inexperienced().then_some((mos, ml))
  }))
}

// ─── Strength ────────────────────────────────────────────────────────────────

/// Available, assigned and authorized maintainers per MOS on `ds.end`.
///
/// `mtoe` should already be limited to the fiscal year of that date. A
/// soldier is available unless an Unavailable flag is in force that day.
pub fn strength_by_mos(ds: &Dataset, mtoe: &[MtoePosition]) -> Vec<Strength> {
  let mut rows: BTreeMap<String, Strength> = BTreeMap::new();
  for s in &ds.roster {
    let Some(mos) = &s.mos else { continue };
    let row = rows.entry(mos.clone()).or_insert_with(|| Strength {
      code: mos.clone(),
      authorized_count: authorized_for(mtoe, mos),
      ..Default::default()
    });
    row.total_count += 1;
    if !unavailable_between(ds, s, ds.end, ds.end) {
      row.available_count += 1;
    }
  }
  rows.into_values().collect()
}

/// Like [`strength_by_mos`], keyed by additional skill identifier. A soldier
/// holding several ASIs counts once under each.
pub fn strength_by_skill(ds: &Dataset, mtoe: &[MtoePosition]) -> Vec<Strength> {
  let mut authorized: HashMap<&str, u32> = HashMap::new();
  for p in mtoe {
    for asi in &p.asi_codes {
      *authorized.entry(asi.as_str()).or_default() += p.authorized_strength;
    }
  }

  let mut rows: BTreeMap<String, Strength> = BTreeMap::new();
  for s in &ds.roster {
    let available = !unavailable_between(ds, s, ds.end, ds.end);
    for asi in &s.asi_codes {
      let row = rows.entry(asi.clone()).or_insert_with(|| Strength {
        code: asi.clone(),
        authorized_count: authorized.get(asi.as_str()).copied().unwrap_or(0),
        ..Default::default()
      });
      row.total_count += 1;
      if available {
        row.available_count += 1;
      }
    }
  }
  rows.into_values().collect()
}

// ─── Experience over time ────────────────────────────────────────────────────

/// Reporting periods touched by `target` ± 90 days.
pub fn experience_periods(target: NaiveDate) -> Vec<ReportingPeriod> {
  reporting_periods(target - Days::new(90), target + Days::new(90))
}

/// Per MOS, how many maintainers sat at each level in each reporting period
/// around `target`. A soldier's level in a period is the latest one recorded
/// in that period; soldiers with nothing recorded are not counted.
///
/// Build `ds` over the span of [`experience_periods`]. Without a filter, every
/// MOS on the roster is reported.
pub fn maintainer_experience_by_mos(
  ds:         &Dataset,
  mtoe:       &[MtoePosition],
  target:     NaiveDate,
  mos_filter: Option<&[String]>,
) -> Vec<MosExperience> {
  let periods = experience_periods(target);
  let mos_codes: Vec<String> = match mos_filter {
    Some(codes) if !codes.is_empty() => codes.to_vec(),
    _ => ds
      .roster
      .iter()
      .filter_map(|s| s.mos.clone())
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect(),
  };

  mos_codes
    .into_iter()
    .map(|mos| {
      let holders: Vec<&ReportSoldier> = ds
        .roster
        .iter()
        .filter(|s| s.mos.as_deref() == Some(mos.as_str()))
        .collect();

      let data = periods
        .iter()
        .map(|p| {
          let mut tally: HashMap<MaintenanceLevel, u32> = HashMap::new();
          for s in &holders {
            if let Some(ml) = ds.latest_ml(&s.user_id, p.start, p.end) {
              *tally.entry(ml).or_default() += 1;
            }
          }
          PeriodLevels {
            date:   p.label(),
            counts: MaintenanceLevel::iter()
              .map(|level| LevelCount { level, count: tally.get(&level).copied().unwrap_or(0) })
              .collect(),
          }
        })
        .collect();

      MosExperience { authorized_personnel: authorized_for(mtoe, &mos), mos, data }
    })
    .collect()
}

// ─── Actual vs authorized ────────────────────────────────────────────────────

/// Maintainers assigned under `unit` on `date` and at the end of the prior
/// reporting period, against MTOE authorizations.
///
/// `ds.history` must reach `date`. With no `mos_codes`, [`AVIATION_MOS`] is
/// used. The totals count every maintainer with a primary MOS.
pub fn actual_vs_authorized(
  ds:        &Dataset,
  unit:      &Unit,
  mtoe:      &[MtoePosition],
  date:      NaiveDate,
  mos_codes: Option<&[String]>,
) -> ActualVsAuthorized {
  let scope = unit.with_subordinates();
  let prior_end = reporting_period(date).previous().end;

  let mos_of = |on: NaiveDate| -> Vec<String> {
    as_of_all(&ds.history, on)
      .into_values()
      .filter(|s| s.is_maintainer && scope.contains(&s.unit_uic))
      .filter_map(|s| s.primary_mos)
      .collect()
  };
  let current = mos_of(date);
  let prior = mos_of(prior_end);

  let codes: Vec<String> = match mos_codes {
    Some(codes) if !codes.is_empty() => codes.to_vec(),
    _ => AVIATION_MOS.iter().map(|m| (*m).to_owned()).collect(),
  };
  let count = |list: &[String], mos: &str| list.iter().filter(|m| *m == mos).count() as u32;

  let crew_counts = codes
    .iter()
    .map(|mos| MosActualVsAuthorized {
      mos:                       mos.clone(),
      authorized_count:          authorized_for(mtoe, mos),
      actual_count:              count(&current, mos),
      prior_period_actual_count: count(&prior, mos),
    })
    .collect();

  ActualVsAuthorized {
    maintainer_counts: MaintainerTotals {
      actual_total:              current.len() as u32,
      authorized_total:          mtoe.iter().map(|p| p.authorized_strength).sum(),
      prior_period_actual_count: prior.len() as u32,
    },
    crew_counts,
  }
}

// ─── Phase teams ─────────────────────────────────────────────────────────────

/// Candidate phase-team maintainers with their latest level and whether they
/// are flagged unavailable at any point of `[start, end]`.
pub fn phase_maintainers(ds: &Dataset, start: NaiveDate, end: NaiveDate) -> Vec<PhaseMaintainer> {
  ds.roster
    .iter()
    .filter_map(|s| {
      let mos = s.mos.clone()?;
      Some(PhaseMaintainer {
        user_id: s.user_id.clone(),
        first_name: s.first_name.clone(),
        last_name: s.last_name.clone(),
        ml: ds
          .latest_ml(&s.user_id, NaiveDate::MIN, end)
          .map(|m| m.to_string())
          .unwrap_or_else(|| "No ML".to_owned()),
        mos,
        availability_flag: unavailable_between(ds, s, start, end),
      })
    })
    .collect()
}
