//! Fleet readiness: bank time, phase flow and DA-1352 status history.
//!
//! Bank time is the share of a fleet's phase interval still left to fly:
//! `Σ hours_to_phase / (count × phase_interval)` per model.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  aircraft::{Aircraft, Da1352, MaintenanceEvent, MaintenanceType, MonthlyProjection, phase_interval},
  period::{reporting_period, two_years_prior},
  unit::Unit,
};

/// Number of reporting periods a bank-time forecast covers.
pub const FORECAST_PERIODS: usize = 12;

/// Years of DA-1352 history averaged when a period has no projection.
pub const HISTORY_YEARS: u32 = 5;

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString,
  AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BankGrouping {
  /// One figure for the whole unit.
  #[default]
  Unit,
  /// One figure per model.
  Model,
  /// One figure per direct subordinate unit.
  Subordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankPercentage {
  /// UIC or model, depending on the grouping.
  pub key:             String,
  /// Fraction of the phase interval remaining, 0.0 to 1.0.
  pub bank_percentage: f64,
}

struct ModelBank {
  model:    String,
  count:    usize,
  fraction: f64,
}

fn in_units<'a>(aircraft: &'a [Aircraft], uics: &[String]) -> Vec<&'a Aircraft> {
  aircraft.iter().filter(|a| uics.contains(&a.current_unit)).collect()
}

fn model_banks(aircraft: &[&Aircraft]) -> Vec<ModelBank> {
  let mut by_model: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
  for a in aircraft {
    let entry = by_model.entry(a.model.as_str()).or_default();
    entry.0 += 1;
    entry.1 += a.hours_to_phase;
  }
  by_model
    .into_iter()
    .map(|(model, (count, hours))| ModelBank {
      model: model.to_owned(),
      count,
      fraction: hours / (count as f64 * phase_interval(model)),
    })
    .collect()
}

/// Count-weighted average of the per-model fractions.
fn weighted(banks: &[ModelBank]) -> Option<f64> {
  let count: usize = banks.iter().map(|b| b.count).sum();
  (count > 0).then(|| banks.iter().map(|b| b.fraction * b.count as f64).sum::<f64>() / count as f64)
}

/// Bank time for `unit`'s fleet. `children` are the unit's direct
/// subordinates, used only by [`BankGrouping::Subordinates`]; subordinates
/// without aircraft are left out.
pub fn bank_hour_percentage(
  unit:     &Unit,
  children: &[Unit],
  aircraft: &[Aircraft],
  grouping: BankGrouping,
) -> Vec<BankPercentage> {
  match grouping {
    BankGrouping::Unit => {
      let banks = model_banks(&in_units(aircraft, &unit.with_subordinates()));
      weighted(&banks)
        .map(|p| BankPercentage { key: unit.uic.clone(), bank_percentage: p })
        .into_iter()
        .collect()
    }
    BankGrouping::Model => model_banks(&in_units(aircraft, &unit.with_subordinates()))
      .into_iter()
      .map(|b| BankPercentage { key: b.model, bank_percentage: b.fraction })
      .collect(),
    BankGrouping::Subordinates => children
      .iter()
      .filter_map(|child| {
        let banks = model_banks(&in_units(aircraft, &child.with_subordinates()));
        weighted(&banks).map(|p| BankPercentage { key: child.uic.clone(), bank_percentage: p })
      })
      .collect(),
  }
}

// ─── Phase flow ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseFlowGroup {
  /// UIC or model.
  pub key:      String,
  pub aircraft: Vec<Aircraft>,
}

/// Aircraft ordered by hours remaining to phase, most first.
pub fn phase_flow(aircraft: &[Aircraft]) -> Vec<Aircraft> {
  let mut out = aircraft.to_vec();
  out.sort_by(|a, b| b.hours_to_phase.total_cmp(&a.hours_to_phase));
  out
}

/// [`phase_flow`] for each direct subordinate's fleet.
pub fn phase_flow_subordinates(children: &[Unit], aircraft: &[Aircraft]) -> Vec<PhaseFlowGroup> {
  children
    .iter()
    .map(|child| {
      let scope = child.with_subordinates();
      let fleet: Vec<Aircraft> = in_units(aircraft, &scope).into_iter().cloned().collect();
      PhaseFlowGroup { key: child.uic.clone(), aircraft: phase_flow(&fleet) }
    })
    .collect()
}

/// [`phase_flow`] for each model, models in name order.
pub fn phase_flow_models(aircraft: &[Aircraft]) -> Vec<PhaseFlowGroup> {
  let mut by_model: BTreeMap<&str, Vec<Aircraft>> = BTreeMap::new();
  for a in aircraft {
    by_model.entry(a.model.as_str()).or_default().push(a.clone());
  }
  by_model
    .into_iter()
    .map(|(model, fleet)| PhaseFlowGroup { key: model.to_owned(), aircraft: phase_flow(&fleet) })
    .collect()
}

// ─── Forecast ────────────────────────────────────────────────────────────────

/// Records a forecast draws on. Projections should already be limited to the
/// projecting unit and its subordinates.
#[derive(Debug, Clone, Copy)]
pub struct ForecastInputs<'a> {
  pub aircraft:    &'a [Aircraft],
  pub projections: &'a [MonthlyProjection],
  pub reports:     &'a [Da1352],
  pub maintenance: &'a [MaintenanceEvent],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
  pub reporting_period_end: NaiveDate,
  /// Percent of the phase interval remaining, never below zero.
  pub bank_percentage:      f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelForecast {
  pub model:  String,
  pub points: Vec<ForecastPoint>,
}

/// For a company that reads its parent's projections: per model, how many of
/// the parent's direct subordinates fly it. Never less than one.
pub fn projection_divisors(siblings: &[Unit], aircraft: &[Aircraft]) -> HashMap<String, f64> {
  let mut holders: HashMap<String, usize> = HashMap::new();
  for sibling in siblings {
    let scope = sibling.with_subordinates();
    let models: HashSet<&str> = in_units(aircraft, &scope).iter().map(|a| a.model.as_str()).collect();
    for model in models {
      *holders.entry(model.to_owned()).or_default() += 1;
    }
  }
  holders
    .into_iter()
    .map(|(model, n)| (model, n.max(1) as f64))
    .collect()
}

fn round3(x: f64) -> f64 { (x * 1000.0).round() / 1000.0 }

/// Average flying hours the aircraft logged in `month` over the last five
/// years of DA-1352 reports.
fn average_flying_hours(reports: &[Da1352], serials: &HashSet<&str>, month: u32, today: NaiveDate) -> f64 {
  let since = today - Months::new(12 * HISTORY_YEARS);
  let total: f64 = reports
    .iter()
    .filter(|r| {
      serials.contains(r.serial.as_str())
        && r.reporting_month.month() == month
        && since <= r.reporting_month
        && r.reporting_month <= today
    })
    .map(|r| r.flying_hours)
    .sum();
  total / f64::from(HISTORY_YEARS)
}

/// Project each model's bank time over the next [`FORECAST_PERIODS`]
/// reporting periods, starting with the one containing `today`.
///
/// Each period burns the unit's projected hours for it (divided by the
/// model's entry in `divisors`, if any) or, lacking a projection, the
/// historical average for that calendar month. Phases completing in the
/// period restore a full interval each.
pub fn bank_time_forecast(
  inputs:   ForecastInputs<'_>,
  divisors: &HashMap<String, f64>,
  today:    NaiveDate,
) -> Vec<ModelForecast> {
  let mut fleets: BTreeMap<&str, Vec<&Aircraft>> = BTreeMap::new();
  for a in inputs.aircraft {
    fleets.entry(a.model.as_str()).or_default().push(a);
  }

  fleets
    .into_iter()
    .map(|(model, fleet)| {
      let interval = phase_interval(model);
      let denominator = interval * fleet.len() as f64;
      let serials: HashSet<&str> = fleet.iter().map(|a| a.serial.as_str()).collect();
      let divisor = divisors.get(model).copied().unwrap_or(1.0);
      let mut remaining: f64 = fleet.iter().map(|a| a.hours_to_phase).sum();

      let mut period = reporting_period(today);
      let mut points = Vec::with_capacity(FORECAST_PERIODS);
      for _ in 0..FORECAST_PERIODS {
        let projected = inputs
          .projections
          .iter()
          .find(|p| p.model == model && p.reporting_month == period.end);
        remaining -= match projected {
          Some(p) => p.projected_hours / divisor,
          None => average_flying_hours(inputs.reports, &serials, period.end.month(), today),
        };

        let phases = inputs
          .maintenance
          .iter()
          .filter(|e| {
            e.maintenance_type == MaintenanceType::Phase
              && serials.contains(e.serial.as_str())
              && e.event_end.is_some_and(|end| period.contains(end))
          })
          .count();
        remaining += phases as f64 * interval;

        points.push(ForecastPoint {
          reporting_period_end: period.end,
          bank_percentage:      (round3(remaining / denominator) * 100.0).max(0.0),
        });
        period = period.next();
      }

      tracing::debug!(model, aircraft = fleet.len(), "forecast bank time");
      ModelForecast { model: model.to_owned(), points }
    })
    .collect()
}

// ─── DA-1352 status ──────────────────────────────────────────────────────────

/// Default DA-1352 window: two years back from the end of the current period.
pub fn default_1352_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
  let end = reporting_period(today).end;
  (two_years_prior(end), end)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusOverTime {
  pub reporting_month:       NaiveDate,
  pub total_fmc_hours:       f64,
  pub total_field_hours:     f64,
  pub total_pmcm_hours:      f64,
  pub total_pmcs_hours:      f64,
  pub total_dade_hours:      f64,
  pub total_sust_hours:      f64,
  pub total_nmcs_hours:      f64,
  pub total_nmcm_hours:      f64,
  pub total_hours_in_status: f64,
  pub fmc_rate:              f64,
  pub pmc_rate:              f64,
  pub nmc_rate:              f64,
}

/// Status hours summed per reporting month, oldest first, with FMC, PMC and
/// NMC shares of the hours in status. Anything neither FMC nor PMC counts as
/// NMC.
pub fn status_over_time(reports: &[Da1352]) -> Vec<StatusOverTime> {
  let mut months: BTreeMap<NaiveDate, StatusOverTime> = BTreeMap::new();
  for r in reports {
    let m = months.entry(r.reporting_month).or_insert_with(|| StatusOverTime {
      reporting_month: r.reporting_month,
      ..Default::default()
    });
    m.total_fmc_hours += r.fmc_hours;
    m.total_field_hours += r.field_hours;
    m.total_pmcm_hours += r.pmcm_hours;
    m.total_pmcs_hours += r.pmcs_hours;
    m.total_dade_hours += r.dade_hours;
    m.total_sust_hours += r.sust_hours;
    m.total_nmcs_hours += r.nmcs_hours;
    m.total_nmcm_hours += r.nmcm_hours;
    m.total_hours_in_status += r.total_hours_in_status;
  }

  months
    .into_values()
    .map(|mut m| {
      if m.total_hours_in_status > 0.0 {
        m.fmc_rate = m.total_fmc_hours / m.total_hours_in_status;
        m.pmc_rate = (m.total_pmcm_hours + m.total_pmcs_hours) / m.total_hours_in_status;
        m.nmc_rate = (1.0 - m.fmc_rate - m.pmc_rate).max(0.0);
      }
      m
    })
    .collect()
}
