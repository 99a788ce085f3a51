//! Flight records and flight-hour rollups.
//!
//! Hours are logged by condition: day (`D`), day system (`DS`), night (`N`),
//! night goggles (`NG`), night system (`NS`), hood (`H`) and weather (`W`).
//! Day flying is `D + DS`; night flying is `N + NS + NG`.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::period::{ReportingPeriod, fiscal_year, reporting_period};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
  /// Unique per flight.
  pub flight_id:           String,
  pub serial:              String,
  /// Filled from the aircraft when recorded.
  #[serde(default)]
  pub model:               String,
  pub unit_uic:            String,
  pub mission_type:        String,
  pub start:               DateTime<Utc>,
  pub stop:                Option<DateTime<Utc>>,
  #[serde(default)]
  pub day_hours:           f64,
  #[serde(default)]
  pub day_system_hours:    f64,
  #[serde(default)]
  pub night_hours:         f64,
  #[serde(default)]
  pub night_goggles_hours: f64,
  #[serde(default)]
  pub night_system_hours:  f64,
  #[serde(default)]
  pub hood_hours:          f64,
  #[serde(default)]
  pub weather_hours:       f64,
}

impl Flight {
  pub fn day_flying(&self) -> f64 { self.day_hours + self.day_system_hours }

  pub fn night_flying(&self) -> f64 {
    self.night_hours + self.night_system_hours + self.night_goggles_hours
  }

  pub fn total_hours(&self) -> f64 { self.day_flying() + self.night_flying() }

  pub fn date(&self) -> NaiveDate { self.start.date_naive() }

  fn hours(&self, category: HourCategory) -> f64 {
    match category {
      HourCategory::Day => self.day_flying(),
      HourCategory::Night => self.night_flying(),
      HourCategory::NightGoggles => self.night_goggles_hours,
      HourCategory::Hood => self.hood_hours,
      HourCategory::Weather => self.weather_hours,
      HourCategory::Total => self.total_hours(),
    }
  }
}

fn round1(x: f64) -> f64 { (x * 10.0).round() / 10.0 }

/// The window flight reports cover by default: the current reporting period
/// and the eleven before it.
pub fn default_flight_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
  let mut p = reporting_period(today);
  let end = p.end;
  for _ in 1..12 {
    p = p.previous();
  }
  (p.start, end)
}

// ─── Day and night ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayNightPeriod {
  /// Last day of the reporting period.
  pub reporting_period: NaiveDate,
  pub day_hours:        f64,
  pub night_hours:      f64,
  pub total_hours:      f64,
  pub day_percentage:   f64,
  pub night_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionTypePeriod {
  pub reporting_period:  NaiveDate,
  pub mission_type:      String,
  pub hours_logged:      f64,
  pub number_of_flights: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayNightReport {
  pub day_and_night_data: Vec<DayNightPeriod>,
  pub mission_type_data:  Vec<MissionTypePeriod>,
}

/// Day/night split and per-mission totals, grouped by the reporting period
/// each flight started in. Periods with no hours report 0%.
pub fn day_night(flights: &[Flight]) -> DayNightReport {
  let mut periods: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
  let mut missions: BTreeMap<(NaiveDate, &str), (f64, usize)> = BTreeMap::new();
  for f in flights {
    let end = reporting_period(f.date()).end;
    let p = periods.entry(end).or_default();
    p.0 += f.day_flying();
    p.1 += f.night_flying();
    let m = missions.entry((end, f.mission_type.as_str())).or_default();
    m.0 += f.total_hours();
    m.1 += 1;
  }

  let share = |part: f64, total: f64| if total > 0.0 { part / total } else { 0.0 };
  DayNightReport {
    day_and_night_data: periods
      .into_iter()
      .map(|(end, (day, night))| DayNightPeriod {
        reporting_period: end,
        day_hours:        round1(day),
        night_hours:      round1(night),
        total_hours:      round1(day + night),
        day_percentage:   share(day, day + night),
        night_percentage: share(night, day + night),
      })
      .collect(),
    mission_type_data:  missions
      .into_iter()
      .map(|((end, mission), (hours, n))| MissionTypePeriod {
        reporting_period:  end,
        mission_type:      mission.to_owned(),
        hours_logged:      round1(hours),
        number_of_flights: n,
      })
      .collect(),
  }
}

// ─── Hours by category ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourCategory {
  Day,
  Night,
  NightGoggles,
  Hood,
  Weather,
  Total,
}

impl HourCategory {
  pub const ALL: [HourCategory; 6] = [
    Self::Day,
    Self::Night,
    Self::NightGoggles,
    Self::Hood,
    Self::Weather,
    Self::Total,
  ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHours {
  pub model:               String,
  pub reporting_period:    f64,
  pub fiscal_year_to_date: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryHours {
  pub category:            HourCategory,
  pub reporting_period:    f64,
  pub fiscal_year_to_date: f64,
  pub models:              Vec<ModelHours>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightHoursSummary {
  pub period:      ReportingPeriod,
  pub fiscal_year: i32,
  pub categories:  Vec<CategoryHours>,
}

/// First day of the fiscal year containing `date`.
pub fn fiscal_year_start(date: NaiveDate) -> NaiveDate {
  NaiveDate::from_ymd_opt(fiscal_year(date) - 1, 10, 1).unwrap_or(NaiveDate::MIN)
}

/// Hours flown in each category during `period` and during the fiscal year
/// through the end of `period`, in total and per model.
pub fn flight_hours_summary(flights: &[Flight], period: ReportingPeriod) -> FlightHoursSummary {
  let fy_start = fiscal_year_start(period.end);
  let in_fy: Vec<&Flight> = flights
    .iter()
    .filter(|f| fy_start <= f.date() && f.date() <= period.end)
    .collect();

  let categories = HourCategory::ALL
    .into_iter()
    .map(|category| {
      let mut models: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
      for f in &in_fy {
        let entry = models.entry(f.model.as_str()).or_default();
        let hours = f.hours(category);
        entry.1 += hours;
        if period.contains(f.date()) {
          entry.0 += hours;
        }
      }
      CategoryHours {
        category,
        reporting_period: round1(models.values().map(|m| m.0).sum()),
        fiscal_year_to_date: round1(models.values().map(|m| m.1).sum()),
        models: models
          .into_iter()
          .map(|(model, (rp, fy))| ModelHours {
            model:               model.to_owned(),
            reporting_period:    round1(rp),
            fiscal_year_to_date: round1(fy),
          })
          .collect(),
      }
    })
    .collect();

  FlightHoursSummary { period, fiscal_year: fiscal_year(period.end), categories }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  fn flight(id: &str, model: &str, mission: &str, day: NaiveDate, d: f64, n: f64, ng: f64) -> Flight {
    Flight {
      flight_id:           id.into(),
      serial:              format!("{model}-1"),
      model:               model.into(),
      unit_uic:            "ACO".into(),
      mission_type:        mission.into(),
      start:               Utc.from_utc_datetime(&day.and_hms_opt(10, 0, 0).unwrap()),
      stop:                None,
      day_hours:           d,
      day_system_hours:    0.0,
      night_hours:         n,
      night_goggles_hours: ng,
      night_system_hours:  0.0,
      hood_hours:          0.0,
      weather_hours:       0.0,
    }
  }

  #[test]
  fn day_night_groups_by_reporting_period() {
    let flights = vec![
      flight("1", "UH-60M", "TRAINING", ymd(2024, 1, 20), 3.0, 0.0, 0.0),
      flight("2", "UH-60M", "TRAINING", ymd(2024, 2, 10), 0.0, 0.5, 0.5),
      flight("3", "AH-64E", "COMBAT", ymd(2024, 2, 16), 1.0, 0.0, 0.0),
    ];
    let report = day_night(&flights);

    assert_eq!(report.day_and_night_data.len(), 2);
    let feb = &report.day_and_night_data[0];
    assert_eq!(feb.reporting_period, ymd(2024, 2, 15));
    assert_eq!((feb.day_hours, feb.night_hours, feb.total_hours), (3.0, 1.0, 4.0));
    assert_eq!(feb.day_percentage, 0.75);

    let missions: Vec<_> = report
      .mission_type_data
      .iter()
      .map(|m| (m.reporting_period, m.mission_type.as_str(), m.number_of_flights))
      .collect();
    assert_eq!(missions, vec![
      (ymd(2024, 2, 15), "TRAINING", 2),
      (ymd(2024, 3, 15), "COMBAT", 1),
    ]);
  }

  #[test]
  fn summary_splits_period_and_fiscal_year() {
    let flights = vec![
      flight("1", "UH-60M", "T", ymd(2023, 9, 30), 9.0, 0.0, 0.0),
      flight("2", "UH-60M", "T", ymd(2023, 10, 1), 1.25, 0.0, 0.0),
      flight("3", "UH-60M", "T", ymd(2024, 3, 1), 2.0, 1.0, 1.0),
      flight("4", "AH-64E", "T", ymd(2024, 3, 10), 0.0, 0.0, 2.0),
      flight("5", "AH-64E", "T", ymd(2024, 3, 16), 5.0, 0.0, 0.0),
    ];
    let period = reporting_period(ymd(2024, 3, 1));
    let summary = flight_hours_summary(&flights, period);
    assert_eq!(summary.fiscal_year, 2024);

    let day = &summary.categories[0];
    assert_eq!(day.category, HourCategory::Day);
    assert_eq!(day.reporting_period, 2.0);
    assert_eq!(day.fiscal_year_to_date, 3.3);

    let goggles = summary.categories.iter().find(|c| c.category == HourCategory::NightGoggles).unwrap();
    assert_eq!(goggles.reporting_period, 3.0);
    let models: Vec<_> = goggles.models.iter().map(|m| (m.model.as_str(), m.reporting_period)).collect();
    assert_eq!(models, vec![("AH-64E", 2.0), ("UH-60M", 1.0)]);
  }

  #[test]
  fn default_range_covers_twelve_periods() {
    let (start, end) = default_flight_range(ymd(2024, 3, 1));
    assert_eq!(end, ymd(2024, 3, 15));
    assert_eq!(start, ymd(2023, 3, 16));
  }
}
