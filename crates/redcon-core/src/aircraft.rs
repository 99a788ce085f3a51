//! Aircraft fleet records: airframes, DA-1352 monthly reports, flight-hour
//! projections and scheduled maintenance.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Flight hours between phase inspections for a model, by model family.
pub fn phase_interval(model: &str) -> f64 {
  let m = model.to_ascii_uppercase();
  if m.starts_with("UH-60") || m.starts_with("HH-60") {
    480.0
  } else if m.starts_with("CH-47") {
    640.0
  } else {
    500.0
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aircraft {
  pub serial:               String,
  pub model:                String,
  /// Readiness status code, e.g. `FMC`, `PMCM`, `NMCS`.
  pub status:               String,
  pub rtl:                  String,
  pub current_unit:         String,
  pub total_airframe_hours: f64,
  #[serde(default)]
  pub flight_hours:         f64,
  pub hours_to_phase:       f64,
  #[serde(default)]
  pub in_phase:             bool,
  pub remarks:              Option<String>,
  pub date_down:            Option<NaiveDate>,
  pub ecd:                  Option<NaiveDate>,
}

/// One aircraft's DA-1352 line for a reporting month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Da1352 {
  pub serial:                 String,
  pub reporting_uic:          String,
  pub reporting_month:        NaiveDate,
  pub model:                  String,
  #[serde(default)]
  pub flying_hours:           f64,
  pub fmc_hours:              f64,
  pub field_hours:            f64,
  pub pmcm_hours:             f64,
  pub pmcs_hours:             f64,
  pub dade_hours:             f64,
  pub sust_hours:             f64,
  pub nmcs_hours:             f64,
  pub nmcm_hours:             f64,
  pub total_hours_in_status:  f64,
}

/// Hours a unit expects to fly a model during the period ending
/// `reporting_month`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProjection {
  pub unit_uic:        String,
  pub model:           String,
  pub reporting_month: NaiveDate,
  pub projected_hours: f64,
  pub source:          String,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString,
  AsRefStr, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum MaintenanceType {
  Phase,
  Inspection,
  Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceEvent {
  pub event_id:         Uuid,
  pub serial:           String,
  pub maintenance_type: MaintenanceType,
  pub name:             String,
  pub event_start:      NaiveDate,
  pub event_end:        Option<NaiveDate>,
  pub lane:             Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMaintenanceEvent {
  pub serial:           String,
  pub maintenance_type: MaintenanceType,
  pub name:             String,
  pub event_start:      NaiveDate,
  pub event_end:        Option<NaiveDate>,
  pub lane:             Option<String>,
}

impl From<NewMaintenanceEvent> for MaintenanceEvent {
  fn from(n: NewMaintenanceEvent) -> Self {
    MaintenanceEvent {
      event_id:         Uuid::new_v4(),
      serial:           n.serial,
      maintenance_type: n.maintenance_type,
      name:             n.name,
      event_start:      n.event_start,
      event_end:        n.event_end,
      lane:             n.lane,
    }
  }
}
