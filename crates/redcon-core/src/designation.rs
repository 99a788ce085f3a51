//! Soldier designations: named duties (e.g. "Phase Lead", "QA Inspector")
//! held for a window of time, optionally tied to a unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A designation type. `designation_type` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Designation {
  pub designation_type: String,
  pub description:      Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoldierDesignation {
  pub designation_id:      Uuid,
  pub user_id:             String,
  pub designation_type:    String,
  pub unit_uic:            Option<String>,
  pub start_date:          NaiveDate,
  /// `None` means the designation is held indefinitely.
  pub end_date:            Option<NaiveDate>,
  pub last_modified_by:    Option<String>,
  pub designation_removed: bool,
}

impl SoldierDesignation {
  pub fn is_active(&self, today: NaiveDate) -> bool {
    !self.designation_removed
      && self.start_date <= today
      && self.end_date.is_none_or(|end| today <= end)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSoldierDesignation {
  pub user_id:          String,
  pub designation_type: String,
  pub unit_uic:         Option<String>,
  /// Defaults to the day of creation.
  pub start_date:       Option<NaiveDate>,
  pub end_date:         Option<NaiveDate>,
}

impl NewSoldierDesignation {
  pub fn into_designation(self, today: NaiveDate, by: Option<String>) -> Result<SoldierDesignation> {
    let start_date = self.start_date.unwrap_or(today);
    if let Some(end) = self.end_date {
      crate::error::check_range(start_date, end)?;
    }
    if self.designation_type.trim().is_empty() {
      return Err(Error::InvalidDesignation("designation type is empty".into()));
    }
    Ok(SoldierDesignation {
      designation_id:      Uuid::new_v4(),
      user_id:             self.user_id,
      designation_type:    self.designation_type,
      unit_uic:            self.unit_uic,
      start_date,
      end_date:            self.end_date,
      last_modified_by:    by,
      designation_removed: false,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> NewSoldierDesignation {
    NewSoldierDesignation {
      user_id:          "1".into(),
      designation_type: "Phase Lead".into(),
      unit_uic:         Some("ACO".into()),
      start_date:       start,
      end_date:         end,
    }
  }

  #[test]
  fn start_defaults_to_today_and_open_end_stays_active() {
    let d = new(None, None).into_designation(ymd(2024, 4, 1), Some("9".into())).unwrap();
    assert_eq!(d.start_date, ymd(2024, 4, 1));
    assert!(!d.is_active(ymd(2024, 3, 31)));
    assert!(d.is_active(ymd(2030, 1, 1)));
    assert_eq!(d.last_modified_by.as_deref(), Some("9"));
  }

  #[test]
  fn window_and_removal_bound_activity() {
    let mut d = new(Some(ymd(2024, 1, 1)), Some(ymd(2024, 1, 31)))
      .into_designation(ymd(2024, 1, 1), None)
      .unwrap();
    assert!(d.is_active(ymd(2024, 1, 31)));
    assert!(!d.is_active(ymd(2024, 2, 1)));
    d.designation_removed = true;
    assert!(!d.is_active(ymd(2024, 1, 15)));
  }

  #[test]
  fn inverted_window_is_rejected() {
    let err = new(Some(ymd(2024, 2, 1)), Some(ymd(2024, 1, 1))).into_designation(ymd(2024, 1, 1), None);
    assert!(matches!(err, Err(Error::InvalidDateRange { .. })));
  }
}
