//! Soldier and unit flags: time-windowed restrictions on maintenance
//! availability.
//!
//! A flag targets a soldier, a unit, or both. Unit flags apply to every
//! soldier whose unit lineage contains the flagged unit. Deletion is soft; a
//! deleted flag never counts as active.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Codes ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString,
  AsRefStr, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagType {
  Admin,
  UnitOrPos,
  Tasking,
  Profile,
  Other,
}

/// How a flag restricts the soldier's maintenance duties.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
  EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum MxAvailability {
  Available,
  Limited,
  #[default]
  Unavailable,
}

impl MxAvailability {
  fn severity(self) -> u8 {
    match self {
      Self::Available => 0,
      Self::Limited => 1,
      Self::Unavailable => 2,
    }
  }
}

// ─── Flag ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoldierFlag {
  pub flag_id:          Uuid,
  pub user_id:          Option<String>,
  pub unit_uic:         Option<String>,
  pub flag_type:        FlagType,
  /// Type-specific detail, e.g. the profile or tasking description.
  pub info:             Option<String>,
  pub mx_availability:  MxAvailability,
  pub start_date:       NaiveDate,
  pub end_date:         Option<NaiveDate>,
  pub remarks:          Option<String>,
  pub created_by:       Option<String>,
  pub last_modified_by: Option<String>,
  pub flag_deleted:     bool,
}

impl SoldierFlag {
  pub fn is_active(&self, today: NaiveDate) -> bool {
    !self.flag_deleted
      && self.start_date <= today
      && self.end_date.is_none_or(|end| today <= end)
  }

  pub fn is_active_or_future(&self, today: NaiveDate) -> bool {
    !self.flag_deleted && self.end_date.is_none_or(|end| today <= end)
  }

  /// Whether the flag is in force at any point of `[start, end]`.
  pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
    !self.flag_deleted
      && self.start_date <= end
      && self.end_date.is_none_or(|e| e >= start)
  }

  /// Whether the flag targets `user_id` directly or through one of the units
  /// in `lineage`.
  pub fn applies_to(&self, user_id: &str, lineage: &[String]) -> bool {
    self.user_id.as_deref() == Some(user_id)
      || self.unit_uic.as_ref().is_some_and(|u| lineage.contains(u))
  }
}

/// Body accepted when creating a flag.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFlag {
  pub user_id:         Option<String>,
  pub unit_uic:        Option<String>,
  pub flag_type:       FlagType,
  pub info:            Option<String>,
  #[serde(default)]
  pub mx_availability: MxAvailability,
  pub start_date:      NaiveDate,
  pub end_date:        Option<NaiveDate>,
  pub remarks:         Option<String>,
}

impl NewFlag {
  pub fn validate(&self) -> Result<()> {
    if self.user_id.is_none() && self.unit_uic.is_none() {
      return Err(Error::InvalidFlag(
        "a flag must reference a soldier or a unit".into(),
      ));
    }
    check_window(self.start_date, self.end_date)
  }

  pub fn into_flag(self, created_by: Option<String>) -> SoldierFlag {
    SoldierFlag {
      flag_id:          Uuid::new_v4(),
      user_id:          self.user_id,
      unit_uic:         self.unit_uic,
      flag_type:        self.flag_type,
      info:             self.info,
      mx_availability:  self.mx_availability,
      start_date:       self.start_date,
      end_date:         self.end_date,
      remarks:          self.remarks,
      last_modified_by: created_by.clone(),
      created_by,
      flag_deleted:     false,
    }
  }
}

fn check_window(start: NaiveDate, end: Option<NaiveDate>) -> Result<()> {
  match end {
    Some(end) if end < start => Err(Error::InvalidFlag(format!(
      "end date {end} is before start date {start}"
    ))),
    _ => Ok(()),
  }
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlagUpdate {
  pub flag_type:       Option<FlagType>,
  pub info:            Option<String>,
  pub mx_availability: Option<MxAvailability>,
  pub start_date:      Option<NaiveDate>,
  pub end_date:        Option<NaiveDate>,
  /// Make the flag open-ended. Ignored when `end_date` is also set.
  #[serde(default)]
  pub clear_end_date:  bool,
  pub remarks:         Option<String>,
}

impl FlagUpdate {
  /// Apply the update in place. Changing the flag type without supplying new
  /// info drops the old type's info.
  pub fn apply(self, flag: &mut SoldierFlag, modified_by: Option<String>) -> Result<()> {
    let start = self.start_date.unwrap_or(flag.start_date);
    let end = match (self.end_date, self.clear_end_date) {
      (Some(end), _) => Some(end),
      (None, true) => None,
      (None, false) => flag.end_date,
    };
    check_window(start, end)?;

    if let Some(t) = self.flag_type
      && t != flag.flag_type
    {
      flag.flag_type = t;
      flag.info = None;
    }
    if let Some(info) = self.info {
      flag.info = Some(info);
    }
    if let Some(mx) = self.mx_availability {
      flag.mx_availability = mx;
    }
    if let Some(remarks) = self.remarks {
      flag.remarks = Some(remarks);
    }
    flag.start_date       = start;
    flag.end_date         = end;
    flag.last_modified_by = modified_by;
    Ok(())
  }
}

// ─── Availability ────────────────────────────────────────────────────────────

/// Effective availability of a soldier after applying their flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Availability {
  Available,
  Limited,
  Unavailable,
}

impl Availability {
  pub fn label(self) -> &'static str {
    match self {
      Self::Available => "Available",
      Self::Limited => "Available - Limited",
      Self::Unavailable => "Unavailable",
    }
  }

  pub fn from_flag(flag: Option<&SoldierFlag>) -> Self {
    match flag.map(|f| f.mx_availability) {
      Some(MxAvailability::Unavailable) => Self::Unavailable,
      Some(MxAvailability::Limited) => Self::Limited,
      _ => Self::Available,
    }
  }
}

/// The flag that decides a soldier's availability: Unavailable beats Limited,
/// flags marked Available never restrict, ties go to the latest start date.
pub fn most_restrictive<'a, I>(flags: I) -> Option<&'a SoldierFlag>
where
  I: IntoIterator<Item = &'a SoldierFlag>,
{
  flags
    .into_iter()
    .filter(|f| !f.flag_deleted && f.mx_availability.severity() > 0)
    .max_by_key(|f| (f.mx_availability.severity(), f.start_date))
}

/// Display text for a flag's type-specific info.
pub fn flag_info_label(flag: &SoldierFlag) -> Option<String> {
  flag.info.clone().or_else(|| {
    (flag.flag_type == FlagType::Other).then(|| "See Flag Remarks".to_owned())
  })
}

/// Flag details attached to report rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagDetails {
  pub status:      String,
  pub flag_info:   Option<String>,
  pub remarks:     Option<String>,
  pub start_date:  NaiveDate,
  pub end_date:    Option<NaiveDate>,
  pub flag_type:   FlagType,
  pub recorded_by: Option<String>,
  pub updated_by:  Option<String>,
  pub unit:        Option<String>,
}

impl FlagDetails {
  pub fn from_flag(flag: &SoldierFlag) -> Self {
    FlagDetails {
      status:      Availability::from_flag(Some(flag)).label().to_owned(),
      flag_info:   flag_info_label(flag),
      remarks:     flag.remarks.clone(),
      start_date:  flag.start_date,
      end_date:    flag.end_date,
      flag_type:   flag.flag_type,
      recorded_by: flag.created_by.clone(),
      updated_by:  flag.last_modified_by.clone(),
      unit:        flag.unit_uic.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  fn flag(mx: MxAvailability, start: NaiveDate, end: Option<NaiveDate>) -> SoldierFlag {
    NewFlag {
      user_id:         Some("1".into()),
      unit_uic:        None,
      flag_type:       FlagType::Profile,
      info:            Some("knee".into()),
      mx_availability: mx,
      start_date:      start,
      end_date:        end,
      remarks:         None,
    }
    .into_flag(None)
  }

  #[test]
  fn flag_requires_a_target() {
    let new = NewFlag {
      user_id:         None,
      unit_uic:        None,
      flag_type:       FlagType::Admin,
      info:            None,
      mx_availability: MxAvailability::Unavailable,
      start_date:      ymd(2024, 1, 1),
      end_date:        None,
      remarks:         None,
    };
    assert!(matches!(new.validate(), Err(Error::InvalidFlag(_))));
  }

  #[test]
  fn end_before_start_is_rejected() {
    let mut new = NewFlag {
      user_id:         Some("1".into()),
      unit_uic:        None,
      flag_type:       FlagType::Admin,
      info:            None,
      mx_availability: MxAvailability::Unavailable,
      start_date:      ymd(2024, 2, 1),
      end_date:        Some(ymd(2024, 1, 1)),
      remarks:         None,
    };
    assert!(new.validate().is_err());
    new.end_date = Some(ymd(2024, 2, 1));
    assert!(new.validate().is_ok());
  }

  #[test]
  fn activity_windows() {
    let f = flag(MxAvailability::Limited, ymd(2024, 1, 10), Some(ymd(2024, 1, 20)));
    assert!(!f.is_active(ymd(2024, 1, 9)));
    assert!(f.is_active(ymd(2024, 1, 10)));
    assert!(f.is_active(ymd(2024, 1, 20)));
    assert!(!f.is_active(ymd(2024, 1, 21)));
    assert!(f.is_active_or_future(ymd(2024, 1, 1)));
    assert!(f.overlaps(ymd(2024, 1, 20), ymd(2024, 2, 1)));
    assert!(!f.overlaps(ymd(2024, 1, 21), ymd(2024, 2, 1)));

    let mut deleted = f.clone();
    deleted.flag_deleted = true;
    assert!(!deleted.is_active(ymd(2024, 1, 15)));
  }

  #[test]
  fn unavailable_beats_limited() {
    let limited = flag(MxAvailability::Limited, ymd(2024, 3, 1), None);
    let unavailable = flag(MxAvailability::Unavailable, ymd(2024, 1, 1), None);
    let picked = most_restrictive([&limited, &unavailable]).unwrap();
    assert_eq!(picked.flag_id, unavailable.flag_id);
    assert_eq!(Availability::from_flag(Some(picked)).label(), "Unavailable");
  }

  #[test]
  fn tie_goes_to_latest_start() {
    let early = flag(MxAvailability::Limited, ymd(2024, 1, 1), None);
    let late = flag(MxAvailability::Limited, ymd(2024, 2, 1), None);
    assert_eq!(most_restrictive([&early, &late]).unwrap().flag_id, late.flag_id);
  }

  #[test]
  fn available_flags_do_not_restrict() {
    let f = flag(MxAvailability::Available, ymd(2024, 1, 1), None);
    assert!(most_restrictive([&f]).is_none());
    assert_eq!(Availability::from_flag(None).label(), "Available");
  }

  #[test]
  fn changing_type_clears_info() {
    let mut f = flag(MxAvailability::Limited, ymd(2024, 1, 1), None);
    FlagUpdate { flag_type: Some(FlagType::Tasking), ..Default::default() }
      .apply(&mut f, Some("99".into()))
      .unwrap();
    assert_eq!(f.flag_type, FlagType::Tasking);
    assert_eq!(f.info, None);
    assert_eq!(f.last_modified_by.as_deref(), Some("99"));
  }

  #[test]
  fn update_rejects_inverted_window() {
    let mut f = flag(MxAvailability::Limited, ymd(2024, 5, 1), None);
    let err = FlagUpdate { end_date: Some(ymd(2024, 4, 1)), ..Default::default() }
      .apply(&mut f, None);
    assert!(err.is_err());
    assert_eq!(f.end_date, None);
  }

  #[test]
  fn other_flags_fall_back_to_remarks_label() {
    let mut f = flag(MxAvailability::Limited, ymd(2024, 1, 1), None);
    f.flag_type = FlagType::Other;
    f.info = None;
    assert_eq!(flag_info_label(&f).as_deref(), Some("See Flag Remarks"));
  }
}
