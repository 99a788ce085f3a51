//! Soldiers, their versioned history rows, and MOS reference data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

// ─── Codes ───────────────────────────────────────────────────────────────────

/// Maintainer qualification tier.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize, EnumString, AsRefStr, Display, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum MaintenanceLevel {
  Ml0,
  Ml1,
  Ml2,
  Ml3,
  Ml4,
}

impl MaintenanceLevel {
  /// ML0 and ML1 maintainers count as inexperienced.
  pub fn is_inexperienced(self) -> bool { matches!(self, Self::Ml0 | Self::Ml1) }
}

/// Birth month as recorded on the soldier; `Unk` when never entered.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
  EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum BirthMonth {
  Jan,
  Feb,
  Mar,
  Apr,
  May,
  Jun,
  Jul,
  Aug,
  Sep,
  Oct,
  Nov,
  Dec,
  #[default]
  Unk,
}

impl BirthMonth {
  /// Calendar month number (1-12), or `None` for `Unk`.
  pub fn number(self) -> Option<u32> {
    match self {
      Self::Unk => None,
      m => Some(m as u32 + 1),
    }
  }
}

// ─── MOS ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosCode {
  pub mos:         String,
  pub description: String,
  /// Tracked by the maintainer assessment program.
  #[serde(default)]
  pub amtp_mos:    bool,
  /// Has an individual critical task list.
  #[serde(default)]
  pub ictl_mos:    bool,
}

// ─── Soldier ─────────────────────────────────────────────────────────────────

/// Current state of a soldier. Every write also appends a
/// [`SoldierSnapshot`] so reports can look the record up as of a past date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Soldier {
  /// EDIPI.
  pub user_id:        String,
  pub rank:           String,
  pub first_name:     String,
  pub last_name:      String,
  pub primary_mos:    Option<String>,
  pub additional_mos: Vec<String>,
  pub asi_codes:      Vec<String>,
  pub unit_uic:       String,
  pub is_admin:       bool,
  pub is_maintainer:  bool,
  pub dod_email:      Option<String>,
  pub birth_month:    BirthMonth,
  pub reporting_ml:   Option<MaintenanceLevel>,
}

fn default_true() -> bool { true }

/// Body accepted when creating or replacing a soldier.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSoldier {
  pub user_id:        String,
  pub rank:           String,
  pub first_name:     String,
  pub last_name:      String,
  pub primary_mos:    Option<String>,
  #[serde(default)]
  pub additional_mos: Vec<String>,
  #[serde(default)]
  pub asi_codes:      Vec<String>,
  pub unit_uic:       String,
  #[serde(default)]
  pub is_admin:       bool,
  #[serde(default = "default_true")]
  pub is_maintainer:  bool,
  pub dod_email:      Option<String>,
  #[serde(default)]
  pub birth_month:    BirthMonth,
  pub reporting_ml:   Option<MaintenanceLevel>,
}

impl From<NewSoldier> for Soldier {
  fn from(n: NewSoldier) -> Self {
    Soldier {
      user_id:        n.user_id,
      rank:           n.rank,
      first_name:     n.first_name,
      last_name:      n.last_name,
      primary_mos:    n.primary_mos,
      additional_mos: n.additional_mos,
      asi_codes:      n.asi_codes,
      unit_uic:       n.unit_uic,
      is_admin:       n.is_admin,
      is_maintainer:  n.is_maintainer,
      dod_email:      n.dod_email,
      birth_month:    n.birth_month,
      reporting_ml:   n.reporting_ml,
    }
  }
}

impl Soldier {
  /// First and last name as shown in report rows.
  pub fn name(&self) -> String { format!("{} {}", self.first_name, self.last_name) }

  pub fn name_and_rank(&self) -> String { format!("{} {}", self.rank, self.name()) }

  /// Freeze the current state into a history row effective at `at`.
  pub fn snapshot(&self, at: DateTime<Utc>) -> SoldierSnapshot {
    SoldierSnapshot {
      history_id:    Uuid::new_v4(),
      history_date:  at,
      user_id:       self.user_id.clone(),
      rank:          self.rank.clone(),
      first_name:    self.first_name.clone(),
      last_name:     self.last_name.clone(),
      primary_mos:   self.primary_mos.clone(),
      asi_codes:     self.asi_codes.clone(),
      unit_uic:      self.unit_uic.clone(),
      is_maintainer: self.is_maintainer,
      birth_month:   self.birth_month,
    }
  }
}

/// One immutable row of soldier history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoldierSnapshot {
  pub history_id:    Uuid,
  pub history_date:  DateTime<Utc>,
  pub user_id:       String,
  pub rank:          String,
  pub first_name:    String,
  pub last_name:     String,
  pub primary_mos:   Option<String>,
  pub asi_codes:     Vec<String>,
  pub unit_uic:      String,
  pub is_maintainer: bool,
  pub birth_month:   BirthMonth,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn birth_month_numbers() {
    assert_eq!(BirthMonth::Jan.number(), Some(1));
    assert_eq!(BirthMonth::Dec.number(), Some(12));
    assert_eq!(BirthMonth::Unk.number(), None);
    assert_eq!("MAR".parse::<BirthMonth>().unwrap(), BirthMonth::Mar);
  }

  #[test]
  fn maintenance_level_codes() {
    assert_eq!(MaintenanceLevel::Ml2.to_string(), "ML2");
    assert!(MaintenanceLevel::Ml1.is_inexperienced());
    assert!(!MaintenanceLevel::Ml2.is_inexperienced());
  }
}
