//! User roles and unit-scoped permission checks.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{soldier::Soldier, unit::Unit};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString,
  AsRefStr, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum AccessLevel {
  Admin,
  Manager,
  Evaluator,
  Viewer,
}

/// A grant of `access_level` on `unit_uic`. Unique per (user, unit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
  pub user_id:      String,
  pub unit_uic:     String,
  pub access_level: AccessLevel,
}

/// Admins see every unit. Everyone else needs a role on the unit or on one of
/// its ancestors.
pub fn can_view_unit(user: &Soldier, roles: &[UserRole], unit: &Unit) -> bool {
  if user.is_admin {
    return true;
  }
  let lineage = unit.lineage();
  roles
    .iter()
    .any(|r| r.user_id == user.user_id && lineage.contains(&r.unit_uic))
}

/// Managers (and admins) may edit records in units they manage.
pub fn can_manage_unit(user: &Soldier, roles: &[UserRole], unit: &Unit) -> bool {
  if user.is_admin {
    return true;
  }
  let lineage = unit.lineage();
  roles.iter().any(|r| {
    r.user_id == user.user_id
      && lineage.contains(&r.unit_uic)
      && matches!(r.access_level, AccessLevel::Admin | AccessLevel::Manager)
  })
}
