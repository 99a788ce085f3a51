//! Shared builders for report tests.
//!
//! The tree is:
//!
//! ```text
//! BN
//! ├── ACO
//! │   └── APLT
//! └── BCO
//! ```

use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use super::{Dataset, DatasetParts, RosterFilter};
use crate::{
  event::{Event, EventTask, EventType, GoNoGo},
  flag::{FlagType, MxAvailability, NewFlag, SoldierFlag},
  soldier::{BirthMonth, MaintenanceLevel, MosCode, NewSoldier, Soldier},
  unit::{Component, Echelon, NewUnit, Unit, UnitTree},
};

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn unit(uic: &str, echelon: Echelon, parent: Option<&str>) -> Unit {
  Unit::from(NewUnit {
    uic:          uic.into(),
    short_name:   format!("{uic} short"),
    display_name: format!("{uic} display"),
    nick_name:    None,
    echelon,
    component:    Component::Active,
    state:        None,
    parent_uic:   parent.map(str::to_owned),
    start_date:   None,
    end_date:     None,
  })
}

pub struct Fixture {
  pub parts: DatasetParts,
}

impl Fixture {
  pub fn new() -> Self {
    let units = UnitTree::build(vec![
      unit("BN", Echelon::Bn, None),
      unit("ACO", Echelon::Co, Some("BN")),
      unit("APLT", Echelon::Plt, Some("ACO")),
      unit("BCO", Echelon::Co, Some("BN")),
    ])
    .unwrap()
    .into_units();

    let mos = vec![
      MosCode { mos: "15R".into(), description: "Attack Repairer".into(), amtp_mos: true, ictl_mos: true },
      MosCode { mos: "15T".into(), description: "Utility Repairer".into(), amtp_mos: true, ictl_mos: true },
      MosCode { mos: "92Y".into(), description: "Supply".into(), amtp_mos: false, ictl_mos: false },
    ];

    Fixture { parts: DatasetParts { units, mos, ..Default::default() } }
  }

  pub fn unit(&self, uic: &str) -> Unit {
    self.parts.units.iter().find(|u| u.uic == uic).cloned().unwrap()
  }

  /// Add a maintainer who joined `unit` on `joined`.
  pub fn soldier(
    &mut self,
    user_id: &str,
    last_name: &str,
    unit: &str,
    mos: &str,
    birth_month: BirthMonth,
    joined: NaiveDate,
  ) -> &mut Self {
    let soldier = Soldier::from(NewSoldier {
      user_id:        user_id.into(),
      rank:           "SGT".into(),
      first_name:     "Pat".into(),
      last_name:      last_name.into(),
      primary_mos:    Some(mos.into()),
      additional_mos: vec![],
      asi_codes:      vec![],
      unit_uic:       unit.into(),
      is_admin:       false,
      is_maintainer:  true,
      dod_email:      Some(format!("{user_id}@army.mil")),
      birth_month,
      reporting_ml:   None,
    });
    let at = Utc.from_utc_datetime(&joined.and_hms_opt(9, 0, 0).unwrap());
    self.parts.history.push(soldier.snapshot(at));
    self.parts.soldiers.retain(|s| s.user_id != user_id);
    self.parts.soldiers.push(soldier);
    self
  }

  /// Move an existing soldier to `unit` on `on`.
  pub fn transfer(&mut self, user_id: &str, unit: &str, on: NaiveDate) -> &mut Self {
    let soldier = self.parts.soldiers.iter_mut().find(|s| s.user_id == user_id).unwrap();
    soldier.unit_uic = unit.into();
    let at = Utc.from_utc_datetime(&on.and_hms_opt(9, 0, 0).unwrap());
    self.parts.history.push(soldier.snapshot(at));
    self
  }

  pub fn event(
    &mut self,
    user_id: &str,
    date: NaiveDate,
    event_type: EventType,
    go_nogo: Option<GoNoGo>,
    ml: Option<MaintenanceLevel>,
  ) -> &mut Self {
    self.parts.events.push(Event {
      event_id:          Uuid::new_v4(),
      user_id:           user_id.into(),
      date,
      uic:               None,
      event_type,
      evaluation_type:   None,
      training_type:     None,
      award_type:        None,
      mos:               None,
      go_nogo,
      total_mx_hours:    Some(4.0),
      comment:           String::new(),
      maintenance_level: ml,
      recorded_by:       None,
      event_deleted:     false,
      tasks:             vec![EventTask {
        task_number: "T-001".into(),
        task_name:   Some("Inspect rotor".into()),
        go_nogo:     GoNoGo::Go,
      }],
    });
    self
  }

  pub fn ml(&mut self, user_id: &str, date: NaiveDate, ml: MaintenanceLevel) -> &mut Self {
    self.event(user_id, date, EventType::Training, None, Some(ml))
  }

  pub fn go_eval(&mut self, user_id: &str, date: NaiveDate) -> &mut Self {
    self.event(user_id, date, EventType::Evaluation, Some(GoNoGo::Go), None)
  }

  pub fn flag(
    &mut self,
    user_id: Option<&str>,
    unit_uic: Option<&str>,
    mx: MxAvailability,
    start: NaiveDate,
    end: Option<NaiveDate>,
  ) -> SoldierFlag {
    let flag = NewFlag {
      user_id:         user_id.map(str::to_owned),
      unit_uic:        unit_uic.map(str::to_owned),
      flag_type:       FlagType::Profile,
      info:            Some("profile".into()),
      mx_availability: mx,
      start_date:      start,
      end_date:        end,
      remarks:         Some("remark".into()),
    }
    .into_flag(Some("0000000001".into()));
    self.parts.flags.push(flag.clone());
    flag
  }

  pub fn dataset(&self, root: &str, start: NaiveDate, end: NaiveDate) -> Dataset {
    let scope = self.unit(root).with_subordinates();
    Dataset::build(self.parts.clone(), &scope, start, end, RosterFilter::AmtpMaintainers)
  }

  pub fn dataset_all_maintainers(&self, root: &str, start: NaiveDate, end: NaiveDate) -> Dataset {
    let scope = self.unit(root).with_subordinates();
    Dataset::build(self.parts.clone(), &scope, start, end, RosterFilter::Maintainers)
  }
}
