//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 UTC strings with fixed microsecond precision so
//! that they sort lexically. Dates are `YYYY-MM-DD`. Code enums are stored by
//! their `strum` names and string lists as compact JSON arrays.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use redcon_core::{
  aircraft::{Aircraft, Da1352, MaintenanceEvent, MonthlyProjection},
  designation::SoldierDesignation,
  event::{Event, EventTask},
  flag::SoldierFlag,
  flight::Flight,
  notification::{Notification, SoldierNotification},
  request::{AccessRequest, TransferRequest},
  soldier::{Soldier, SoldierSnapshot},
  task::{Ictl, Task},
  unit::Unit,
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

pub fn encode_list(items: &[String]) -> Result<String> { Ok(serde_json::to_string(items)?) }

pub fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

/// Parse a stored code column, reporting the column's meaning on failure.
pub fn decode_code<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| redcon_core::Error::unknown_code(kind, s).into())
}

fn decode_opt_code<T: FromStr>(kind: &'static str, s: Option<String>) -> Result<Option<T>> {
  s.as_deref().map(|v| decode_code(kind, v)).transpose()
}

// ─── Units ───────────────────────────────────────────────────────────────────

pub const UNIT_COLUMNS: &str = "uic, short_name, display_name, nick_name, echelon, component, \
   state, parent_uic, start_date, end_date, level, parent_uics, child_uics, subordinate_uics";

pub struct RawUnit {
  pub uic:              String,
  pub short_name:       String,
  pub display_name:     String,
  pub nick_name:        Option<String>,
  pub echelon:          String,
  pub component:        String,
  pub state:            Option<String>,
  pub parent_uic:       Option<String>,
  pub start_date:       Option<String>,
  pub end_date:         Option<String>,
  pub level:            u32,
  pub parent_uics:      String,
  pub child_uics:       String,
  pub subordinate_uics: String,
}

impl RawUnit {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawUnit {
      uic:              row.get(0)?,
      short_name:       row.get(1)?,
      display_name:     row.get(2)?,
      nick_name:        row.get(3)?,
      echelon:          row.get(4)?,
      component:        row.get(5)?,
      state:            row.get(6)?,
      parent_uic:       row.get(7)?,
      start_date:       row.get(8)?,
      end_date:         row.get(9)?,
      level:            row.get(10)?,
      parent_uics:      row.get(11)?,
      child_uics:       row.get(12)?,
      subordinate_uics: row.get(13)?,
    })
  }

  pub fn from_unit(u: &Unit) -> Result<Self> {
    Ok(RawUnit {
      uic:              u.uic.clone(),
      short_name:       u.short_name.clone(),
      display_name:     u.display_name.clone(),
      nick_name:        u.nick_name.clone(),
      echelon:          u.echelon.as_ref().to_owned(),
      component:        u.component.as_ref().to_owned(),
      state:            u.state.clone(),
      parent_uic:       u.parent_uic.clone(),
      start_date:       u.start_date.map(encode_date),
      end_date:         u.end_date.map(encode_date),
      level:            u.level,
      parent_uics:      encode_list(&u.parent_uics)?,
      child_uics:       encode_list(&u.child_uics)?,
      subordinate_uics: encode_list(&u.subordinate_uics)?,
    })
  }

  pub fn into_unit(self) -> Result<Unit> {
    Ok(Unit {
      echelon:          decode_code("echelon", &self.echelon)?,
      component:        decode_code("component", &self.component)?,
      start_date:       decode_opt_date(self.start_date)?,
      end_date:         decode_opt_date(self.end_date)?,
      parent_uics:      decode_list(&self.parent_uics)?,
      child_uics:       decode_list(&self.child_uics)?,
      subordinate_uics: decode_list(&self.subordinate_uics)?,
      uic:              self.uic,
      short_name:       self.short_name,
      display_name:     self.display_name,
      nick_name:        self.nick_name,
      state:            self.state,
      parent_uic:       self.parent_uic,
      level:            self.level,
    })
  }
}

// ─── Soldiers ────────────────────────────────────────────────────────────────

pub const SOLDIER_COLUMNS: &str = "user_id, rank, first_name, last_name, primary_mos, \
   additional_mos, asi_codes, unit_uic, is_admin, is_maintainer, dod_email, birth_month, \
   reporting_ml";

pub struct RawSoldier {
  pub user_id:        String,
  pub rank:           String,
  pub first_name:     String,
  pub last_name:      String,
  pub primary_mos:    Option<String>,
  pub additional_mos: String,
  pub asi_codes:      String,
  pub unit_uic:       String,
  pub is_admin:       bool,
  pub is_maintainer:  bool,
  pub dod_email:      Option<String>,
  pub birth_month:    String,
  pub reporting_ml:   Option<String>,
}

impl RawSoldier {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawSoldier {
      user_id:        row.get(0)?,
      rank:           row.get(1)?,
      first_name:     row.get(2)?,
      last_name:      row.get(3)?,
      primary_mos:    row.get(4)?,
      additional_mos: row.get(5)?,
      asi_codes:      row.get(6)?,
      unit_uic:       row.get(7)?,
      is_admin:       row.get(8)?,
      is_maintainer:  row.get(9)?,
      dod_email:      row.get(10)?,
      birth_month:    row.get(11)?,
      reporting_ml:   row.get(12)?,
    })
  }

  pub fn into_soldier(self) -> Result<Soldier> {
    Ok(Soldier {
      additional_mos: decode_list(&self.additional_mos)?,
      asi_codes:      decode_list(&self.asi_codes)?,
      birth_month:    decode_code("birth month", &self.birth_month)?,
      reporting_ml:   decode_opt_code("maintenance level", self.reporting_ml)?,
      user_id:        self.user_id,
      rank:           self.rank,
      first_name:     self.first_name,
      last_name:      self.last_name,
      primary_mos:    self.primary_mos,
      unit_uic:       self.unit_uic,
      is_admin:       self.is_admin,
      is_maintainer:  self.is_maintainer,
      dod_email:      self.dod_email,
    })
  }
}

pub const SNAPSHOT_COLUMNS: &str = "history_id, history_date, user_id, rank, first_name, \
   last_name, primary_mos, asi_codes, unit_uic, is_maintainer, birth_month";

pub struct RawSnapshot {
  pub history_id:    String,
  pub history_date:  String,
  pub user_id:       String,
  pub rank:          String,
  pub first_name:    String,
  pub last_name:     String,
  pub primary_mos:   Option<String>,
  pub asi_codes:     String,
  pub unit_uic:      String,
  pub is_maintainer: bool,
  pub birth_month:   String,
}

impl RawSnapshot {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawSnapshot {
      history_id:    row.get(0)?,
      history_date:  row.get(1)?,
      user_id:       row.get(2)?,
      rank:          row.get(3)?,
      first_name:    row.get(4)?,
      last_name:     row.get(5)?,
      primary_mos:   row.get(6)?,
      asi_codes:     row.get(7)?,
      unit_uic:      row.get(8)?,
      is_maintainer: row.get(9)?,
      birth_month:   row.get(10)?,
    })
  }

  pub fn into_snapshot(self) -> Result<SoldierSnapshot> {
    Ok(SoldierSnapshot {
      history_id:    decode_uuid(&self.history_id)?,
      history_date:  decode_dt(&self.history_date)?,
      asi_codes:     decode_list(&self.asi_codes)?,
      birth_month:   decode_code("birth month", &self.birth_month)?,
      user_id:       self.user_id,
      rank:          self.rank,
      first_name:    self.first_name,
      last_name:     self.last_name,
      primary_mos:   self.primary_mos,
      unit_uic:      self.unit_uic,
      is_maintainer: self.is_maintainer,
    })
  }
}

// ─── Flags ───────────────────────────────────────────────────────────────────

pub const FLAG_COLUMNS: &str = "flag_id, user_id, unit_uic, flag_type, info, mx_availability, \
   start_date, end_date, remarks, created_by, last_modified_by, flag_deleted";

pub struct RawFlag {
  pub flag_id:          String,
  pub user_id:          Option<String>,
  pub unit_uic:         Option<String>,
  pub flag_type:        String,
  pub info:             Option<String>,
  pub mx_availability:  String,
  pub start_date:       String,
  pub end_date:         Option<String>,
  pub remarks:          Option<String>,
  pub created_by:       Option<String>,
  pub last_modified_by: Option<String>,
  pub flag_deleted:     bool,
}

impl RawFlag {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawFlag {
      flag_id:          row.get(0)?,
      user_id:          row.get(1)?,
      unit_uic:         row.get(2)?,
      flag_type:        row.get(3)?,
      info:             row.get(4)?,
      mx_availability:  row.get(5)?,
      start_date:       row.get(6)?,
      end_date:         row.get(7)?,
      remarks:          row.get(8)?,
      created_by:       row.get(9)?,
      last_modified_by: row.get(10)?,
      flag_deleted:     row.get(11)?,
    })
  }

  pub fn from_flag(f: &SoldierFlag) -> Self {
    RawFlag {
      flag_id:          encode_uuid(f.flag_id),
      user_id:          f.user_id.clone(),
      unit_uic:         f.unit_uic.clone(),
      flag_type:        f.flag_type.as_ref().to_owned(),
      info:             f.info.clone(),
      mx_availability:  f.mx_availability.as_ref().to_owned(),
      start_date:       encode_date(f.start_date),
      end_date:         f.end_date.map(encode_date),
      remarks:          f.remarks.clone(),
      created_by:       f.created_by.clone(),
      last_modified_by: f.last_modified_by.clone(),
      flag_deleted:     f.flag_deleted,
    }
  }

  pub fn into_flag(self) -> Result<SoldierFlag> {
    Ok(SoldierFlag {
      flag_id:          decode_uuid(&self.flag_id)?,
      flag_type:        decode_code("flag type", &self.flag_type)?,
      mx_availability:  decode_code("mx availability", &self.mx_availability)?,
      start_date:       decode_date(&self.start_date)?,
      end_date:         decode_opt_date(self.end_date)?,
      user_id:          self.user_id,
      unit_uic:         self.unit_uic,
      info:             self.info,
      remarks:          self.remarks,
      created_by:       self.created_by,
      last_modified_by: self.last_modified_by,
      flag_deleted:     self.flag_deleted,
    })
  }
}

// ─── Events ──────────────────────────────────────────────────────────────────

pub const EVENT_COLUMNS: &str = "event_id, user_id, date, uic, event_type, evaluation_type, \
   training_type, award_type, mos, go_nogo, total_mx_hours, comment, maintenance_level, \
   recorded_by, event_deleted, tasks";

pub struct RawEvent {
  pub event_id:          String,
  pub user_id:           String,
  pub date:              String,
  pub uic:               Option<String>,
  pub event_type:        String,
  pub evaluation_type:   Option<String>,
  pub training_type:     Option<String>,
  pub award_type:        Option<String>,
  pub mos:               Option<String>,
  pub go_nogo:           Option<String>,
  pub total_mx_hours:    Option<f64>,
  pub comment:           String,
  pub maintenance_level: Option<String>,
  pub recorded_by:       Option<String>,
  pub event_deleted:     bool,
  pub tasks:             String,
}

impl RawEvent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawEvent {
      event_id:          row.get(0)?,
      user_id:           row.get(1)?,
      date:              row.get(2)?,
      uic:               row.get(3)?,
      event_type:        row.get(4)?,
      evaluation_type:   row.get(5)?,
      training_type:     row.get(6)?,
      award_type:        row.get(7)?,
      mos:               row.get(8)?,
      go_nogo:           row.get(9)?,
      total_mx_hours:    row.get(10)?,
      comment:           row.get(11)?,
      maintenance_level: row.get(12)?,
      recorded_by:       row.get(13)?,
      event_deleted:     row.get(14)?,
      tasks:             row.get(15)?,
    })
  }

  pub fn from_event(e: &Event) -> Result<Self> {
    Ok(RawEvent {
      event_id:          encode_uuid(e.event_id),
      user_id:           e.user_id.clone(),
      date:              encode_date(e.date),
      uic:               e.uic.clone(),
      event_type:        e.event_type.as_ref().to_owned(),
      evaluation_type:   e.evaluation_type.clone(),
      training_type:     e.training_type.clone(),
      award_type:        e.award_type.clone(),
      mos:               e.mos.clone(),
      go_nogo:           e.go_nogo.map(|g| g.as_ref().to_owned()),
      total_mx_hours:    e.total_mx_hours,
      comment:           e.comment.clone(),
      maintenance_level: e.maintenance_level.map(|m| m.as_ref().to_owned()),
      recorded_by:       e.recorded_by.clone(),
      event_deleted:     e.event_deleted,
      tasks:             serde_json::to_string(&e.tasks)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    let tasks: Vec<EventTask> = serde_json::from_str(&self.tasks)?;
    Ok(Event {
      event_id:          decode_uuid(&self.event_id)?,
      date:              decode_date(&self.date)?,
      event_type:        decode_code("event type", &self.event_type)?,
      go_nogo:           decode_opt_code("go/no-go", self.go_nogo)?,
      maintenance_level: decode_opt_code("maintenance level", self.maintenance_level)?,
      user_id:           self.user_id,
      uic:               self.uic,
      evaluation_type:   self.evaluation_type,
      training_type:     self.training_type,
      award_type:        self.award_type,
      mos:               self.mos,
      total_mx_hours:    self.total_mx_hours,
      comment:           self.comment,
      recorded_by:       self.recorded_by,
      event_deleted:     self.event_deleted,
      tasks,
    })
  }
}

// ─── Fleet ───────────────────────────────────────────────────────────────────

pub const AIRCRAFT_COLUMNS: &str = "serial, model, status, rtl, current_unit, \
   total_airframe_hours, flight_hours, hours_to_phase, in_phase, remarks, date_down, ecd";

pub struct RawAircraft {
  pub serial:               String,
  pub model:                String,
  pub status:               String,
  pub rtl:                  String,
  pub current_unit:         String,
  pub total_airframe_hours: f64,
  pub flight_hours:         f64,
  pub hours_to_phase:       f64,
  pub in_phase:             bool,
  pub remarks:              Option<String>,
  pub date_down:            Option<String>,
  pub ecd:                  Option<String>,
}

impl RawAircraft {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawAircraft {
      serial:               row.get(0)?,
      model:                row.get(1)?,
      status:               row.get(2)?,
      rtl:                  row.get(3)?,
      current_unit:         row.get(4)?,
      total_airframe_hours: row.get(5)?,
      flight_hours:         row.get(6)?,
      hours_to_phase:       row.get(7)?,
      in_phase:             row.get(8)?,
      remarks:              row.get(9)?,
      date_down:            row.get(10)?,
      ecd:                  row.get(11)?,
    })
  }

  pub fn into_aircraft(self) -> Result<Aircraft> {
    Ok(Aircraft {
      date_down:            decode_opt_date(self.date_down)?,
      ecd:                  decode_opt_date(self.ecd)?,
      serial:               self.serial,
      model:                self.model,
      status:               self.status,
      rtl:                  self.rtl,
      current_unit:         self.current_unit,
      total_airframe_hours: self.total_airframe_hours,
      flight_hours:         self.flight_hours,
      hours_to_phase:       self.hours_to_phase,
      in_phase:             self.in_phase,
      remarks:              self.remarks,
    })
  }
}

pub const DA1352_COLUMNS: &str = "serial, reporting_uic, reporting_month, model, flying_hours, \
   fmc_hours, field_hours, pmcm_hours, pmcs_hours, dade_hours, sust_hours, nmcs_hours, \
   nmcm_hours, total_hours_in_status";

/// A DA-1352 row with the month still encoded.
pub struct Raw1352 {
  pub reporting_month: String,
  pub report:          Da1352,
}

impl Raw1352 {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Raw1352 {
      reporting_month: row.get(2)?,
      report:          Da1352 {
        serial:                row.get(0)?,
        reporting_uic:         row.get(1)?,
        reporting_month:       NaiveDate::MIN,
        model:                 row.get(3)?,
        flying_hours:          row.get(4)?,
        fmc_hours:             row.get(5)?,
        field_hours:           row.get(6)?,
        pmcm_hours:            row.get(7)?,
        pmcs_hours:            row.get(8)?,
        dade_hours:            row.get(9)?,
        sust_hours:            row.get(10)?,
        nmcs_hours:            row.get(11)?,
        nmcm_hours:            row.get(12)?,
        total_hours_in_status: row.get(13)?,
      },
    })
  }

  pub fn into_report(self) -> Result<Da1352> {
    Ok(Da1352 { reporting_month: decode_date(&self.reporting_month)?, ..self.report })
  }
}

pub struct RawProjection {
  pub unit_uic:        String,
  pub model:           String,
  pub reporting_month: String,
  pub projected_hours: f64,
  pub source:          String,
}

impl RawProjection {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawProjection {
      unit_uic:        row.get(0)?,
      model:           row.get(1)?,
      reporting_month: row.get(2)?,
      projected_hours: row.get(3)?,
      source:          row.get(4)?,
    })
  }

  pub fn into_projection(self) -> Result<MonthlyProjection> {
    Ok(MonthlyProjection {
      reporting_month: decode_date(&self.reporting_month)?,
      unit_uic:        self.unit_uic,
      model:           self.model,
      projected_hours: self.projected_hours,
      source:          self.source,
    })
  }
}

pub struct RawMaintenanceEvent {
  pub event_id:         String,
  pub serial:           String,
  pub maintenance_type: String,
  pub name:             String,
  pub event_start:      String,
  pub event_end:        Option<String>,
  pub lane:             Option<String>,
}

impl RawMaintenanceEvent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawMaintenanceEvent {
      event_id:         row.get(0)?,
      serial:           row.get(1)?,
      maintenance_type: row.get(2)?,
      name:             row.get(3)?,
      event_start:      row.get(4)?,
      event_end:        row.get(5)?,
      lane:             row.get(6)?,
    })
  }

  pub fn into_event(self) -> Result<MaintenanceEvent> {
    Ok(MaintenanceEvent {
      event_id:         decode_uuid(&self.event_id)?,
      maintenance_type: decode_code("maintenance type", &self.maintenance_type)?,
      event_start:      decode_date(&self.event_start)?,
      event_end:        decode_opt_date(self.event_end)?,
      serial:           self.serial,
      name:             self.name,
      lane:             self.lane,
    })
  }
}

// ─── Flights ─────────────────────────────────────────────────────────────────

pub const FLIGHT_COLUMNS: &str = "flight_id, serial, model, unit_uic, mission_type, start_at, \
   stop_at, day_hours, day_system_hours, night_hours, night_goggles_hours, night_system_hours, \
   hood_hours, weather_hours";

/// A flight row with its timestamps still encoded.
pub struct RawFlight {
  pub start_at: String,
  pub stop_at:  Option<String>,
  pub flight:   Flight,
}

impl RawFlight {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawFlight {
      start_at: row.get(5)?,
      stop_at:  row.get(6)?,
      flight:   Flight {
        flight_id:           row.get(0)?,
        serial:              row.get(1)?,
        model:               row.get(2)?,
        unit_uic:            row.get(3)?,
        mission_type:        row.get(4)?,
        start:               DateTime::<Utc>::MIN_UTC,
        stop:                None,
        day_hours:           row.get(7)?,
        day_system_hours:    row.get(8)?,
        night_hours:         row.get(9)?,
        night_goggles_hours: row.get(10)?,
        night_system_hours:  row.get(11)?,
        hood_hours:          row.get(12)?,
        weather_hours:       row.get(13)?,
      },
    })
  }

  pub fn into_flight(self) -> Result<Flight> {
    Ok(Flight {
      start: decode_dt(&self.start_at)?,
      stop:  self.stop_at.as_deref().map(decode_dt).transpose()?,
      ..self.flight
    })
  }
}

// ─── Notifications ───────────────────────────────────────────────────────────

pub const DELIVERY_COLUMNS: &str = "d.user_id, d.notification_read, n.notification_id, \
   n.date_generated, n.request_id, n.content";

pub struct RawDelivery {
  pub user_id:         String,
  pub read:            bool,
  pub notification_id: String,
  pub date_generated:  String,
  pub request_id:      Option<String>,
  pub content:         String,
}

impl RawDelivery {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawDelivery {
      user_id:         row.get(0)?,
      read:            row.get(1)?,
      notification_id: row.get(2)?,
      date_generated:  row.get(3)?,
      request_id:      row.get(4)?,
      content:         row.get(5)?,
    })
  }

  pub fn into_delivery(self) -> Result<SoldierNotification> {
    Ok(SoldierNotification {
      notification: Notification {
        notification_id: decode_uuid(&self.notification_id)?,
        date_generated:  decode_dt(&self.date_generated)?,
        request_id:      self.request_id.as_deref().map(decode_uuid).transpose()?,
        content:         serde_json::from_str(&self.content)?,
      },
      user_id:      self.user_id,
      read:         self.read,
    })
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

pub struct RawAccessRequest {
  pub request_id:   String,
  pub user_id:      String,
  pub unit_uic:     String,
  pub access_level: String,
  pub requested_at: String,
}

impl RawAccessRequest {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawAccessRequest {
      request_id:   row.get(0)?,
      user_id:      row.get(1)?,
      unit_uic:     row.get(2)?,
      access_level: row.get(3)?,
      requested_at: row.get(4)?,
    })
  }

  pub fn into_request(self) -> Result<AccessRequest> {
    Ok(AccessRequest {
      request_id:   decode_uuid(&self.request_id)?,
      access_level: decode_code("access level", &self.access_level)?,
      requested_at: decode_dt(&self.requested_at)?,
      user_id:      self.user_id,
      unit_uic:     self.unit_uic,
    })
  }
}

pub struct RawTransferRequest {
  pub request_id:   String,
  pub requester_id: String,
  pub soldier_id:   String,
  pub gaining_uic:  String,
  pub requested_at: String,
}

impl RawTransferRequest {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawTransferRequest {
      request_id:   row.get(0)?,
      requester_id: row.get(1)?,
      soldier_id:   row.get(2)?,
      gaining_uic:  row.get(3)?,
      requested_at: row.get(4)?,
    })
  }

  pub fn into_request(self) -> Result<TransferRequest> {
    Ok(TransferRequest {
      request_id:   decode_uuid(&self.request_id)?,
      requested_at: decode_dt(&self.requested_at)?,
      requester_id: self.requester_id,
      soldier_id:   self.soldier_id,
      gaining_uic:  self.gaining_uic,
    })
  }
}

// ─── Designations ────────────────────────────────────────────────────────────

pub const SOLDIER_DESIGNATION_COLUMNS: &str = "designation_id, user_id, designation_type, \
   unit_uic, start_date, end_date, last_modified_by, designation_removed";

pub struct RawSoldierDesignation {
  pub designation_id:      String,
  pub user_id:             String,
  pub designation_type:    String,
  pub unit_uic:            Option<String>,
  pub start_date:          String,
  pub end_date:            Option<String>,
  pub last_modified_by:    Option<String>,
  pub designation_removed: bool,
}

impl RawSoldierDesignation {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawSoldierDesignation {
      designation_id:      row.get(0)?,
      user_id:             row.get(1)?,
      designation_type:    row.get(2)?,
      unit_uic:            row.get(3)?,
      start_date:          row.get(4)?,
      end_date:            row.get(5)?,
      last_modified_by:    row.get(6)?,
      designation_removed: row.get(7)?,
    })
  }

  pub fn from_designation(d: &SoldierDesignation) -> Self {
    RawSoldierDesignation {
      designation_id:      encode_uuid(d.designation_id),
      user_id:             d.user_id.clone(),
      designation_type:    d.designation_type.clone(),
      unit_uic:            d.unit_uic.clone(),
      start_date:          encode_date(d.start_date),
      end_date:            d.end_date.map(encode_date),
      last_modified_by:    d.last_modified_by.clone(),
      designation_removed: d.designation_removed,
    }
  }

  pub fn into_designation(self) -> Result<SoldierDesignation> {
    Ok(SoldierDesignation {
      designation_id:      decode_uuid(&self.designation_id)?,
      start_date:          decode_date(&self.start_date)?,
      end_date:            decode_opt_date(self.end_date)?,
      user_id:             self.user_id,
      designation_type:    self.designation_type,
      unit_uic:            self.unit_uic,
      last_modified_by:    self.last_modified_by,
      designation_removed: self.designation_removed,
    })
  }
}

// ─── Task lists ──────────────────────────────────────────────────────────────

pub const TASK_COLUMNS: &str = "task_number, task_title, pdf_url, unit_uic, training_location, \
   frequency, subject_area, deleted";

pub fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
  Ok(Task {
    task_number:       row.get(0)?,
    task_title:        row.get(1)?,
    pdf_url:           row.get(2)?,
    unit_uic:          row.get(3)?,
    training_location: row.get(4)?,
    frequency:         row.get(5)?,
    subject_area:      row.get(6)?,
    deleted:           row.get(7)?,
  })
}

pub const ICTL_COLUMNS: &str = "ictl_id, title, date_published, proponent, unit_uic, status, \
   skill_level, mos, target_audience, task_numbers";

pub struct RawIctl {
  pub ictl_id:         String,
  pub title:           String,
  pub date_published:  String,
  pub proponent:       Option<String>,
  pub unit_uic:        Option<String>,
  pub status:          Option<String>,
  pub skill_level:     Option<String>,
  pub mos:             String,
  pub target_audience: Option<String>,
  pub task_numbers:    String,
}

impl RawIctl {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawIctl {
      ictl_id:         row.get(0)?,
      title:           row.get(1)?,
      date_published:  row.get(2)?,
      proponent:       row.get(3)?,
      unit_uic:        row.get(4)?,
      status:          row.get(5)?,
      skill_level:     row.get(6)?,
      mos:             row.get(7)?,
      target_audience: row.get(8)?,
      task_numbers:    row.get(9)?,
    })
  }

  pub fn from_ictl(i: &Ictl) -> Result<Self> {
    Ok(RawIctl {
      ictl_id:         encode_uuid(i.ictl_id),
      title:           i.title.clone(),
      date_published:  encode_date(i.date_published),
      proponent:       i.proponent.clone(),
      unit_uic:        i.unit_uic.clone(),
      status:          i.status.clone(),
      skill_level:     i.skill_level.clone(),
      mos:             encode_list(&i.mos)?,
      target_audience: i.target_audience.clone(),
      task_numbers:    encode_list(&i.task_numbers)?,
    })
  }

  pub fn into_ictl(self) -> Result<Ictl> {
    Ok(Ictl {
      ictl_id:         decode_uuid(&self.ictl_id)?,
      date_published:  decode_date(&self.date_published)?,
      mos:             decode_list(&self.mos)?,
      task_numbers:    decode_list(&self.task_numbers)?,
      title:           self.title,
      proponent:       self.proponent,
      unit_uic:        self.unit_uic,
      status:          self.status,
      skill_level:     self.skill_level,
      target_audience: self.target_audience,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = encode_dt(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
    let b = encode_dt(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap() + chrono::Duration::microseconds(5));
    assert_eq!(a, "2024-01-01T09:00:00.000000Z");
    assert!(a < b);
    assert_eq!(decode_dt(&b).unwrap().timestamp_subsec_micros(), 5);
  }

  #[test]
  fn unknown_codes_are_reported_by_kind() {
    let err = decode_code::<redcon_core::flag::FlagType>("flag type", "BOGUS").unwrap_err();
    assert!(err.to_string().contains("flag type"));
  }

  #[test]
  fn dates_round_trip() {
    let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    assert_eq!(decode_date(&encode_date(d)).unwrap(), d);
    assert!(decode_date("2024-02-30").is_err());
  }
}
