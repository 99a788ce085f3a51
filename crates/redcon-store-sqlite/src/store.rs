//! [`SqliteStore`], the SQLite implementation of [`ReadinessStore`].

use std::path::Path;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rusqlite::{OptionalExtension as _, params, params_from_iter, types::Value};
use uuid::Uuid;

use redcon_core::{
  aircraft::{Aircraft, Da1352, MaintenanceEvent, MonthlyProjection},
  designation::{Designation, SoldierDesignation},
  event::Event,
  flag::SoldierFlag,
  flight::Flight,
  mtoe::MtoePosition,
  notification::{Notice, Notification, SoldierNotification},
  phase_team::PhaseTeam,
  request::{AccessRequest, Settlement, TransferRequest},
  role::UserRole,
  soldier::{MosCode, Soldier, SoldierSnapshot},
  store::{EventQuery, FlagQuery, IctlQuery, IctlScope, ReadinessStore, SoldierQuery},
  task::{Ictl, Task},
  unit::{NewUnit, Unit, UnitTree},
};

use crate::{
  encode::{
    decode_code, decode_list, encode_date, encode_dt, encode_list, encode_uuid, task_from_row,
    Raw1352, RawAccessRequest, RawAircraft, RawDelivery, RawEvent, RawFlag, RawFlight, RawIctl,
    RawMaintenanceEvent, RawProjection, RawSnapshot, RawSoldier, RawSoldierDesignation,
    RawTransferRequest, RawUnit, AIRCRAFT_COLUMNS, DA1352_COLUMNS, DELIVERY_COLUMNS,
    EVENT_COLUMNS, FLAG_COLUMNS, FLIGHT_COLUMNS, ICTL_COLUMNS, SNAPSHOT_COLUMNS,
    SOLDIER_COLUMNS, SOLDIER_DESIGNATION_COLUMNS, TASK_COLUMNS, UNIT_COLUMNS,
  },
  query::{in_list, text, Filter},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A readiness store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn select_units(&self) -> Result<Vec<Unit>> {
    let raws: Vec<RawUnit> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("SELECT {UNIT_COLUMNS} FROM units ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawUnit::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUnit::into_unit).collect()
  }

  async fn write_flag(&self, raw: RawFlag, replace: bool) -> Result<usize> {
    let sql = if replace {
      "UPDATE soldier_flags SET
         user_id = ?2, unit_uic = ?3, flag_type = ?4, info = ?5, mx_availability = ?6,
         start_date = ?7, end_date = ?8, remarks = ?9, created_by = ?10,
         last_modified_by = ?11, flag_deleted = ?12
       WHERE flag_id = ?1"
    } else {
      "INSERT INTO soldier_flags
         (flag_id, user_id, unit_uic, flag_type, info, mx_availability, start_date,
          end_date, remarks, created_by, last_modified_by, flag_deleted)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
    };

    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          sql,
          params![
            raw.flag_id,
            raw.user_id,
            raw.unit_uic,
            raw.flag_type,
            raw.info,
            raw.mx_availability,
            raw.start_date,
            raw.end_date,
            raw.remarks,
            raw.created_by,
            raw.last_modified_by,
            raw.flag_deleted,
          ],
        )?;
        Ok(n)
      })
      .await?;
    Ok(changed)
  }
}

/// One soldier write, encoded ahead of the blocking call.
struct SoldierRow {
  soldier:        Soldier,
  additional_mos: String,
  asi_codes:      String,
  birth_month:    String,
  reporting_ml:   Option<String>,
  history_id:     String,
  history_date:   String,
}

impl SoldierRow {
  fn new(soldier: Soldier, effective_at: DateTime<Utc>) -> Result<Self> {
    let snap = soldier.snapshot(effective_at);
    Ok(SoldierRow {
      additional_mos: encode_list(&soldier.additional_mos)?,
      asi_codes:      encode_list(&soldier.asi_codes)?,
      birth_month:    soldier.birth_month.as_ref().to_owned(),
      reporting_ml:   soldier.reporting_ml.map(|m| m.as_ref().to_owned()),
      history_id:     encode_uuid(snap.history_id),
      history_date:   encode_dt(snap.history_date),
      soldier,
    })
  }

  /// Append the history snapshot, then replace the current row unless the
  /// soldier already has a newer snapshot. Returns whether the current row
  /// was replaced.
  fn write(&self, conn: &rusqlite::Connection) -> rusqlite::Result<bool> {
    let s = &self.soldier;
    let newest: Option<String> = conn.query_row(
      "SELECT MAX(history_date) FROM soldier_history WHERE user_id = ?1",
      params![s.user_id],
      |row| row.get(0),
    )?;
    let is_current = newest.is_none_or(|newest| self.history_date >= newest);

    conn.execute(
      &format!(
        "INSERT INTO soldier_history ({SNAPSHOT_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
      ),
      params![
        self.history_id,
        self.history_date,
        s.user_id,
        s.rank,
        s.first_name,
        s.last_name,
        s.primary_mos,
        self.asi_codes,
        s.unit_uic,
        s.is_maintainer,
        self.birth_month,
      ],
    )?;

    if is_current {
      conn.execute(
        &format!(
          "INSERT OR REPLACE INTO soldiers ({SOLDIER_COLUMNS})
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        ),
        params![
          s.user_id,
          s.rank,
          s.first_name,
          s.last_name,
          s.primary_mos,
          self.additional_mos,
          self.asi_codes,
          s.unit_uic,
          s.is_admin,
          s.is_maintainer,
          s.dod_email,
          self.birth_month,
          self.reporting_ml,
        ],
      )?;
    }
    Ok(is_current)
  }
}

/// A notification and its recipients, encoded ahead of the blocking call.
struct NoticeRow {
  notification_id: String,
  date_generated:  String,
  request_id:      Option<String>,
  content:         String,
  recipients:      Vec<String>,
}

impl NoticeRow {
  fn new(notice: &Notice) -> Result<Self> {
    let n = &notice.notification;
    Ok(NoticeRow {
      notification_id: encode_uuid(n.notification_id),
      date_generated:  encode_dt(n.date_generated),
      request_id:      n.request_id.map(encode_uuid),
      content:         serde_json::to_string(&n.content)?,
      recipients:      notice.recipients.clone(),
    })
  }

  fn write(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO notifications (notification_id, date_generated, request_id, content)
       VALUES (?1, ?2, ?3, ?4)",
      params![self.notification_id, self.date_generated, self.request_id, self.content],
    )?;
    let mut stmt = conn.prepare(
      "INSERT OR IGNORE INTO soldier_notifications (user_id, notification_id) VALUES (?1, ?2)",
    )?;
    for user_id in &self.recipients {
      stmt.execute(params![user_id, self.notification_id])?;
    }
    Ok(())
  }
}

/// Delete the notifications about the requests matched by `cond`, with
/// every delivery of them.
fn withdraw_notifications(
  conn:   &rusqlite::Connection,
  cond:   &str,
  params: &[String],
) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "DELETE FROM soldier_notifications WHERE notification_id IN
         (SELECT notification_id FROM notifications WHERE request_id IN ({cond}))"
    ),
    params_from_iter(params),
  )?;
  conn.execute(
    &format!("DELETE FROM notifications WHERE request_id IN ({cond})"),
    params_from_iter(params),
  )?;
  Ok(())
}

/// Delete the rows of `table` whose `request_id` is listed.
fn delete_requests(conn: &rusqlite::Connection, table: &str, ids: &[String]) -> rusqlite::Result<usize> {
  conn.execute(
    &format!("DELETE FROM {table} WHERE {}", in_list("request_id", ids.len())),
    params_from_iter(ids),
  )
}

/// Run a `SELECT` built from `columns`, `table` and `filter`, mapping each row
/// with `map`.
fn select_where<T, F>(
  conn: &rusqlite::Connection,
  columns: &str,
  table: &str,
  filter: Filter,
  order: &str,
  map: F,
) -> rusqlite::Result<Vec<T>>
where
  F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
{
  let sql = format!("SELECT {columns} FROM {table} {} ORDER BY {order}", filter.where_clause());
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(params_from_iter(filter.into_params()), map)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── ReadinessStore impl ─────────────────────────────────────────────────────

impl ReadinessStore for SqliteStore {
  type Error = Error;

  // ── Units ─────────────────────────────────────────────────────────────────

  async fn upsert_unit(&self, input: NewUnit) -> Result<Unit> {
    let uic = input.uic.clone();
    let mut units = self.select_units().await?;
    match units.iter_mut().find(|u| u.uic == uic) {
      Some(existing) => *existing = Unit::from(input),
      None => units.push(Unit::from(input)),
    }

    // A cycle is rejected here, before anything is written.
    let tree = UnitTree::build(units)?;
    let unit = tree
      .get(&uic)
      .cloned()
      .ok_or_else(|| redcon_core::Error::UnitNotFound(uic.clone()))?;

    let raws = tree
      .into_units()
      .iter()
      .map(RawUnit::from_unit)
      .collect::<Result<Vec<_>>>()?;
    let count = raws.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(&format!(
            "INSERT INTO units ({UNIT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT (uic) DO UPDATE SET
               short_name = excluded.short_name, display_name = excluded.display_name,
               nick_name = excluded.nick_name, echelon = excluded.echelon,
               component = excluded.component, state = excluded.state,
               parent_uic = excluded.parent_uic, start_date = excluded.start_date,
               end_date = excluded.end_date, level = excluded.level,
               parent_uics = excluded.parent_uics, child_uics = excluded.child_uics,
               subordinate_uics = excluded.subordinate_uics"
          ))?;
          for r in &raws {
            stmt.execute(params![
              r.uic,
              r.short_name,
              r.display_name,
              r.nick_name,
              r.echelon,
              r.component,
              r.state,
              r.parent_uic,
              r.start_date,
              r.end_date,
              r.level,
              r.parent_uics,
              r.child_uics,
              r.subordinate_uics,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(uic = %unit.uic, units = count, "upserted unit");
    Ok(unit)
  }

  async fn get_unit<'a>(&'a self, uic: &'a str) -> Result<Option<Unit>> {
    let uic = uic.to_owned();
    let raw: Option<RawUnit> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {UNIT_COLUMNS} FROM units WHERE uic = ?1"),
            params![uic],
            RawUnit::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawUnit::into_unit).transpose()
  }

  async fn list_units(&self) -> Result<Vec<Unit>> { self.select_units().await }

  // ── Soldiers ──────────────────────────────────────────────────────────────

  async fn upsert_soldier(&self, soldier: Soldier, effective_at: DateTime<Utc>) -> Result<Soldier> {
    let row = SoldierRow::new(soldier.clone(), effective_at)?;
    let replaced = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let replaced = row.write(&tx)?;
        tx.commit()?;
        Ok(replaced)
      })
      .await?;

    if replaced {
      tracing::debug!(user_id = %soldier.user_id, unit = %soldier.unit_uic, "upserted soldier");
      return Ok(soldier);
    }
    tracing::info!(
      user_id = %soldier.user_id,
      %effective_at,
      "recorded backdated snapshot; current record kept"
    );
    self
      .get_soldier(&soldier.user_id)
      .await?
      .ok_or_else(|| redcon_core::Error::SoldierNotFound(soldier.user_id).into())
  }

  async fn get_soldier<'a>(&'a self, user_id: &'a str) -> Result<Option<Soldier>> {
    let user_id = user_id.to_owned();
    let raw: Option<RawSoldier> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {SOLDIER_COLUMNS} FROM soldiers WHERE user_id = ?1"),
            params![user_id],
            RawSoldier::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawSoldier::into_soldier).transpose()
  }

  async fn list_soldiers<'a>(&'a self, query: &'a SoldierQuery) -> Result<Vec<Soldier>> {
    let mut filter = Filter::new();
    if let Some(uics) = &query.unit_uics {
      filter.push_in("unit_uic", uics);
    }
    if let Some(users) = &query.user_ids {
      filter.push_in("user_id", users);
    }
    if query.maintainers_only {
      filter.push("is_maintainer = 1", []);
    }

    let raws: Vec<RawSoldier> = self
      .conn
      .call(move |conn| {
        Ok(select_where(conn, SOLDIER_COLUMNS, "soldiers", filter, "user_id", RawSoldier::from_row)?)
      })
      .await?;

    raws.into_iter().map(RawSoldier::into_soldier).collect()
  }

  async fn history_through(&self, last_day: NaiveDate) -> Result<Vec<SoldierSnapshot>> {
    let mut filter = Filter::new();
    if let Some(next) = last_day.checked_add_days(Days::new(1)) {
      let cutoff = encode_dt(next.and_time(NaiveTime::MIN).and_utc());
      filter.push("history_date < ?", [text(cutoff)]);
    }

    let raws: Vec<RawSnapshot> = self
      .conn
      .call(move |conn| {
        Ok(select_where(
          conn,
          SNAPSHOT_COLUMNS,
          "soldier_history",
          filter,
          "history_date, rowid",
          RawSnapshot::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawSnapshot::into_snapshot).collect()
  }

  async fn history_for<'a>(&'a self, user_id: &'a str) -> Result<Vec<SoldierSnapshot>> {
    let mut filter = Filter::new();
    filter.push("user_id = ?", [text(user_id)]);

    let raws: Vec<RawSnapshot> = self
      .conn
      .call(move |conn| {
        Ok(select_where(
          conn,
          SNAPSHOT_COLUMNS,
          "soldier_history",
          filter,
          "history_date, rowid",
          RawSnapshot::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawSnapshot::into_snapshot).collect()
  }

  // ── MOS codes ─────────────────────────────────────────────────────────────

  async fn upsert_mos(&self, mos: MosCode) -> Result<MosCode> {
    let row = mos.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO mos_codes (mos, description, amtp_mos, ictl_mos)
           VALUES (?1, ?2, ?3, ?4)",
          params![row.mos, row.description, row.amtp_mos, row.ictl_mos],
        )?;
        Ok(())
      })
      .await?;
    Ok(mos)
  }

  async fn list_mos(&self) -> Result<Vec<MosCode>> {
    let codes = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT mos, description, amtp_mos, ictl_mos FROM mos_codes ORDER BY mos")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(MosCode {
              mos:         row.get(0)?,
              description: row.get(1)?,
              amtp_mos:    row.get(2)?,
              ictl_mos:    row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(codes)
  }

  // ── Roles ─────────────────────────────────────────────────────────────────

  async fn grant_role(&self, role: UserRole) -> Result<UserRole> {
    let (user_id, unit_uic) = (role.user_id.clone(), role.unit_uic.clone());
    let level = role.access_level.as_ref().to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user_roles (user_id, unit_uic, access_level) VALUES (?1, ?2, ?3)
           ON CONFLICT (user_id, unit_uic) DO UPDATE SET access_level = excluded.access_level",
          params![user_id, unit_uic, level],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(user_id = %role.user_id, unit = %role.unit_uic, level = %role.access_level, "granted role");
    Ok(role)
  }

  async fn revoke_role<'a>(&'a self, user_id: &'a str, unit_uic: &'a str) -> Result<bool> {
    let (user_id, unit_uic) = (user_id.to_owned(), unit_uic.to_owned());
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM user_roles WHERE user_id = ?1 AND unit_uic = ?2",
          params![user_id, unit_uic],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  async fn roles_for<'a>(&'a self, user_id: &'a str) -> Result<Vec<UserRole>> {
    let user_id = user_id.to_owned();
    let raws: Vec<(String, String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, unit_uic, access_level FROM user_roles
           WHERE user_id = ?1 ORDER BY unit_uic",
        )?;
        let rows = stmt
          .query_map(params![user_id], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(user_id, unit_uic, level)| {
        Ok(UserRole { user_id, unit_uic, access_level: decode_code("access level", &level)? })
      })
      .collect()
  }

  async fn list_roles(&self) -> Result<Vec<UserRole>> {
    let raws: Vec<(String, String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, unit_uic, access_level FROM user_roles ORDER BY user_id, unit_uic",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(user_id, unit_uic, level)| {
        Ok(UserRole { user_id, unit_uic, access_level: decode_code("access level", &level)? })
      })
      .collect()
  }

  // ── Flags ─────────────────────────────────────────────────────────────────

  async fn create_flag(&self, flag: SoldierFlag) -> Result<SoldierFlag> {
    self.write_flag(RawFlag::from_flag(&flag), false).await?;
    tracing::info!(flag_id = %flag.flag_id, flag_type = %flag.flag_type, "created flag");
    Ok(flag)
  }

  async fn get_flag(&self, flag_id: Uuid) -> Result<Option<SoldierFlag>> {
    let id = encode_uuid(flag_id);
    let raw: Option<RawFlag> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {FLAG_COLUMNS} FROM soldier_flags WHERE flag_id = ?1"),
            params![id],
            RawFlag::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawFlag::into_flag).transpose()
  }

  async fn update_flag(&self, flag: SoldierFlag) -> Result<SoldierFlag> {
    if self.write_flag(RawFlag::from_flag(&flag), true).await? == 0 {
      return Err(redcon_core::Error::FlagNotFound(flag.flag_id).into());
    }
    tracing::debug!(flag_id = %flag.flag_id, "updated flag");
    Ok(flag)
  }

  async fn delete_flag(&self, flag_id: Uuid, deleted_by: Option<String>) -> Result<()> {
    let id = encode_uuid(flag_id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE soldier_flags
           SET flag_deleted = 1, last_modified_by = COALESCE(?2, last_modified_by)
           WHERE flag_id = ?1",
          params![id, deleted_by],
        )?)
      })
      .await?;

    if n == 0 {
      return Err(redcon_core::Error::FlagNotFound(flag_id).into());
    }
    tracing::info!(%flag_id, "deleted flag");
    Ok(())
  }

  async fn list_flags<'a>(&'a self, query: &'a FlagQuery) -> Result<Vec<SoldierFlag>> {
    let mut filter = Filter::new();

    if query.user_ids.is_some() || query.unit_uics.is_some() {
      let users = query.user_ids.as_deref().unwrap_or_default();
      let units = query.unit_uics.as_deref().unwrap_or_default();
      filter.push(
        format!("({} OR {})", in_list("user_id", users.len()), in_list("unit_uic", units.len())),
        users.iter().chain(units).cloned().map(Value::Text),
      );
    }
    if let Some((start, end)) = query.overlapping {
      filter.push(
        "start_date <= ? AND (end_date IS NULL OR end_date >= ?)",
        [text(encode_date(end)), text(encode_date(start))],
      );
    }
    if !query.include_deleted {
      filter.push("flag_deleted = 0", []);
    }

    let raws: Vec<RawFlag> = self
      .conn
      .call(move |conn| {
        Ok(select_where(
          conn,
          FLAG_COLUMNS,
          "soldier_flags",
          filter,
          "start_date, flag_id",
          RawFlag::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawFlag::into_flag).collect()
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn record_event(&self, event: Event) -> Result<Event> {
    let r = RawEvent::from_event(&event)?;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT OR REPLACE INTO events ({EVENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
          ),
          params![
            r.event_id,
            r.user_id,
            r.date,
            r.uic,
            r.event_type,
            r.evaluation_type,
            r.training_type,
            r.award_type,
            r.mos,
            r.go_nogo,
            r.total_mx_hours,
            r.comment,
            r.maintenance_level,
            r.recorded_by,
            r.event_deleted,
            r.tasks,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(event_id = %event.event_id, user_id = %event.user_id, event_type = %event.event_type, "recorded event");
    Ok(event)
  }

  async fn get_event(&self, event_id: Uuid) -> Result<Option<Event>> {
    let id = encode_uuid(event_id);
    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
            params![id],
            RawEvent::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_events<'a>(&'a self, query: &'a EventQuery) -> Result<Vec<Event>> {
    let mut filter = Filter::new();
    if let Some(users) = &query.user_ids {
      filter.push_in("user_id", users);
    }
    if let Some(kind) = query.event_type {
      let kind: &str = kind.as_ref();
      filter.push("event_type = ?", [text(kind)]);
    }
    if let Some(start) = query.start {
      filter.push("date >= ?", [text(encode_date(start))]);
    }
    if let Some(end) = query.end {
      filter.push("date <= ?", [text(encode_date(end))]);
    }
    if !query.include_deleted {
      filter.push("event_deleted = 0", []);
    }

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(select_where(conn, EVENT_COLUMNS, "events", filter, "date, rowid", RawEvent::from_row)?)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn delete_event(&self, event_id: Uuid) -> Result<()> {
    let id = encode_uuid(event_id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("UPDATE events SET event_deleted = 1 WHERE event_id = ?1", params![id])?)
      })
      .await?;

    if n == 0 {
      return Err(redcon_core::Error::EventNotFound(event_id).into());
    }
    tracing::info!(%event_id, "deleted event");
    Ok(())
  }

  // ── MTOE ──────────────────────────────────────────────────────────────────

  async fn add_mtoe(&self, position: MtoePosition) -> Result<MtoePosition> {
    let asi = encode_list(&position.asi_codes)?;
    let row = position.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO mtoe
             (uic, fiscal_year, position_code, authorized_strength, required_strength, asi_codes)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          params![
            row.uic,
            row.fiscal_year,
            row.position_code,
            row.authorized_strength,
            row.required_strength,
            asi,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(position)
  }

  async fn list_mtoe<'a>(
    &'a self,
    uics: &'a [String],
    fiscal_year: Option<i32>,
  ) -> Result<Vec<MtoePosition>> {
    let mut filter = Filter::new();
    filter.push_in("uic", uics);
    if let Some(fy) = fiscal_year {
      filter.push("fiscal_year = ?", [Value::Integer(fy.into())]);
    }

    let raws: Vec<(MtoePosition, String)> = self
      .conn
      .call(move |conn| {
        Ok(select_where(
          conn,
          "uic, fiscal_year, position_code, authorized_strength, required_strength, asi_codes",
          "mtoe",
          filter,
          "uic, position_code",
          |row| {
            let position = MtoePosition {
              uic:                 row.get(0)?,
              fiscal_year:         row.get(1)?,
              position_code:       row.get(2)?,
              authorized_strength: row.get(3)?,
              required_strength:   row.get(4)?,
              asi_codes:           Vec::new(),
            };
            Ok((position, row.get(5)?))
          },
        )?)
      })
      .await?;

    raws
      .into_iter()
      .map(|(position, asi)| Ok(MtoePosition { asi_codes: decode_list(&asi)?, ..position }))
      .collect()
  }

  // ── Fleet ─────────────────────────────────────────────────────────────────

  async fn upsert_aircraft(&self, aircraft: Aircraft) -> Result<Aircraft> {
    let a         = aircraft.clone();
    let date_down = a.date_down.map(encode_date);
    let ecd       = a.ecd.map(encode_date);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT OR REPLACE INTO aircraft ({AIRCRAFT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
          ),
          params![
            a.serial,
            a.model,
            a.status,
            a.rtl,
            a.current_unit,
            a.total_airframe_hours,
            a.flight_hours,
            a.hours_to_phase,
            a.in_phase,
            a.remarks,
            date_down,
            ecd,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(serial = %aircraft.serial, unit = %aircraft.current_unit, "upserted aircraft");
    Ok(aircraft)
  }

  async fn get_aircraft<'a>(&'a self, serial: &'a str) -> Result<Option<Aircraft>> {
    let serial = serial.to_owned();
    let raw: Option<RawAircraft> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {AIRCRAFT_COLUMNS} FROM aircraft WHERE serial = ?1"),
            params![serial],
            RawAircraft::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawAircraft::into_aircraft).transpose()
  }

  async fn list_aircraft<'a>(&'a self, uics: &'a [String]) -> Result<Vec<Aircraft>> {
    let mut filter = Filter::new();
    filter.push_in("current_unit", uics);

    let raws: Vec<RawAircraft> = self
      .conn
      .call(move |conn| {
        Ok(select_where(conn, AIRCRAFT_COLUMNS, "aircraft", filter, "serial", RawAircraft::from_row)?)
      })
      .await?;

    raws.into_iter().map(RawAircraft::into_aircraft).collect()
  }

  async fn record_1352(&self, report: Da1352) -> Result<Da1352> {
    let r     = report.clone();
    let month = encode_date(r.reporting_month);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO da_1352 ({DA1352_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT (serial, reporting_month) DO UPDATE SET
               reporting_uic = excluded.reporting_uic, model = excluded.model,
               flying_hours = excluded.flying_hours, fmc_hours = excluded.fmc_hours,
               field_hours = excluded.field_hours, pmcm_hours = excluded.pmcm_hours,
               pmcs_hours = excluded.pmcs_hours, dade_hours = excluded.dade_hours,
               sust_hours = excluded.sust_hours, nmcs_hours = excluded.nmcs_hours,
               nmcm_hours = excluded.nmcm_hours,
               total_hours_in_status = excluded.total_hours_in_status"
          ),
          params![
            r.serial,
            r.reporting_uic,
            month,
            r.model,
            r.flying_hours,
            r.fmc_hours,
            r.field_hours,
            r.pmcm_hours,
            r.pmcs_hours,
            r.dade_hours,
            r.sust_hours,
            r.nmcs_hours,
            r.nmcm_hours,
            r.total_hours_in_status,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(report)
  }

  async fn list_1352<'a>(
    &'a self,
    uics: &'a [String],
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<Da1352>> {
    let mut filter = Filter::new();
    filter.push_in("reporting_uic", uics);
    filter.push("reporting_month BETWEEN ? AND ?", [text(encode_date(start)), text(encode_date(end))]);

    let raws: Vec<Raw1352> = self
      .conn
      .call(move |conn| {
        Ok(select_where(
          conn,
          DA1352_COLUMNS,
          "da_1352",
          filter,
          "reporting_month, serial",
          Raw1352::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(Raw1352::into_report).collect()
  }

  async fn upsert_projection(&self, projection: MonthlyProjection) -> Result<MonthlyProjection> {
    let p     = projection.clone();
    let month = encode_date(p.reporting_month);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO monthly_projections
             (unit_uic, model, reporting_month, projected_hours, source)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (unit_uic, model, reporting_month) DO UPDATE SET
             projected_hours = excluded.projected_hours, source = excluded.source",
          params![p.unit_uic, p.model, month, p.projected_hours, p.source],
        )?;
        Ok(())
      })
      .await?;
    Ok(projection)
  }

  async fn list_projections<'a>(
    &'a self,
    uics: &'a [String],
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<MonthlyProjection>> {
    let mut filter = Filter::new();
    filter.push_in("unit_uic", uics);
    filter.push("reporting_month BETWEEN ? AND ?", [text(encode_date(start)), text(encode_date(end))]);

    let raws: Vec<RawProjection> = self
      .conn
      .call(move |conn| {
        Ok(select_where(
          conn,
          "unit_uic, model, reporting_month, projected_hours, source",
          "monthly_projections",
          filter,
          "reporting_month, unit_uic, model",
          RawProjection::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawProjection::into_projection).collect()
  }

  async fn add_maintenance_event(&self, event: MaintenanceEvent) -> Result<MaintenanceEvent> {
    let id    = encode_uuid(event.event_id);
    let kind  = event.maintenance_type.as_ref().to_owned();
    let start = encode_date(event.event_start);
    let end   = event.event_end.map(encode_date);
    let e     = event.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO maintenance_events
             (event_id, serial, maintenance_type, name, event_start, event_end, lane)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          params![id, e.serial, kind, e.name, start, end, e.lane],
        )?;
        Ok(())
      })
      .await?;
    Ok(event)
  }

  async fn get_maintenance_event(&self, event_id: Uuid) -> Result<Option<MaintenanceEvent>> {
    let id = encode_uuid(event_id);
    let raw: Option<RawMaintenanceEvent> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT event_id, serial, maintenance_type, name, event_start, event_end, lane
             FROM maintenance_events WHERE event_id = ?1",
            params![id],
            RawMaintenanceEvent::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawMaintenanceEvent::into_event).transpose()
  }

  async fn list_maintenance_events<'a>(
    &'a self,
    serials: &'a [String],
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<MaintenanceEvent>> {
    let mut filter = Filter::new();
    filter.push_in("serial", serials);
    filter.push(
      "COALESCE(event_end, event_start) BETWEEN ? AND ?",
      [text(encode_date(start)), text(encode_date(end))],
    );

    let raws: Vec<RawMaintenanceEvent> = self
      .conn
      .call(move |conn| {
        Ok(select_where(
          conn,
          "event_id, serial, maintenance_type, name, event_start, event_end, lane",
          "maintenance_events",
          filter,
          "COALESCE(event_end, event_start), serial",
          RawMaintenanceEvent::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawMaintenanceEvent::into_event).collect()
  }

  // ── Flights ───────────────────────────────────────────────────────────────

  async fn record_flight(&self, flight: Flight) -> Result<Flight> {
    let start = encode_dt(flight.start);
    let stop  = flight.stop.map(encode_dt);
    let f     = flight.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT OR REPLACE INTO flights ({FLIGHT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
          ),
          params![
            f.flight_id,
            f.serial,
            f.model,
            f.unit_uic,
            f.mission_type,
            start,
            stop,
            f.day_hours,
            f.day_system_hours,
            f.night_hours,
            f.night_goggles_hours,
            f.night_system_hours,
            f.hood_hours,
            f.weather_hours,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(flight_id = %flight.flight_id, serial = %flight.serial, "recorded flight");
    Ok(flight)
  }

  async fn list_flights<'a>(
    &'a self,
    uics: &'a [String],
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<Flight>> {
    let mut filter = Filter::new();
    filter.push_in("unit_uic", uics);
    filter.push("start_at >= ?", [text(encode_dt(start.and_time(NaiveTime::MIN).and_utc()))]);
    if let Some(next) = end.checked_add_days(Days::new(1)) {
      filter.push("start_at < ?", [text(encode_dt(next.and_time(NaiveTime::MIN).and_utc()))]);
    }

    let raws: Vec<RawFlight> = self
      .conn
      .call(move |conn| {
        Ok(select_where(conn, FLIGHT_COLUMNS, "flights", filter, "start_at, flight_id", RawFlight::from_row)?)
      })
      .await?;

    raws.into_iter().map(RawFlight::into_flight).collect()
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn deliver(&self, notice: Notice) -> Result<Notification> {
    let row = NoticeRow::new(&notice)?;
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        row.write(&tx)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(
      notification_id = %notice.notification.notification_id,
      recipients = notice.recipients.len(),
      "delivered notification"
    );
    Ok(notice.notification)
  }

  async fn notifications_for<'a>(&'a self, user_id: &'a str) -> Result<Vec<SoldierNotification>> {
    let mut filter = Filter::new();
    filter.push("d.user_id = ?", [text(user_id)]);

    let raws: Vec<RawDelivery> = self
      .conn
      .call(move |conn| {
        Ok(select_where(
          conn,
          DELIVERY_COLUMNS,
          "soldier_notifications d JOIN notifications n ON n.notification_id = d.notification_id",
          filter,
          "n.date_generated DESC, n.rowid DESC",
          RawDelivery::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawDelivery::into_delivery).collect()
  }

  async fn mark_notification_read<'a>(&'a self, user_id: &'a str, notification_id: Uuid) -> Result<()> {
    let (user, id) = (user_id.to_owned(), encode_uuid(notification_id));
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE soldier_notifications SET notification_read = 1
           WHERE user_id = ?1 AND notification_id = ?2",
          params![user, id],
        )?)
      })
      .await?;

    if n == 0 {
      return Err(redcon_core::Error::NotificationNotFound(notification_id).into());
    }
    Ok(())
  }

  // ── Requests ──────────────────────────────────────────────────────────────

  async fn create_access_request(&self, request: AccessRequest, notice: Notice) -> Result<AccessRequest> {
    let row   = NoticeRow::new(&notice)?;
    let id    = encode_uuid(request.request_id);
    let level = request.access_level.as_ref().to_owned();
    let at    = encode_dt(request.requested_at);
    let r     = request.clone();
    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let pending: bool = tx.query_row(
          "SELECT EXISTS (SELECT 1 FROM access_requests WHERE user_id = ?1 AND unit_uic = ?2)",
          params![r.user_id, r.unit_uic],
          |row| row.get(0),
        )?;
        if pending {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO access_requests (request_id, user_id, unit_uic, access_level, requested_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![id, r.user_id, r.unit_uic, level, at],
        )?;
        row.write(&tx)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !created {
      return Err(redcon_core::Error::DuplicateRequest(format!(
        "{} already requested access to {}",
        request.user_id, request.unit_uic
      ))
      .into());
    }
    tracing::info!(
      request_id = %request.request_id,
      user_id = %request.user_id,
      unit = %request.unit_uic,
      level = %request.access_level,
      "access requested"
    );
    Ok(request)
  }

  async fn list_access_requests(&self) -> Result<Vec<AccessRequest>> {
    let raws: Vec<RawAccessRequest> = self
      .conn
      .call(|conn| {
        Ok(select_where(
          conn,
          "request_id, user_id, unit_uic, access_level, requested_at",
          "access_requests",
          Filter::new(),
          "requested_at, rowid",
          RawAccessRequest::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawAccessRequest::into_request).collect()
  }

  async fn create_transfer_request(
    &self,
    request: TransferRequest,
    notice: Notice,
  ) -> Result<TransferRequest> {
    let row = NoticeRow::new(&notice)?;
    let id  = encode_uuid(request.request_id);
    let at  = encode_dt(request.requested_at);
    let r   = request.clone();
    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let pending: bool = tx.query_row(
          "SELECT EXISTS (SELECT 1 FROM transfer_requests WHERE soldier_id = ?1 AND gaining_uic = ?2)",
          params![r.soldier_id, r.gaining_uic],
          |row| row.get(0),
        )?;
        if pending {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO transfer_requests (request_id, requester_id, soldier_id, gaining_uic, requested_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![id, r.requester_id, r.soldier_id, r.gaining_uic, at],
        )?;
        row.write(&tx)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !created {
      return Err(redcon_core::Error::DuplicateRequest(format!(
        "{} already has a pending transfer into {}",
        request.soldier_id, request.gaining_uic
      ))
      .into());
    }
    tracing::info!(
      request_id = %request.request_id,
      soldier_id = %request.soldier_id,
      gaining = %request.gaining_uic,
      "transfer requested"
    );
    Ok(request)
  }

  async fn list_transfer_requests(&self) -> Result<Vec<TransferRequest>> {
    let raws: Vec<RawTransferRequest> = self
      .conn
      .call(|conn| {
        Ok(select_where(
          conn,
          "request_id, requester_id, soldier_id, gaining_uic, requested_at",
          "transfer_requests",
          Filter::new(),
          "requested_at, rowid",
          RawTransferRequest::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawTransferRequest::into_request).collect()
  }

  async fn settle_requests(&self, settlement: Settlement) -> Result<()> {
    let access: Vec<String> = settlement.access_requests.iter().copied().map(encode_uuid).collect();
    let transfer: Vec<String> = settlement.transfer_requests.iter().copied().map(encode_uuid).collect();
    let grants: Vec<(String, String, String)> = settlement
      .grants
      .iter()
      .map(|g| (g.user_id.clone(), g.unit_uic.clone(), g.access_level.as_ref().to_owned()))
      .collect();
    let moves = settlement
      .transfers
      .into_iter()
      .map(|s| SoldierRow::new(s, settlement.effective_at))
      .collect::<Result<Vec<_>>>()?;
    let notices = settlement.notices.iter().map(NoticeRow::new).collect::<Result<Vec<_>>>()?;
    let (n_access, n_transfer, n_moves) = (access.len(), transfer.len(), moves.len());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let settled: Vec<String> = access.iter().chain(&transfer).cloned().collect();
        if !settled.is_empty() {
          withdraw_notifications(&tx, &vec!["?"; settled.len()].join(", "), &settled)?;
        }
        delete_requests(&tx, "access_requests", &access)?;
        delete_requests(&tx, "transfer_requests", &transfer)?;

        for (user_id, unit_uic, level) in &grants {
          tx.execute(
            "INSERT INTO user_roles (user_id, unit_uic, access_level) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, unit_uic) DO UPDATE SET access_level = excluded.access_level",
            params![user_id, unit_uic, level],
          )?;
        }
        for row in &moves {
          row.write(&tx)?;
          let user_id = [row.soldier.user_id.clone()];
          withdraw_notifications(
            &tx,
            "SELECT request_id FROM transfer_requests WHERE soldier_id = ?",
            &user_id,
          )?;
          tx.execute("DELETE FROM transfer_requests WHERE soldier_id = ?1", params![user_id[0]])?;
        }
        for notice in &notices {
          notice.write(&tx)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(
      access = n_access,
      transfers = n_transfer,
      moved = n_moves,
      "settled requests"
    );
    Ok(())
  }

  // ── Designations ──────────────────────────────────────────────────────────

  async fn upsert_designation(&self, designation: Designation) -> Result<Designation> {
    let d = designation.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO designations (designation_type, description) VALUES (?1, ?2)
           ON CONFLICT (designation_type) DO UPDATE SET description = excluded.description",
          params![d.designation_type, d.description],
        )?;
        Ok(())
      })
      .await?;
    Ok(designation)
  }

  async fn list_designations(&self) -> Result<Vec<Designation>> {
    let rows: Vec<Designation> = self
      .conn
      .call(|conn| {
        Ok(select_where(
          conn,
          "designation_type, description",
          "designations",
          Filter::new(),
          "designation_type",
          |row| Ok(Designation { designation_type: row.get(0)?, description: row.get(1)? }),
        )?)
      })
      .await?;
    Ok(rows)
  }

  async fn add_soldier_designation(&self, designation: SoldierDesignation) -> Result<SoldierDesignation> {
    let raw = RawSoldierDesignation::from_designation(&designation);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO soldier_designations ({SOLDIER_DESIGNATION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
          ),
          params![
            raw.designation_id,
            raw.user_id,
            raw.designation_type,
            raw.unit_uic,
            raw.start_date,
            raw.end_date,
            raw.last_modified_by,
            raw.designation_removed,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(
      designation_id = %designation.designation_id,
      user_id = %designation.user_id,
      designation = %designation.designation_type,
      "added designation"
    );
    Ok(designation)
  }

  async fn get_soldier_designation(&self, designation_id: Uuid) -> Result<Option<SoldierDesignation>> {
    let mut filter = Filter::new();
    filter.push("designation_id = ?", [text(encode_uuid(designation_id))]);

    let raws: Vec<RawSoldierDesignation> = self
      .conn
      .call(move |conn| {
        Ok(select_where(
          conn,
          SOLDIER_DESIGNATION_COLUMNS,
          "soldier_designations",
          filter,
          "rowid",
          RawSoldierDesignation::from_row,
        )?)
      })
      .await?;

    raws.into_iter().next().map(RawSoldierDesignation::into_designation).transpose()
  }

  async fn soldier_designations<'a>(&'a self, user_id: &'a str) -> Result<Vec<SoldierDesignation>> {
    let mut filter = Filter::new();
    filter.push("user_id = ?", [text(user_id)]);
    filter.push("designation_removed = 0", []);

    let raws: Vec<RawSoldierDesignation> = self
      .conn
      .call(move |conn| {
        Ok(select_where(
          conn,
          SOLDIER_DESIGNATION_COLUMNS,
          "soldier_designations",
          filter,
          "start_date DESC, rowid DESC",
          RawSoldierDesignation::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawSoldierDesignation::into_designation).collect()
  }

  async fn remove_soldier_designation(&self, designation_id: Uuid, removed_by: Option<String>) -> Result<()> {
    let id = encode_uuid(designation_id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE soldier_designations
           SET designation_removed = 1, last_modified_by = COALESCE(?2, last_modified_by)
           WHERE designation_id = ?1 AND designation_removed = 0",
          params![id, removed_by],
        )?)
      })
      .await?;

    if n == 0 {
      return Err(redcon_core::Error::DesignationNotFound(designation_id.to_string()).into());
    }
    tracing::info!(%designation_id, "removed designation");
    Ok(())
  }

  // ── Phase teams ───────────────────────────────────────────────────────────

  async fn upsert_phase_team(&self, team: PhaseTeam) -> Result<PhaseTeam> {
    let id      = encode_uuid(team.phase_id);
    let members = encode_list(&team.phase_members)?;
    let t       = team.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO phase_teams
             (phase_id, phase_lead_user_id, assistant_phase_lead_user_id, phase_members)
           VALUES (?1, ?2, ?3, ?4)",
          params![id, t.phase_lead_user_id, t.assistant_phase_lead_user_id, members],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(phase_id = %team.phase_id, lead = %team.phase_lead_user_id, "saved phase team");
    Ok(team)
  }

  async fn get_phase_team(&self, phase_id: Uuid) -> Result<Option<PhaseTeam>> {
    let id = encode_uuid(phase_id);
    let raw: Option<(String, String, String)> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT phase_lead_user_id, assistant_phase_lead_user_id, phase_members
             FROM phase_teams WHERE phase_id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw
      .map(|(lead, assistant, members)| {
        Ok(PhaseTeam {
          phase_id,
          phase_lead_user_id: lead,
          assistant_phase_lead_user_id: assistant,
          phase_members: decode_list(&members)?,
        })
      })
      .transpose()
  }

  async fn delete_phase_team(&self, phase_id: Uuid) -> Result<bool> {
    let id = encode_uuid(phase_id);
    let n = self
      .conn
      .call(move |conn| Ok(conn.execute("DELETE FROM phase_teams WHERE phase_id = ?1", params![id])?))
      .await?;
    Ok(n > 0)
  }

  // ── Task lists ────────────────────────────────────────────────────────────

  async fn upsert_task(&self, task: Task) -> Result<Task> {
    let t = task.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT OR REPLACE INTO tasks ({TASK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
          params![
            t.task_number,
            t.task_title,
            t.pdf_url,
            t.unit_uic,
            t.training_location,
            t.frequency,
            t.subject_area,
            t.deleted,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(task)
  }

  async fn list_tasks<'a>(&'a self, task_numbers: &'a [String]) -> Result<Vec<Task>> {
    let mut filter = Filter::new();
    filter.push_in("task_number", task_numbers);

    Ok(
      self
        .conn
        .call(move |conn| Ok(select_where(conn, TASK_COLUMNS, "tasks", filter, "task_number", task_from_row)?))
        .await?,
    )
  }

  async fn create_ictl(&self, ictl: Ictl) -> Result<Ictl> {
    let raw = RawIctl::from_ictl(&ictl)?;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO ictls ({ICTL_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
          params![
            raw.ictl_id,
            raw.title,
            raw.date_published,
            raw.proponent,
            raw.unit_uic,
            raw.status,
            raw.skill_level,
            raw.mos,
            raw.target_audience,
            raw.task_numbers,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(ictl_id = %ictl.ictl_id, title = %ictl.title, unit = ?ictl.unit_uic, "created task list");
    Ok(ictl)
  }

  async fn get_ictl(&self, ictl_id: Uuid) -> Result<Option<Ictl>> {
    let mut filter = Filter::new();
    filter.push("ictl_id = ?", [text(encode_uuid(ictl_id))]);

    let raws: Vec<RawIctl> = self
      .conn
      .call(move |conn| Ok(select_where(conn, ICTL_COLUMNS, "ictls", filter, "rowid", RawIctl::from_row)?))
      .await?;

    raws.into_iter().next().map(RawIctl::into_ictl).transpose()
  }

  async fn list_ictls<'a>(&'a self, query: &'a IctlQuery) -> Result<Vec<Ictl>> {
    let mut filter = Filter::new();
    match &query.scope {
      IctlScope::Any => {}
      IctlScope::Proponent => filter.push("unit_uic IS NULL", []),
      IctlScope::Units(uics) => filter.push_in("unit_uic", uics),
    }
    if let Some(mos) = &query.mos {
      filter.push(
        format!(
          "EXISTS (SELECT 1 FROM json_each(ictls.mos) WHERE {})",
          in_list("json_each.value", mos.len())
        ),
        mos.iter().cloned().map(Value::Text),
      );
    }

    let raws: Vec<RawIctl> = self
      .conn
      .call(move |conn| {
        Ok(select_where(conn, ICTL_COLUMNS, "ictls", filter, "title, date_published", RawIctl::from_row)?)
      })
      .await?;

    raws.into_iter().map(RawIctl::into_ictl).collect()
  }
}
