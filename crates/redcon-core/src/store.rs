//! The `ReadinessStore` trait and supporting query types.
//!
//! Implemented by storage backends (e.g. `redcon-store-sqlite`). The API layer
//! and the report loaders depend on this abstraction only.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  aircraft::{Aircraft, Da1352, MaintenanceEvent, MonthlyProjection},
  designation::{Designation, SoldierDesignation},
  event::{Event, EventType},
  flag::SoldierFlag,
  flight::Flight,
  mtoe::MtoePosition,
  notification::{Notice, Notification, SoldierNotification},
  phase_team::PhaseTeam,
  request::{AccessRequest, Settlement, TransferRequest},
  role::UserRole,
  soldier::{MosCode, Soldier, SoldierSnapshot},
  task::{Ictl, Task},
  unit::{NewUnit, Unit},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`ReadinessStore::list_soldiers`].
#[derive(Debug, Clone, Default)]
pub struct SoldierQuery {
  /// Restrict to soldiers currently assigned to one of these units.
  pub unit_uics:        Option<Vec<String>>,
  pub user_ids:         Option<Vec<String>>,
  pub maintainers_only: bool,
}

/// Parameters for [`ReadinessStore::list_flags`].
///
/// `user_ids` and `unit_uics` are alternatives: a flag matches when it names
/// one of the users *or* one of the units. With neither set, every flag
/// matches.
#[derive(Debug, Clone, Default)]
pub struct FlagQuery {
  pub user_ids:        Option<Vec<String>>,
  pub unit_uics:       Option<Vec<String>>,
  /// Only flags in force at some point of `[start, end]`.
  pub overlapping:     Option<(NaiveDate, NaiveDate)>,
  pub include_deleted: bool,
}

/// Parameters for [`ReadinessStore::list_events`].
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
  pub user_ids:        Option<Vec<String>>,
  pub event_type:      Option<EventType>,
  pub start:           Option<NaiveDate>,
  pub end:             Option<NaiveDate>,
  pub include_deleted: bool,
}

/// Which task lists [`ReadinessStore::list_ictls`] returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IctlScope {
  #[default]
  Any,
  /// Lists with no owning unit.
  Proponent,
  /// UCTLs owned by one of these units.
  Units(Vec<String>),
}

/// Parameters for [`ReadinessStore::list_ictls`].
#[derive(Debug, Clone, Default)]
pub struct IctlQuery {
  pub scope: IctlScope,
  /// Lists covering at least one of these MOS codes.
  pub mos:   Option<Vec<String>>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a readiness store backend.
///
/// Soldier history is append-only: every soldier write adds a snapshot, and
/// nothing ever rewrites one. Flags and events are soft-deleted.
///
/// All methods return `Send` futures so the trait can be used behind `axum`.
pub trait ReadinessStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Units ─────────────────────────────────────────────────────────────

  /// Insert or replace a unit, then recompute the derived hierarchy fields
  /// of every unit.
  fn upsert_unit(
    &self,
    unit: NewUnit,
  ) -> impl Future<Output = Result<Unit, Self::Error>> + Send + '_;

  fn get_unit<'a>(
    &'a self,
    uic: &'a str,
  ) -> impl Future<Output = Result<Option<Unit>, Self::Error>> + Send + 'a;

  fn list_units(&self) -> impl Future<Output = Result<Vec<Unit>, Self::Error>> + Send + '_;

  // ── Soldiers ──────────────────────────────────────────────────────────

  /// Append a history snapshot effective at `effective_at`, and replace the
  /// current record unless the soldier already has a newer snapshot. Returns
  /// the current record after the write.
  fn upsert_soldier(
    &self,
    soldier: Soldier,
    effective_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Soldier, Self::Error>> + Send + '_;

  fn get_soldier<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<Soldier>, Self::Error>> + Send + 'a;

  fn list_soldiers<'a>(
    &'a self,
    query: &'a SoldierQuery,
  ) -> impl Future<Output = Result<Vec<Soldier>, Self::Error>> + Send + 'a;

  /// Every snapshot recorded on or before `last_day`.
  fn history_through(
    &self,
    last_day: NaiveDate,
  ) -> impl Future<Output = Result<Vec<SoldierSnapshot>, Self::Error>> + Send + '_;

  /// Every snapshot of one soldier, oldest first.
  fn history_for<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<SoldierSnapshot>, Self::Error>> + Send + 'a;

  // ── MOS codes ─────────────────────────────────────────────────────────

  fn upsert_mos(
    &self,
    mos: MosCode,
  ) -> impl Future<Output = Result<MosCode, Self::Error>> + Send + '_;

  fn list_mos(&self) -> impl Future<Output = Result<Vec<MosCode>, Self::Error>> + Send + '_;

  // ── Roles ─────────────────────────────────────────────────────────────

  /// Grant a role, replacing any existing grant for the same (user, unit).
  fn grant_role(
    &self,
    role: UserRole,
  ) -> impl Future<Output = Result<UserRole, Self::Error>> + Send + '_;

  /// Returns `false` if there was nothing to revoke.
  fn revoke_role<'a>(
    &'a self,
    user_id: &'a str,
    unit_uic: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn roles_for<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<UserRole>, Self::Error>> + Send + 'a;

  /// Every grant, for picking notification recipients.
  fn list_roles(&self) -> impl Future<Output = Result<Vec<UserRole>, Self::Error>> + Send + '_;

  // ── Flags ─────────────────────────────────────────────────────────────

  fn create_flag(
    &self,
    flag: SoldierFlag,
  ) -> impl Future<Output = Result<SoldierFlag, Self::Error>> + Send + '_;

  fn get_flag(
    &self,
    flag_id: Uuid,
  ) -> impl Future<Output = Result<Option<SoldierFlag>, Self::Error>> + Send + '_;

  /// Replace a stored flag with `flag`. Fails if the flag does not exist.
  fn update_flag(
    &self,
    flag: SoldierFlag,
  ) -> impl Future<Output = Result<SoldierFlag, Self::Error>> + Send + '_;

  /// Soft-delete; the row stays and `flag_deleted` is set.
  fn delete_flag(
    &self,
    flag_id: Uuid,
    deleted_by: Option<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_flags<'a>(
    &'a self,
    query: &'a FlagQuery,
  ) -> impl Future<Output = Result<Vec<SoldierFlag>, Self::Error>> + Send + 'a;

  // ── Events ────────────────────────────────────────────────────────────

  fn record_event(
    &self,
    event: Event,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  fn list_events<'a>(
    &'a self,
    query: &'a EventQuery,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + 'a;

  /// Soft-delete.
  fn delete_event(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── MTOE ──────────────────────────────────────────────────────────────

  fn add_mtoe(
    &self,
    position: MtoePosition,
  ) -> impl Future<Output = Result<MtoePosition, Self::Error>> + Send + '_;

  fn list_mtoe<'a>(
    &'a self,
    uics: &'a [String],
    fiscal_year: Option<i32>,
  ) -> impl Future<Output = Result<Vec<MtoePosition>, Self::Error>> + Send + 'a;

  // ── Fleet ─────────────────────────────────────────────────────────────

  fn upsert_aircraft(
    &self,
    aircraft: Aircraft,
  ) -> impl Future<Output = Result<Aircraft, Self::Error>> + Send + '_;

  fn get_aircraft<'a>(
    &'a self,
    serial: &'a str,
  ) -> impl Future<Output = Result<Option<Aircraft>, Self::Error>> + Send + 'a;

  /// Aircraft currently assigned to one of `uics`.
  fn list_aircraft<'a>(
    &'a self,
    uics: &'a [String],
  ) -> impl Future<Output = Result<Vec<Aircraft>, Self::Error>> + Send + 'a;

  /// Insert or replace the report for (serial, reporting_month).
  fn record_1352(
    &self,
    report: Da1352,
  ) -> impl Future<Output = Result<Da1352, Self::Error>> + Send + '_;

  fn list_1352<'a>(
    &'a self,
    uics: &'a [String],
    start: NaiveDate,
    end: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Da1352>, Self::Error>> + Send + 'a;

  /// Insert or replace the projection for (unit, model, reporting_month).
  fn upsert_projection(
    &self,
    projection: MonthlyProjection,
  ) -> impl Future<Output = Result<MonthlyProjection, Self::Error>> + Send + '_;

  fn list_projections<'a>(
    &'a self,
    uics: &'a [String],
    start: NaiveDate,
    end: NaiveDate,
  ) -> impl Future<Output = Result<Vec<MonthlyProjection>, Self::Error>> + Send + 'a;

  fn add_maintenance_event(
    &self,
    event: MaintenanceEvent,
  ) -> impl Future<Output = Result<MaintenanceEvent, Self::Error>> + Send + '_;

  fn get_maintenance_event(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Option<MaintenanceEvent>, Self::Error>> + Send + '_;

  /// Events for `serials` whose end (or start, if open-ended) falls in
  /// `[start, end]`.
  fn list_maintenance_events<'a>(
    &'a self,
    serials: &'a [String],
    start: NaiveDate,
    end: NaiveDate,
  ) -> impl Future<Output = Result<Vec<MaintenanceEvent>, Self::Error>> + Send + 'a;

  // ── Flights ───────────────────────────────────────────────────────────

  /// Insert or replace the flight with this `flight_id`.
  fn record_flight(
    &self,
    flight: Flight,
  ) -> impl Future<Output = Result<Flight, Self::Error>> + Send + '_;

  /// Flights logged by one of `uics` that started in `[start, end]`.
  fn list_flights<'a>(
    &'a self,
    uics: &'a [String],
    start: NaiveDate,
    end: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Flight>, Self::Error>> + Send + 'a;

  // ── Notifications ─────────────────────────────────────────────────────

  /// Store a notification and deliver it, unread, to every recipient.
  fn deliver(
    &self,
    notice: Notice,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// One soldier's notifications, newest first.
  fn notifications_for<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<SoldierNotification>, Self::Error>> + Send + 'a;

  /// Fails if the notification was never delivered to `user_id`.
  fn mark_notification_read<'a>(
    &'a self,
    user_id: &'a str,
    notification_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Requests ──────────────────────────────────────────────────────────

  /// Store a pending access request and deliver `notice` about it. Fails if
  /// the user already has a pending request on the unit.
  fn create_access_request(
    &self,
    request: AccessRequest,
    notice: Notice,
  ) -> impl Future<Output = Result<AccessRequest, Self::Error>> + Send + '_;

  fn list_access_requests(
    &self,
  ) -> impl Future<Output = Result<Vec<AccessRequest>, Self::Error>> + Send + '_;

  /// Store a pending transfer request and deliver `notice` about it. Fails
  /// if the soldier already has a pending request into the gaining unit.
  fn create_transfer_request(
    &self,
    request: TransferRequest,
    notice: Notice,
  ) -> impl Future<Output = Result<TransferRequest, Self::Error>> + Send + '_;

  fn list_transfer_requests(
    &self,
  ) -> impl Future<Output = Result<Vec<TransferRequest>, Self::Error>> + Send + '_;

  /// Apply an adjudication atomically; see [`Settlement`].
  fn settle_requests(
    &self,
    settlement: Settlement,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Designations ──────────────────────────────────────────────────────

  /// Insert or replace by `designation_type`.
  fn upsert_designation(
    &self,
    designation: Designation,
  ) -> impl Future<Output = Result<Designation, Self::Error>> + Send + '_;

  fn list_designations(
    &self,
  ) -> impl Future<Output = Result<Vec<Designation>, Self::Error>> + Send + '_;

  fn add_soldier_designation(
    &self,
    designation: SoldierDesignation,
  ) -> impl Future<Output = Result<SoldierDesignation, Self::Error>> + Send + '_;

  fn get_soldier_designation(
    &self,
    designation_id: Uuid,
  ) -> impl Future<Output = Result<Option<SoldierDesignation>, Self::Error>> + Send + '_;

  /// A soldier's designations that have not been removed, newest start first.
  fn soldier_designations<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<SoldierDesignation>, Self::Error>> + Send + 'a;

  /// Soft-delete.
  fn remove_soldier_designation(
    &self,
    designation_id: Uuid,
    removed_by: Option<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Phase teams ───────────────────────────────────────────────────────

  /// Insert or replace the team for `team.phase_id`.
  fn upsert_phase_team(
    &self,
    team: PhaseTeam,
  ) -> impl Future<Output = Result<PhaseTeam, Self::Error>> + Send + '_;

  fn get_phase_team(
    &self,
    phase_id: Uuid,
  ) -> impl Future<Output = Result<Option<PhaseTeam>, Self::Error>> + Send + '_;

  /// Returns `false` if there was no team.
  fn delete_phase_team(
    &self,
    phase_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Task lists ────────────────────────────────────────────────────────

  /// Insert or replace by `task_number`.
  fn upsert_task(&self, task: Task) -> impl Future<Output = Result<Task, Self::Error>> + Send + '_;

  /// Tasks with these numbers, deleted ones included.
  fn list_tasks<'a>(
    &'a self,
    task_numbers: &'a [String],
  ) -> impl Future<Output = Result<Vec<Task>, Self::Error>> + Send + 'a;

  fn create_ictl(&self, ictl: Ictl) -> impl Future<Output = Result<Ictl, Self::Error>> + Send + '_;

  fn get_ictl(
    &self,
    ictl_id: Uuid,
  ) -> impl Future<Output = Result<Option<Ictl>, Self::Error>> + Send + '_;

  fn list_ictls<'a>(
    &'a self,
    query: &'a IctlQuery,
  ) -> impl Future<Output = Result<Vec<Ictl>, Self::Error>> + Send + 'a;
}
