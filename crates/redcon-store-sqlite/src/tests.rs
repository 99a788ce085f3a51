//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, TimeZone, Utc};
use redcon_core::{
  aircraft::{Aircraft, Da1352, MaintenanceType, MonthlyProjection, NewMaintenanceEvent},
  designation::{Designation, NewSoldierDesignation},
  event::{EventTask, EventType, GoNoGo, NewEvent},
  flag::{FlagType, MxAvailability, NewFlag},
  flight::Flight,
  mtoe::MtoePosition,
  notification::{Notice, Notification, NotificationContent},
  phase_team::PhaseTeam,
  request::{
    Decision, NewAccessRequest, NewTransferRequest, settle_access, settle_transfers,
  },
  role::{AccessLevel, UserRole},
  soldier::{BirthMonth, MaintenanceLevel, MosCode, Soldier},
  store::{EventQuery, FlagQuery, IctlQuery, IctlScope, ReadinessStore, SoldierQuery},
  task::{Ictl, Task},
  unit::{Component, Echelon, NewUnit},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn new_unit(uic: &str, parent: Option<&str>) -> NewUnit {
  NewUnit {
    uic:          uic.into(),
    short_name:   format!("{uic} short"),
    display_name: format!("{uic} display"),
    nick_name:    None,
    echelon:      Echelon::Co,
    component:    Component::Active,
    state:        None,
    parent_uic:   parent.map(str::to_owned),
    start_date:   Some(ymd(2020, 10, 1)),
    end_date:     None,
  }
}

fn soldier(id: &str, unit: &str) -> Soldier {
  Soldier {
    user_id:        id.into(),
    rank:           "SGT".into(),
    first_name:     "Pat".into(),
    last_name:      "Doe".into(),
    primary_mos:    Some("15R".into()),
    additional_mos: vec!["15T".into()],
    asi_codes:      vec!["F7".into()],
    unit_uic:       unit.into(),
    is_admin:       false,
    is_maintainer:  true,
    dod_email:      Some(format!("{id}@army.mil")),
    birth_month:    BirthMonth::Mar,
    reporting_ml:   Some(MaintenanceLevel::Ml2),
  }
}

fn new_flag(user: Option<&str>, unit: Option<&str>, start: NaiveDate, end: Option<NaiveDate>) -> NewFlag {
  NewFlag {
    user_id:         user.map(str::to_owned),
    unit_uic:        unit.map(str::to_owned),
    flag_type:       FlagType::Profile,
    info:            Some("profile".into()),
    mx_availability: MxAvailability::Unavailable,
    start_date:      start,
    end_date:        end,
    remarks:         None,
  }
}

fn new_event(user: &str, date: NaiveDate, kind: EventType) -> NewEvent {
  NewEvent {
    user_id:           user.into(),
    date,
    uic:               Some("ACO".into()),
    event_type:        kind,
    evaluation_type:   None,
    training_type:     None,
    award_type:        None,
    mos:               Some("15R".into()),
    go_nogo:           Some(GoNoGo::Go),
    total_mx_hours:    Some(1.5),
    comment:           String::new(),
    maintenance_level: Some(MaintenanceLevel::Ml3),
    tasks:             vec![EventTask {
      task_number: "AVN-1".into(),
      task_name:   Some("Inspect rotor".into()),
      go_nogo:     GoNoGo::Go,
    }],
  }
}

// ─── Units ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_unit_derives_hierarchy_for_every_unit() {
  let s = store().await;
  s.upsert_unit(new_unit("BN", None)).await.unwrap();
  s.upsert_unit(new_unit("ACO", Some("BN"))).await.unwrap();
  let plt = s.upsert_unit(new_unit("APLT", Some("ACO"))).await.unwrap();

  assert_eq!(plt.level, 2);
  assert_eq!(plt.parent_uics, vec!["ACO", "BN"]);

  let bn = s.get_unit("BN").await.unwrap().unwrap();
  assert_eq!(bn.child_uics, vec!["ACO"]);
  assert_eq!(bn.subordinate_uics, vec!["ACO", "APLT"]);
  assert_eq!(bn.echelon, Echelon::Co);
  assert_eq!(bn.start_date, Some(ymd(2020, 10, 1)));

  assert_eq!(s.list_units().await.unwrap().len(), 3);
}

#[tokio::test]
async fn reparenting_a_unit_updates_old_and_new_parents() {
  let s = store().await;
  s.upsert_unit(new_unit("BN", None)).await.unwrap();
  s.upsert_unit(new_unit("ACO", Some("BN"))).await.unwrap();
  s.upsert_unit(new_unit("BCO", Some("BN"))).await.unwrap();
  s.upsert_unit(new_unit("APLT", Some("ACO"))).await.unwrap();

  s.upsert_unit(new_unit("APLT", Some("BCO"))).await.unwrap();

  let aco = s.get_unit("ACO").await.unwrap().unwrap();
  let bco = s.get_unit("BCO").await.unwrap().unwrap();
  assert!(aco.child_uics.is_empty());
  assert_eq!(bco.child_uics, vec!["APLT"]);
}

#[tokio::test]
async fn hierarchy_cycle_is_rejected_without_writing() {
  let s = store().await;
  s.upsert_unit(new_unit("BN", None)).await.unwrap();
  s.upsert_unit(new_unit("ACO", Some("BN"))).await.unwrap();

  let err = s.upsert_unit(new_unit("BN", Some("ACO"))).await.unwrap_err();
  assert!(matches!(err, Error::Core(redcon_core::Error::HierarchyCycle(_))));

  let bn = s.get_unit("BN").await.unwrap().unwrap();
  assert_eq!(bn.parent_uic, None);
}

#[tokio::test]
async fn get_unit_missing_returns_none() {
  let s = store().await;
  assert!(s.get_unit("NOPE").await.unwrap().is_none());
}

// ─── Soldiers and history ────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_soldier_round_trips_and_appends_history() {
  let s = store().await;
  let t1 = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
  let t2 = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();

  s.upsert_soldier(soldier("1", "ACO"), t1).await.unwrap();
  s.upsert_soldier(soldier("1", "BCO"), t2).await.unwrap();

  let fetched = s.get_soldier("1").await.unwrap().unwrap();
  assert_eq!(fetched, soldier("1", "BCO"));

  let history = s.history_for("1").await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].unit_uic, "ACO");
  assert_eq!(history[0].history_date, t1);
  assert_eq!(history[1].unit_uic, "BCO");
}

#[tokio::test]
async fn backdated_upsert_keeps_the_newer_current_row() {
  let s = store().await;
  let at = |m, d| Utc.with_ymd_and_hms(2024, m, d, 0, 0, 0).unwrap();

  s.upsert_soldier(soldier("1", "ACO"), at(1, 10)).await.unwrap();
  s.upsert_soldier(soldier("1", "BCO"), at(6, 1)).await.unwrap();
  let returned = s.upsert_soldier(soldier("1", "ACO"), at(3, 1)).await.unwrap();

  assert_eq!(returned.unit_uic, "BCO");
  assert_eq!(s.get_soldier("1").await.unwrap().unwrap().unit_uic, "BCO");

  let history = s.history_for("1").await.unwrap();
  let units: Vec<_> = history.iter().map(|h| (h.history_date, h.unit_uic.as_str())).collect();
  assert_eq!(units, vec![(at(1, 10), "ACO"), (at(3, 1), "ACO"), (at(6, 1), "BCO")]);

  // Same instant as the newest snapshot still counts as current.
  s.upsert_soldier(soldier("1", "ACO"), at(6, 1)).await.unwrap();
  assert_eq!(s.get_soldier("1").await.unwrap().unwrap().unit_uic, "ACO");
}

#[tokio::test]
async fn history_through_includes_the_whole_last_day() {
  let s = store().await;
  s.upsert_soldier(soldier("1", "ACO"), Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap())
    .await
    .unwrap();
  s.upsert_soldier(soldier("2", "ACO"), Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
    .await
    .unwrap();

  let through_jan = s.history_through(ymd(2024, 1, 31)).await.unwrap();
  assert_eq!(through_jan.len(), 1);
  assert_eq!(through_jan[0].user_id, "1");
  assert_eq!(s.history_through(ymd(2024, 2, 1)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn list_soldiers_filters_by_unit_and_maintainer() {
  let s = store().await;
  let now = Utc::now();
  s.upsert_soldier(soldier("1", "ACO"), now).await.unwrap();
  s.upsert_soldier(soldier("2", "BCO"), now).await.unwrap();
  s.upsert_soldier(Soldier { is_maintainer: false, ..soldier("3", "ACO") }, now)
    .await
    .unwrap();

  let all = s.list_soldiers(&SoldierQuery::default()).await.unwrap();
  assert_eq!(all.len(), 3);

  let q = SoldierQuery {
    unit_uics:        Some(vec!["ACO".into()]),
    maintainers_only: true,
    ..Default::default()
  };
  let aco = s.list_soldiers(&q).await.unwrap();
  assert_eq!(aco.iter().map(|s| s.user_id.as_str()).collect::<Vec<_>>(), vec!["1"]);

  let none = SoldierQuery { unit_uics: Some(vec![]), ..Default::default() };
  assert!(s.list_soldiers(&none).await.unwrap().is_empty());

  let by_id = SoldierQuery { user_ids: Some(vec!["2".into(), "3".into()]), ..Default::default() };
  let picked = s.list_soldiers(&by_id).await.unwrap();
  assert_eq!(picked.iter().map(|s| s.user_id.as_str()).collect::<Vec<_>>(), vec!["2", "3"]);
}

// ─── MOS and roles ───────────────────────────────────────────────────────────

#[tokio::test]
async fn mos_codes_upsert_by_code() {
  let s = store().await;
  let mut code = MosCode { mos: "15R".into(), description: "Attack".into(), amtp_mos: true, ictl_mos: false };
  s.upsert_mos(code.clone()).await.unwrap();
  code.description = "Attack Helicopter Repairer".into();
  s.upsert_mos(code.clone()).await.unwrap();

  assert_eq!(s.list_mos().await.unwrap(), vec![code]);
}

#[tokio::test]
async fn grant_replaces_and_revoke_reports_presence() {
  let s = store().await;
  let role = |level| UserRole { user_id: "1".into(), unit_uic: "BN".into(), access_level: level };
  s.grant_role(role(AccessLevel::Viewer)).await.unwrap();
  s.grant_role(role(AccessLevel::Manager)).await.unwrap();

  let roles = s.roles_for("1").await.unwrap();
  assert_eq!(roles, vec![role(AccessLevel::Manager)]);

  assert!(s.revoke_role("1", "BN").await.unwrap());
  assert!(!s.revoke_role("1", "BN").await.unwrap());
  assert!(s.roles_for("1").await.unwrap().is_empty());
}

// ─── Flags ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn flags_update_and_soft_delete() {
  let s = store().await;
  let flag = new_flag(Some("1"), None, ymd(2024, 1, 1), None).into_flag(Some("9".into()));
  s.create_flag(flag.clone()).await.unwrap();

  let mut changed = flag.clone();
  changed.end_date = Some(ymd(2024, 2, 1));
  s.update_flag(changed.clone()).await.unwrap();
  assert_eq!(s.get_flag(flag.flag_id).await.unwrap().unwrap(), changed);

  s.delete_flag(flag.flag_id, Some("8".into())).await.unwrap();
  let deleted = s.get_flag(flag.flag_id).await.unwrap().unwrap();
  assert!(deleted.flag_deleted);
  assert_eq!(deleted.last_modified_by.as_deref(), Some("8"));

  assert!(s.list_flags(&FlagQuery::default()).await.unwrap().is_empty());
  let with_deleted = FlagQuery { include_deleted: true, ..Default::default() };
  assert_eq!(s.list_flags(&with_deleted).await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_flag_update_and_delete_are_not_found() {
  let s = store().await;
  let flag = new_flag(Some("1"), None, ymd(2024, 1, 1), None).into_flag(None);

  let err = s.update_flag(flag).await.unwrap_err();
  assert!(err.is_not_found());
  assert!(s.delete_flag(Uuid::new_v4(), None).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn list_flags_matches_user_or_unit_within_window() {
  let s = store().await;
  let mine = new_flag(Some("1"), None, ymd(2024, 1, 1), Some(ymd(2024, 1, 31))).into_flag(None);
  let unit = new_flag(None, Some("ACO"), ymd(2024, 3, 1), None).into_flag(None);
  let other = new_flag(Some("2"), None, ymd(2024, 1, 1), None).into_flag(None);
  for f in [&mine, &unit, &other] {
    s.create_flag(f.clone()).await.unwrap();
  }

  let q = FlagQuery {
    user_ids: Some(vec!["1".into()]),
    unit_uics: Some(vec!["ACO".into()]),
    ..Default::default()
  };
  let ids: Vec<_> = s.list_flags(&q).await.unwrap().into_iter().map(|f| f.flag_id).collect();
  assert_eq!(ids, vec![mine.flag_id, unit.flag_id]);

  let feb = FlagQuery { overlapping: Some((ymd(2024, 2, 1), ymd(2024, 2, 29))), ..q.clone() };
  assert!(s.list_flags(&feb).await.unwrap().is_empty());

  let march = FlagQuery { overlapping: Some((ymd(2024, 3, 15), ymd(2024, 3, 31))), ..q };
  let found = s.list_flags(&march).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].flag_id, unit.flag_id);
}

#[tokio::test]
async fn flag_without_target_is_rejected_by_the_database() {
  let s = store().await;
  let flag = new_flag(None, None, ymd(2024, 1, 1), None).into_flag(None);
  assert!(matches!(s.create_flag(flag).await.unwrap_err(), Error::Database(_)));
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn events_round_trip_with_tasks() {
  let s = store().await;
  let event = new_event("1", ymd(2024, 2, 10), EventType::Evaluation).into_event(Some("9".into()));
  s.record_event(event.clone()).await.unwrap();

  let fetched = s.get_event(event.event_id).await.unwrap().unwrap();
  assert_eq!(fetched, event);
  assert_eq!(fetched.tasks.len(), 1);
}

#[tokio::test]
async fn list_events_filters_and_hides_deleted() {
  let s = store().await;
  let jan = new_event("1", ymd(2024, 1, 5), EventType::Evaluation).into_event(None);
  let feb = new_event("1", ymd(2024, 2, 5), EventType::Training).into_event(None);
  let mar = new_event("2", ymd(2024, 3, 5), EventType::Evaluation).into_event(None);
  for e in [&jan, &feb, &mar] {
    s.record_event(e.clone()).await.unwrap();
  }

  let evals = EventQuery { event_type: Some(EventType::Evaluation), ..Default::default() };
  assert_eq!(s.list_events(&evals).await.unwrap().len(), 2);

  let window = EventQuery {
    user_ids: Some(vec!["1".into()]),
    start: Some(ymd(2024, 2, 1)),
    end: Some(ymd(2024, 2, 29)),
    ..Default::default()
  };
  let found = s.list_events(&window).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].event_id, feb.event_id);

  s.delete_event(feb.event_id).await.unwrap();
  assert!(s.list_events(&window).await.unwrap().is_empty());
  assert!(s.delete_event(Uuid::new_v4()).await.unwrap_err().is_not_found());
}

// ─── MTOE ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn mtoe_filters_by_unit_and_fiscal_year() {
  let s = store().await;
  let pos = |uic: &str, fy| MtoePosition {
    uic:                 uic.into(),
    fiscal_year:         fy,
    position_code:       "15R10".into(),
    authorized_strength: 4,
    required_strength:   5,
    asi_codes:           vec!["F7".into()],
  };
  s.add_mtoe(pos("ACO", 2024)).await.unwrap();
  s.add_mtoe(pos("ACO", 2025)).await.unwrap();
  s.add_mtoe(pos("BCO", 2025)).await.unwrap();

  let found = s.list_mtoe(&["ACO".into()], Some(2025)).await.unwrap();
  assert_eq!(found, vec![pos("ACO", 2025)]);
  assert_eq!(s.list_mtoe(&["ACO".into(), "BCO".into()], None).await.unwrap().len(), 3);
}

// ─── Fleet ───────────────────────────────────────────────────────────────────

fn aircraft(serial: &str, unit: &str) -> Aircraft {
  Aircraft {
    serial:               serial.into(),
    model:                "UH-60M".into(),
    status:               "FMC".into(),
    rtl:                  "RTL".into(),
    current_unit:         unit.into(),
    total_airframe_hours: 1200.0,
    flight_hours:         1000.0,
    hours_to_phase:       240.0,
    in_phase:             false,
    remarks:              None,
    date_down:            None,
    ecd:                  Some(ymd(2024, 5, 1)),
  }
}

fn report(serial: &str, month: NaiveDate, flying: f64) -> Da1352 {
  Da1352 {
    serial:                serial.into(),
    reporting_uic:         "ACO".into(),
    reporting_month:       month,
    model:                 "UH-60M".into(),
    flying_hours:          flying,
    fmc_hours:             600.0,
    field_hours:           50.0,
    pmcm_hours:            10.0,
    pmcs_hours:            10.0,
    dade_hours:            0.0,
    sust_hours:            20.0,
    nmcs_hours:            20.0,
    nmcm_hours:            30.0,
    total_hours_in_status: 720.0,
  }
}

#[tokio::test]
async fn aircraft_round_trip_and_list_by_unit() {
  let s = store().await;
  s.upsert_aircraft(aircraft("001", "ACO")).await.unwrap();
  s.upsert_aircraft(aircraft("002", "BCO")).await.unwrap();

  assert_eq!(s.get_aircraft("001").await.unwrap().unwrap(), aircraft("001", "ACO"));
  let listed = s.list_aircraft(&["BCO".into()]).await.unwrap();
  assert_eq!(listed, vec![aircraft("002", "BCO")]);
}

#[tokio::test]
async fn da_1352_replaces_on_serial_and_month() {
  let s = store().await;
  s.record_1352(report("001", ymd(2024, 1, 15), 10.0)).await.unwrap();
  s.record_1352(report("001", ymd(2024, 1, 15), 12.5)).await.unwrap();
  s.record_1352(report("001", ymd(2024, 2, 15), 8.0)).await.unwrap();

  let jan = s.list_1352(&["ACO".into()], ymd(2024, 1, 1), ymd(2024, 1, 31)).await.unwrap();
  assert_eq!(jan, vec![report("001", ymd(2024, 1, 15), 12.5)]);
  assert_eq!(
    s.list_1352(&["ACO".into()], ymd(2024, 1, 1), ymd(2024, 12, 31)).await.unwrap().len(),
    2
  );
}

#[tokio::test]
async fn projections_upsert_on_unit_model_month() {
  let s = store().await;
  let p = |hours| MonthlyProjection {
    unit_uic:        "BN".into(),
    model:           "UH-60M".into(),
    reporting_month: ymd(2024, 4, 15),
    projected_hours: hours,
    source:          "planner".into(),
  };
  s.upsert_projection(p(100.0)).await.unwrap();
  s.upsert_projection(p(150.0)).await.unwrap();

  let found = s.list_projections(&["BN".into()], ymd(2024, 4, 1), ymd(2024, 4, 30)).await.unwrap();
  assert_eq!(found, vec![p(150.0)]);
}

#[tokio::test]
async fn maintenance_events_match_on_end_or_open_start() {
  let s = store().await;
  let ev = |start, end| NewMaintenanceEvent {
    serial:           "001".into(),
    maintenance_type: MaintenanceType::Phase,
    name:             "PMI-1".into(),
    event_start:      start,
    event_end:        end,
    lane:             None,
  };
  let closed = s.add_maintenance_event(ev(ymd(2024, 1, 20), Some(ymd(2024, 3, 2))).into()).await.unwrap();
  let open = s.add_maintenance_event(ev(ymd(2024, 3, 10), None).into()).await.unwrap();
  s.add_maintenance_event(ev(ymd(2024, 1, 1), Some(ymd(2024, 1, 30))).into()).await.unwrap();

  let march = s
    .list_maintenance_events(&["001".into()], ymd(2024, 3, 1), ymd(2024, 3, 31))
    .await
    .unwrap();
  assert_eq!(march, vec![closed, open]);
}

// ─── Flights ─────────────────────────────────────────────────────────────────

fn flight(id: &str, unit: &str, start: chrono::DateTime<Utc>) -> Flight {
  Flight {
    flight_id:           id.into(),
    serial:              "001".into(),
    model:               "UH-60M".into(),
    unit_uic:            unit.into(),
    mission_type:        "TRAINING".into(),
    start,
    stop:                Some(start + chrono::Duration::hours(2)),
    day_hours:           1.5,
    day_system_hours:    0.0,
    night_hours:         0.0,
    night_goggles_hours: 0.5,
    night_system_hours:  0.0,
    hood_hours:          0.0,
    weather_hours:       0.0,
  }
}

#[tokio::test]
async fn flights_are_listed_by_unit_through_the_last_day() {
  let s = store().await;
  let late = flight("F2", "ACO", Utc.with_ymd_and_hms(2024, 3, 31, 23, 30, 0).unwrap());
  let early = flight("F1", "ACO", Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
  s.record_flight(late.clone()).await.unwrap();
  s.record_flight(early.clone()).await.unwrap();
  s.record_flight(flight("F3", "ACO", Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()))
    .await
    .unwrap();
  s.record_flight(flight("F4", "BCO", Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()))
    .await
    .unwrap();

  let march = s.list_flights(&["ACO".into()], ymd(2024, 3, 1), ymd(2024, 3, 31)).await.unwrap();
  assert_eq!(march, vec![early, late]);
}

// ─── Notifications ───────────────────────────────────────────────────────────

fn announcement(title: &str, at: chrono::DateTime<Utc>) -> Notification {
  Notification::new(
    NotificationContent::Announcement {
      title:        title.into(),
      announcement: format!("{title} body"),
      url:          None,
    },
    at,
  )
}

#[tokio::test]
async fn notifications_are_delivered_newest_first_and_marked_read_per_soldier() {
  let s = store().await;
  let older = announcement("Older", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
  let newer = announcement("Newer", Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
  s.deliver(Notice::to(older.clone(), ["1".to_owned(), "2".to_owned()])).await.unwrap();
  s.deliver(Notice::to(newer.clone(), ["1".to_owned()])).await.unwrap();

  let mine = s.notifications_for("1").await.unwrap();
  let ids: Vec<_> = mine.iter().map(|n| n.notification.notification_id).collect();
  assert_eq!(ids, vec![newer.notification_id, older.notification_id]);
  assert!(mine.iter().all(|n| !n.read));

  s.mark_notification_read("1", older.notification_id).await.unwrap();
  let mine = s.notifications_for("1").await.unwrap();
  assert!(mine[1].read);
  assert_eq!(mine[1].notification, older);
  assert!(!s.notifications_for("2").await.unwrap()[0].read);

  let err = s.mark_notification_read("2", newer.notification_id).await.unwrap_err();
  assert!(err.is_not_found());
}

// ─── Requests ────────────────────────────────────────────────────────────────

fn at() -> chrono::DateTime<Utc> { Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() }

#[tokio::test]
async fn a_second_access_request_on_the_same_unit_is_a_duplicate() {
  let s = store().await;
  let ask = || {
    NewAccessRequest { unit_uic: "ACO".into(), access_level: AccessLevel::Evaluator }
      .into_request("1".into(), at())
  };
  let first = ask();
  let alert = announcement("alert", at()).about(first.request_id);
  s.create_access_request(first.clone(), Notice::to(alert, ["9".to_owned()])).await.unwrap();

  let err = s.create_access_request(ask(), Notice::to(announcement("x", at()), [])).await.unwrap_err();
  assert!(matches!(err, Error::Core(redcon_core::Error::DuplicateRequest(_))));
  assert_eq!(s.list_access_requests().await.unwrap(), vec![first]);
  assert_eq!(s.notifications_for("9").await.unwrap().len(), 1);
}

#[tokio::test]
async fn settling_access_grants_the_role_and_swaps_the_notifications() {
  let s = store().await;
  let req = NewAccessRequest { unit_uic: "ACO".into(), access_level: AccessLevel::Manager }
    .into_request("1".into(), at());
  let alert = announcement("alert", at()).about(req.request_id);
  s.create_access_request(req.clone(), Notice::to(alert, ["9".to_owned()])).await.unwrap();

  let settlement = settle_access(std::slice::from_ref(&req), Decision::Approved, str::to_owned, at());
  s.settle_requests(settlement).await.unwrap();

  assert!(s.list_access_requests().await.unwrap().is_empty());
  assert!(s.notifications_for("9").await.unwrap().is_empty());
  assert_eq!(s.roles_for("1").await.unwrap(), vec![UserRole {
    user_id:      "1".into(),
    unit_uic:     "ACO".into(),
    access_level: AccessLevel::Manager,
  }]);
  let told = s.notifications_for("1").await.unwrap();
  assert_eq!(told.len(), 1);
  assert_eq!(
    told[0].notification.verbose_display(),
    "Your Access Request for MANAGER role in ACO has been approved"
  );
}

#[tokio::test]
async fn approved_transfer_moves_the_soldier_and_clears_other_requests() {
  let s = store().await;
  s.upsert_unit(new_unit("ACO", None)).await.unwrap();
  s.upsert_unit(new_unit("BCO", None)).await.unwrap();
  s.upsert_unit(new_unit("CCO", None)).await.unwrap();
  let pat = s
    .upsert_soldier(soldier("1", "ACO"), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    .await
    .unwrap();

  let mut requests = Vec::new();
  for gaining in ["BCO", "CCO"] {
    let req = NewTransferRequest { soldier_ids: vec!["1".into()], gaining_uic: gaining.into() }
      .into_requests("7", at())
      .remove(0);
    let alert = announcement(gaining, at()).about(req.request_id);
    s.create_transfer_request(req.clone(), Notice::to(alert, ["9".to_owned()])).await.unwrap();
    requests.push(req);
  }
  assert_eq!(s.notifications_for("9").await.unwrap().len(), 2);

  let settlement = settle_transfers(&[(requests[0].clone(), pat)], Decision::Approved, str::to_owned, at());
  s.settle_requests(settlement).await.unwrap();

  assert_eq!(s.get_soldier("1").await.unwrap().unwrap().unit_uic, "BCO");
  assert!(s.list_transfer_requests().await.unwrap().is_empty());
  assert!(s.notifications_for("9").await.unwrap().is_empty());
  assert_eq!(s.notifications_for("7").await.unwrap().len(), 1);
  assert_eq!(s.history_for("1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn denied_transfer_leaves_the_soldier_in_place() {
  let s = store().await;
  s.upsert_unit(new_unit("ACO", None)).await.unwrap();
  s.upsert_unit(new_unit("BCO", None)).await.unwrap();
  let pat = s
    .upsert_soldier(soldier("1", "ACO"), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    .await
    .unwrap();
  let req = NewTransferRequest { soldier_ids: vec!["1".into()], gaining_uic: "BCO".into() }
    .into_requests("7", at())
    .remove(0);
  s.create_transfer_request(req.clone(), Notice::to(announcement("a", at()).about(req.request_id), []))
    .await
    .unwrap();

  let settlement = settle_transfers(&[(req, pat)], Decision::Denied, str::to_owned, at());
  s.settle_requests(settlement).await.unwrap();

  assert_eq!(s.get_soldier("1").await.unwrap().unwrap().unit_uic, "ACO");
  assert!(s.list_transfer_requests().await.unwrap().is_empty());
  let told = s.notifications_for("7").await.unwrap();
  assert!(told[0].notification.verbose_display().ends_with("has been denied"));
}

// ─── Designations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn designations_list_newest_first_and_hide_removed_ones() {
  let s = store().await;
  for kind in ["TI", "ME"] {
    s.upsert_designation(Designation { designation_type: kind.into(), description: None })
      .await
      .unwrap();
  }
  s.upsert_designation(Designation { designation_type: "TI".into(), description: Some("Instructor".into()) })
    .await
    .unwrap();
  assert_eq!(s.list_designations().await.unwrap()[1].description.as_deref(), Some("Instructor"));

  let add = |kind: &str, start| NewSoldierDesignation {
    user_id:          "1".into(),
    designation_type: kind.into(),
    unit_uic:         Some("ACO".into()),
    start_date:       Some(start),
    end_date:         None,
  };
  let ti = add("TI", ymd(2023, 1, 1)).into_designation(ymd(2024, 1, 1), Some("9".into())).unwrap();
  let me = add("ME", ymd(2024, 1, 1)).into_designation(ymd(2024, 1, 1), Some("9".into())).unwrap();
  s.add_soldier_designation(ti.clone()).await.unwrap();
  s.add_soldier_designation(me.clone()).await.unwrap();
  assert_eq!(s.soldier_designations("1").await.unwrap(), vec![me.clone(), ti.clone()]);

  s.remove_soldier_designation(me.designation_id, Some("8".into())).await.unwrap();
  assert_eq!(s.soldier_designations("1").await.unwrap(), vec![ti]);
  let removed = s.get_soldier_designation(me.designation_id).await.unwrap().unwrap();
  assert!(removed.designation_removed);
  assert_eq!(removed.last_modified_by.as_deref(), Some("8"));

  let again = s.remove_soldier_designation(me.designation_id, None).await.unwrap_err();
  assert!(again.is_not_found());
}

// ─── Phase teams ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn phase_team_is_replaced_and_deleted() {
  let s = store().await;
  let phase_id = Uuid::new_v4();
  let team = |members: &[&str]| PhaseTeam {
    phase_id,
    phase_lead_user_id: "1".into(),
    assistant_phase_lead_user_id: "2".into(),
    phase_members: members.iter().map(|m| m.to_string()).collect(),
  };
  s.upsert_phase_team(team(&["3"])).await.unwrap();
  s.upsert_phase_team(team(&["3", "4"])).await.unwrap();
  assert_eq!(s.get_phase_team(phase_id).await.unwrap(), Some(team(&["3", "4"])));

  assert!(s.delete_phase_team(phase_id).await.unwrap());
  assert!(!s.delete_phase_team(phase_id).await.unwrap());
  assert_eq!(s.get_phase_team(phase_id).await.unwrap(), None);
}

// ─── Task lists ──────────────────────────────────────────────────────────────

fn ictl(title: &str, unit: Option<&str>, mos: &[&str]) -> Ictl {
  Ictl {
    ictl_id:         Uuid::new_v4(),
    title:           title.into(),
    date_published:  ymd(2023, 6, 1),
    proponent:       unit.is_none().then(|| "USAACE".into()),
    unit_uic:        unit.map(str::to_owned),
    status:          Some("Approved".into()),
    skill_level:     Some("SL1".into()),
    mos:             mos.iter().map(|m| m.to_string()).collect(),
    target_audience: None,
    task_numbers:    vec!["AVN-1".into()],
  }
}

#[tokio::test]
async fn task_lists_filter_by_scope_and_mos() {
  let s = store().await;
  let crew = ictl("Crew chief", None, &["15T", "15R"]);
  let armament = ictl("Armament", None, &["15J"]);
  let local = ictl("ACO local", Some("ACO"), &["15R"]);
  for list in [&crew, &armament, &local] {
    s.create_ictl(list.clone()).await.unwrap();
  }

  let all = s.list_ictls(&IctlQuery::default()).await.unwrap();
  assert_eq!(all.len(), 3);

  let proponent = IctlQuery { scope: IctlScope::Proponent, mos: Some(vec!["15R".into()]) };
  assert_eq!(s.list_ictls(&proponent).await.unwrap(), vec![crew.clone()]);

  let units = IctlQuery { scope: IctlScope::Units(vec!["ACO".into()]), mos: None };
  assert_eq!(s.list_ictls(&units).await.unwrap(), vec![local]);

  let nobody = IctlQuery { scope: IctlScope::Any, mos: Some(vec![]) };
  assert!(s.list_ictls(&nobody).await.unwrap().is_empty());

  assert_eq!(s.get_ictl(armament.ictl_id).await.unwrap(), Some(armament));
}

#[tokio::test]
async fn tasks_are_looked_up_by_number() {
  let s = store().await;
  let task = |n: &str| Task {
    task_number:       n.into(),
    task_title:        format!("{n} title"),
    pdf_url:           None,
    unit_uic:          None,
    training_location: None,
    frequency:         Some("Annually".into()),
    subject_area:      None,
    deleted:           false,
  };
  s.upsert_task(task("AVN-1")).await.unwrap();
  s.upsert_task(task("AVN-2")).await.unwrap();

  let found = s.list_tasks(&["AVN-2".into(), "AVN-9".into()]).await.unwrap();
  assert_eq!(found, vec![task("AVN-2")]);
}
