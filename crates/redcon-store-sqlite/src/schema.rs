//! SQL schema for the readiness SQLite store.
//!
//! Executed once at connection startup. The schema version is recorded in
//! `PRAGMA user_version`; later migrations will be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- parent_uics, child_uics and subordinate_uics are derived from parent_uic
-- and rewritten for every unit whenever any unit changes.
CREATE TABLE IF NOT EXISTS units (
    uic              TEXT PRIMARY KEY,
    short_name       TEXT NOT NULL,
    display_name     TEXT NOT NULL,
    nick_name        TEXT,
    echelon          TEXT NOT NULL DEFAULT 'UNK',
    component        TEXT NOT NULL DEFAULT 'UNK',
    state            TEXT,
    parent_uic       TEXT,
    start_date       TEXT,
    end_date         TEXT,
    level            INTEGER NOT NULL DEFAULT 0,
    parent_uics      TEXT NOT NULL DEFAULT '[]',
    child_uics       TEXT NOT NULL DEFAULT '[]',
    subordinate_uics TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS mos_codes (
    mos         TEXT PRIMARY KEY,
    description TEXT NOT NULL,
    amtp_mos    INTEGER NOT NULL DEFAULT 0,
    ictl_mos    INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS soldiers (
    user_id        TEXT PRIMARY KEY,
    rank           TEXT NOT NULL,
    first_name     TEXT NOT NULL,
    last_name      TEXT NOT NULL,
    primary_mos    TEXT,
    additional_mos TEXT NOT NULL DEFAULT '[]',
    asi_codes      TEXT NOT NULL DEFAULT '[]',
    unit_uic       TEXT NOT NULL,
    is_admin       INTEGER NOT NULL DEFAULT 0,
    is_maintainer  INTEGER NOT NULL DEFAULT 1,
    dod_email      TEXT,
    birth_month    TEXT NOT NULL DEFAULT 'UNK',
    reporting_ml   TEXT
);

-- Soldier history is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS soldier_history (
    history_id    TEXT PRIMARY KEY,
    history_date  TEXT NOT NULL,   -- RFC 3339 UTC, microseconds, 'Z'
    user_id       TEXT NOT NULL,
    rank          TEXT NOT NULL,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    primary_mos   TEXT,
    asi_codes     TEXT NOT NULL DEFAULT '[]',
    unit_uic      TEXT NOT NULL,
    is_maintainer INTEGER NOT NULL,
    birth_month   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_roles (
    user_id      TEXT NOT NULL,
    unit_uic     TEXT NOT NULL,
    access_level TEXT NOT NULL,
    UNIQUE (user_id, unit_uic)
);

CREATE TABLE IF NOT EXISTS soldier_flags (
    flag_id          TEXT PRIMARY KEY,
    user_id          TEXT,
    unit_uic         TEXT,
    flag_type        TEXT NOT NULL,
    info             TEXT,
    mx_availability  TEXT NOT NULL DEFAULT 'UNAVAILABLE',
    start_date       TEXT NOT NULL,
    end_date         TEXT,
    remarks          TEXT,
    created_by       TEXT,
    last_modified_by TEXT,
    flag_deleted     INTEGER NOT NULL DEFAULT 0,
    CHECK (user_id IS NOT NULL OR unit_uic IS NOT NULL),
    CHECK (end_date IS NULL OR start_date <= end_date)
);

CREATE TABLE IF NOT EXISTS events (
    event_id          TEXT PRIMARY KEY,
    user_id           TEXT NOT NULL,
    date              TEXT NOT NULL,
    uic               TEXT,
    event_type        TEXT NOT NULL,
    evaluation_type   TEXT,
    training_type     TEXT,
    award_type        TEXT,
    mos               TEXT,
    go_nogo           TEXT,
    total_mx_hours    REAL,
    comment           TEXT NOT NULL DEFAULT '',
    maintenance_level TEXT,
    recorded_by       TEXT,
    event_deleted     INTEGER NOT NULL DEFAULT 0,
    tasks             TEXT NOT NULL DEFAULT '[]'   -- JSON array of EventTask
);

CREATE TABLE IF NOT EXISTS mtoe (
    uic                 TEXT NOT NULL,
    fiscal_year         INTEGER NOT NULL,
    position_code       TEXT NOT NULL,
    authorized_strength INTEGER NOT NULL DEFAULT 0,
    required_strength   INTEGER NOT NULL DEFAULT 0,
    asi_codes           TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS aircraft (
    serial               TEXT PRIMARY KEY,
    model                TEXT NOT NULL,
    status               TEXT NOT NULL,
    rtl                  TEXT NOT NULL,
    current_unit         TEXT NOT NULL,
    total_airframe_hours REAL NOT NULL DEFAULT 0,
    flight_hours         REAL NOT NULL DEFAULT 0,
    hours_to_phase       REAL NOT NULL DEFAULT 0,
    in_phase             INTEGER NOT NULL DEFAULT 0,
    remarks              TEXT,
    date_down            TEXT,
    ecd                  TEXT
);

CREATE TABLE IF NOT EXISTS da_1352 (
    serial                TEXT NOT NULL,
    reporting_uic         TEXT NOT NULL,
    reporting_month       TEXT NOT NULL,
    model                 TEXT NOT NULL,
    flying_hours          REAL NOT NULL DEFAULT 0,
    fmc_hours             REAL NOT NULL DEFAULT 0,
    field_hours           REAL NOT NULL DEFAULT 0,
    pmcm_hours            REAL NOT NULL DEFAULT 0,
    pmcs_hours            REAL NOT NULL DEFAULT 0,
    dade_hours            REAL NOT NULL DEFAULT 0,
    sust_hours            REAL NOT NULL DEFAULT 0,
    nmcs_hours            REAL NOT NULL DEFAULT 0,
    nmcm_hours            REAL NOT NULL DEFAULT 0,
    total_hours_in_status REAL NOT NULL DEFAULT 0,
    UNIQUE (serial, reporting_month)
);

CREATE TABLE IF NOT EXISTS monthly_projections (
    unit_uic        TEXT NOT NULL,
    model           TEXT NOT NULL,
    reporting_month TEXT NOT NULL,
    projected_hours REAL NOT NULL,
    source          TEXT NOT NULL,
    UNIQUE (unit_uic, model, reporting_month)
);

CREATE TABLE IF NOT EXISTS maintenance_events (
    event_id         TEXT PRIMARY KEY,
    serial           TEXT NOT NULL,
    maintenance_type TEXT NOT NULL,
    name             TEXT NOT NULL,
    event_start      TEXT NOT NULL,
    event_end        TEXT,
    lane             TEXT
);

CREATE TABLE IF NOT EXISTS flights (
    flight_id           TEXT PRIMARY KEY,
    serial              TEXT NOT NULL,
    model               TEXT NOT NULL,
    unit_uic            TEXT NOT NULL,
    mission_type        TEXT NOT NULL,
    start_at            TEXT NOT NULL,   -- RFC 3339 UTC
    stop_at             TEXT,
    day_hours           REAL NOT NULL DEFAULT 0,
    day_system_hours    REAL NOT NULL DEFAULT 0,
    night_hours         REAL NOT NULL DEFAULT 0,
    night_goggles_hours REAL NOT NULL DEFAULT 0,
    night_system_hours  REAL NOT NULL DEFAULT 0,
    hood_hours          REAL NOT NULL DEFAULT 0,
    weather_hours       REAL NOT NULL DEFAULT 0
);

-- content is the JSON-encoded NotificationContent. Deleting a settled
-- request deletes the notifications about it and their deliveries.
CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    date_generated  TEXT NOT NULL,
    request_id      TEXT,
    content         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS soldier_notifications (
    user_id           TEXT NOT NULL,
    notification_id   TEXT NOT NULL REFERENCES notifications(notification_id) ON DELETE CASCADE,
    notification_read INTEGER NOT NULL DEFAULT 0,
    UNIQUE (user_id, notification_id)
);

CREATE TABLE IF NOT EXISTS access_requests (
    request_id   TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL,
    unit_uic     TEXT NOT NULL,
    access_level TEXT NOT NULL,
    requested_at TEXT NOT NULL,
    UNIQUE (user_id, unit_uic)
);

CREATE TABLE IF NOT EXISTS transfer_requests (
    request_id   TEXT PRIMARY KEY,
    requester_id TEXT NOT NULL,
    soldier_id   TEXT NOT NULL,
    gaining_uic  TEXT NOT NULL,
    requested_at TEXT NOT NULL,
    UNIQUE (soldier_id, gaining_uic)
);

CREATE TABLE IF NOT EXISTS designations (
    designation_type TEXT PRIMARY KEY,
    description      TEXT
);

CREATE TABLE IF NOT EXISTS soldier_designations (
    designation_id      TEXT PRIMARY KEY,
    user_id             TEXT NOT NULL,
    designation_type    TEXT NOT NULL REFERENCES designations(designation_type),
    unit_uic            TEXT,
    start_date          TEXT NOT NULL,
    end_date            TEXT,
    last_modified_by    TEXT,
    designation_removed INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS phase_teams (
    phase_id                     TEXT PRIMARY KEY,
    phase_lead_user_id           TEXT NOT NULL,
    assistant_phase_lead_user_id TEXT NOT NULL,
    phase_members                TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS tasks (
    task_number       TEXT PRIMARY KEY,
    task_title        TEXT NOT NULL,
    pdf_url           TEXT,
    unit_uic          TEXT,
    training_location TEXT,
    frequency         TEXT,
    subject_area      TEXT,
    deleted           INTEGER NOT NULL DEFAULT 0
);

-- mos and task_numbers are JSON arrays.
CREATE TABLE IF NOT EXISTS ictls (
    ictl_id         TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    date_published  TEXT NOT NULL,
    proponent       TEXT,
    unit_uic        TEXT,
    status          TEXT,
    skill_level     TEXT,
    mos             TEXT NOT NULL DEFAULT '[]',
    target_audience TEXT,
    task_numbers    TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS history_user_idx   ON soldier_history(user_id, history_date);
CREATE INDEX IF NOT EXISTS history_date_idx   ON soldier_history(history_date);
CREATE INDEX IF NOT EXISTS soldiers_unit_idx  ON soldiers(unit_uic);
CREATE INDEX IF NOT EXISTS flags_user_idx     ON soldier_flags(user_id);
CREATE INDEX IF NOT EXISTS flags_unit_idx     ON soldier_flags(unit_uic);
CREATE INDEX IF NOT EXISTS events_user_idx    ON events(user_id, date);
CREATE INDEX IF NOT EXISTS mtoe_uic_idx       ON mtoe(uic, fiscal_year);
CREATE INDEX IF NOT EXISTS aircraft_unit_idx  ON aircraft(current_unit);
CREATE INDEX IF NOT EXISTS mx_events_ser_idx  ON maintenance_events(serial);
CREATE INDEX IF NOT EXISTS flights_unit_idx   ON flights(unit_uic, start_at);
CREATE INDEX IF NOT EXISTS deliveries_idx     ON soldier_notifications(user_id);
CREATE INDEX IF NOT EXISTS notes_request_idx  ON notifications(request_id);
CREATE INDEX IF NOT EXISTS designations_idx   ON soldier_designations(user_id);

PRAGMA user_version = 1;
";
