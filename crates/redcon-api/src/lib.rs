//! JSON REST API for redcon.
//!
//! Exposes an axum [`Router`] backed by any [`redcon_core::store::ReadinessStore`].
//! TLS and certificate authentication happen in front of the API; handlers
//! only read the forwarded user id (see [`auth`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", redcon_api::api_router(store.clone()))
//! ```

pub mod aircraft;
pub mod auth;
pub mod designations;
pub mod error;
pub mod events;
pub mod fleet;
pub mod flags;
pub mod mos;
pub mod mtoe;
pub mod notifications;
pub mod params;
pub mod phase_teams;
pub mod readiness;
pub mod requests;
pub mod roles;
pub mod soldiers;
pub mod tasks;
pub mod unit_health;
pub mod units;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use redcon_core::store::ReadinessStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ReadinessStore + 'static,
{
  Router::new()
    // Units
    .route("/units", get(units::list::<S>).post(units::upsert::<S>))
    .route("/units/{uic}", get(units::get_one::<S>))
    // Soldiers
    .route("/soldiers", get(soldiers::list::<S>).post(soldiers::upsert::<S>))
    .route("/soldiers/{user_id}", get(soldiers::get_one::<S>))
    .route("/soldiers/{user_id}/history", get(soldiers::history::<S>))
    // Roles
    .route("/roles", get(roles::mine).post(roles::grant::<S>))
    .route("/roles/{user_id}/{uic}", delete(roles::revoke::<S>))
    // Notifications
    .route("/notifications", get(notifications::mine::<S>))
    .route("/notifications/{id}/read", put(notifications::mark_read::<S>))
    .route("/notifications/broadcast", post(notifications::broadcast::<S>))
    // Requests
    .route("/requests/counts", get(requests::counts::<S>))
    .route(
      "/requests/permission",
      get(requests::list_permission::<S>).post(requests::request_permission::<S>),
    )
    .route("/requests/permission/adjudicate", post(requests::adjudicate_permission::<S>))
    .route(
      "/requests/transfer",
      get(requests::list_transfers::<S>).post(requests::request_transfer::<S>),
    )
    .route("/requests/transfer/adjudicate", post(requests::adjudicate_transfers::<S>))
    // Designations
    .route("/designations", post(designations::create::<S>))
    .route("/designations/{id}", delete(designations::remove::<S>))
    .route("/designations/types", get(designations::types::<S>).post(designations::upsert_type::<S>))
    .route("/designations/soldier/{user_id}", get(designations::for_soldier::<S>))
    // Flags
    .route("/flags", post(flags::create::<S>))
    .route("/flags/{id}", put(flags::update::<S>).delete(flags::remove::<S>))
    .route("/flags/soldier/{user_id}", get(flags::for_soldier::<S>))
    .route("/flags/unit/{uic}", get(flags::for_unit::<S>))
    // Events
    .route("/events", get(events::list::<S>).post(events::create::<S>))
    .route("/events/{id}", get(events::get_one::<S>).delete(events::remove::<S>))
    // Reference data
    .route("/mos", get(mos::list::<S>).post(mos::upsert::<S>))
    .route("/mtoe", post(mtoe::add::<S>))
    .route("/mtoe/{uic}", get(mtoe::list::<S>))
    // Unit health
    .route("/unit_health/{uic}/summary", get(unit_health::summary::<S>))
    .route("/unit_health/{uic}/availability", get(unit_health::availability::<S>))
    .route("/unit_health/{uic}/roster", get(unit_health::roster::<S>))
    .route("/unit_health/{uic}/missing_packets", get(unit_health::missing_packets::<S>))
    .route("/unit_health/{uic}/availability_details", get(unit_health::availability_details::<S>))
    .route("/unit_health/{uic}/evaluation_details", get(unit_health::evaluation_details::<S>))
    // Personnel readiness
    .route("/readiness/{uic}/unavailable", get(readiness::unavailable::<S>))
    .route("/readiness/{uic}/inexperienced", get(readiness::inexperienced::<S>))
    .route("/readiness/{uic}/strength_by_mos", get(readiness::strength_by_mos::<S>))
    .route("/readiness/{uic}/strength_by_skill", get(readiness::strength_by_skill::<S>))
    .route("/readiness/{uic}/experience_by_mos", get(readiness::experience_by_mos::<S>))
    .route("/readiness/{uic}/actual_vs_authorized", get(readiness::actual_vs_authorized::<S>))
    .route("/readiness/{uic}/phase_maintainers", get(readiness::phase_maintainers::<S>))
    // Aircraft records
    .route("/aircraft", post(aircraft::upsert::<S>))
    .route("/aircraft/{serial}", get(aircraft::get_one::<S>))
    .route("/aircraft/{serial}/maintenance_events", post(aircraft::add_maintenance_event::<S>))
    .route("/da_1352", post(aircraft::record_1352::<S>))
    .route("/projections", post(aircraft::upsert_projection::<S>))
    .route("/flights", post(aircraft::record_flight::<S>))
    .route(
      "/phase_teams/{phase_id}",
      get(phase_teams::get_one::<S>).put(phase_teams::put::<S>).delete(phase_teams::remove::<S>),
    )
    // Task lists
    .route("/tasks", post(tasks::upsert_task::<S>))
    .route("/tasks/ictl", get(tasks::list_ictl::<S>).post(tasks::create_ictl::<S>))
    .route("/tasks/ictl/{id}", get(tasks::get_ictl::<S>))
    .route("/tasks/uctl/{uic}", get(tasks::list_uctl::<S>))
    .route("/tasks/soldier/{user_id}", get(tasks::for_soldier::<S>))
    // Fleet readiness
    .route("/fleet/{uic}/aircraft", get(fleet::aircraft::<S>))
    .route("/fleet/{uic}/bank_percentage", get(fleet::bank_percentage::<S>))
    .route("/fleet/{uic}/phase_flow", get(fleet::phase_flow::<S>))
    .route("/fleet/{uic}/forecast", get(fleet::forecast::<S>))
    .route("/fleet/{uic}/da_1352", get(fleet::da_1352::<S>))
    .route("/fleet/{uic}/status_over_time", get(fleet::status_over_time::<S>))
    .route("/fleet/{uic}/flights", get(fleet::flights::<S>))
    .route("/fleet/{uic}/flight_hours", get(fleet::flight_hours::<S>))
    .with_state(store)
}
