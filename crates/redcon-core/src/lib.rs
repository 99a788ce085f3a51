//! Core types, reporting rules and the storage trait for redcon.
//!
//! Nothing in here touches HTTP or SQL. Report functions operate on rows the
//! caller has already fetched through [`store::ReadinessStore`], which keeps
//! the readiness arithmetic testable without a database.

// Native `async fn` in traits; the futures are declared `Send` explicitly.
#![allow(async_fn_in_trait)]

pub mod aircraft;
pub mod designation;
pub mod error;
pub mod evaluation;
pub mod event;
pub mod flag;
pub mod flight;
pub mod history;
pub mod mtoe;
pub mod notification;
pub mod period;
pub mod phase_team;
pub mod report;
pub mod request;
pub mod role;
pub mod soldier;
pub mod store;
pub mod task;
pub mod unit;

pub use error::{Error, Result};
