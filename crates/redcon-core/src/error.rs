//! Error types for `redcon-core`.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unit not found: {0}")]
  UnitNotFound(String),

  #[error("soldier not found: {0}")]
  SoldierNotFound(String),

  #[error("flag not found: {0}")]
  FlagNotFound(Uuid),

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  #[error("aircraft not found: {0}")]
  AircraftNotFound(String),

  #[error("notification not found: {0}")]
  NotificationNotFound(Uuid),

  #[error("request not found: {0}")]
  RequestNotFound(Uuid),

  #[error("designation not found: {0}")]
  DesignationNotFound(String),

  #[error("phase team not found: {0}")]
  PhaseTeamNotFound(Uuid),

  #[error("task list not found: {0}")]
  IctlNotFound(Uuid),

  #[error("a pending request already exists: {0}")]
  DuplicateRequest(String),

  #[error("invalid designation: {0}")]
  InvalidDesignation(String),

  #[error("invalid phase team: {0}")]
  InvalidPhaseTeam(String),

  #[error("unit hierarchy contains a cycle through {0}")]
  HierarchyCycle(String),

  #[error("invalid flag: {0}")]
  InvalidFlag(String),

  #[error("invalid date range: {start} is after {end}")]
  InvalidDateRange { start: NaiveDate, end: NaiveDate },

  #[error("unknown {kind} code: {value:?}")]
  UnknownCode { kind: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Build an [`Error::UnknownCode`] from a failed `strum` parse.
  pub fn unknown_code(kind: &'static str, value: impl Into<String>) -> Self {
    Self::UnknownCode { kind, value: value.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reject a `[start, end]` range whose bounds are inverted.
pub fn check_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
  if start > end {
    return Err(Error::InvalidDateRange { start, end });
  }
  Ok(())
}
