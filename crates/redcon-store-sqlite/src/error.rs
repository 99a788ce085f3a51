//! Error type for `redcon-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] redcon_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl Error {
  /// Whether the error reports a missing row rather than a storage failure.
  pub fn is_not_found(&self) -> bool {
    use redcon_core::Error as Core;
    matches!(
      self,
      Self::Core(
        Core::UnitNotFound(_)
          | Core::SoldierNotFound(_)
          | Core::FlagNotFound(_)
          | Core::EventNotFound(_)
          | Core::AircraftNotFound(_)
          | Core::NotificationNotFound(_)
          | Core::RequestNotFound(_)
          | Core::DesignationNotFound(_)
          | Core::PhaseTeamNotFound(_)
          | Core::IctlNotFound(_)
      )
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
