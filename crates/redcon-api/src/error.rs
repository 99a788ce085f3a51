//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    tracing::error!(error = %e, "store error");
    ApiError::Store(Box::new(e))
  }
}

impl From<redcon_core::Error> for ApiError {
  fn from(e: redcon_core::Error) -> Self {
    use redcon_core::Error as Core;
    match e {
      Core::UnitNotFound(_)
      | Core::SoldierNotFound(_)
      | Core::FlagNotFound(_)
      | Core::EventNotFound(_)
      | Core::AircraftNotFound(_)
      | Core::NotificationNotFound(_)
      | Core::RequestNotFound(_)
      | Core::DesignationNotFound(_)
      | Core::PhaseTeamNotFound(_)
      | Core::IctlNotFound(_) => ApiError::NotFound(e.to_string()),
      Core::HierarchyCycle(_)
      | Core::InvalidFlag(_)
      | Core::InvalidDateRange { .. }
      | Core::DuplicateRequest(_)
      | Core::InvalidDesignation(_)
      | Core::InvalidPhaseTeam(_) => ApiError::Unprocessable(e.to_string()),
      Core::UnknownCode { .. } => ApiError::BadRequest(e.to_string()),
      Core::Serialization(_) => ApiError::store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
