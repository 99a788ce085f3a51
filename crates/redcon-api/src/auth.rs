//! Requesting-user extractor and unit permission checks.
//!
//! The proxy in front of the API authenticates the user and forwards the
//! certificate subject in `Auth-User` (`CN=LAST.FIRST.MI.<EDIPI>`). Service
//! callers acting for a user send the id directly in `X-On-Behalf-Of`.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use redcon_core::{
  role::{UserRole, can_manage_unit, can_view_unit},
  soldier::Soldier,
  store::ReadinessStore,
  unit::Unit,
};

use crate::error::ApiError;

pub const AUTH_USER: &str = "Auth-User";
pub const ON_BEHALF_OF: &str = "X-On-Behalf-Of";

/// The user id carried by the request headers, if any. `Auth-User` wins over
/// `X-On-Behalf-Of`.
pub fn user_id_from_headers(headers: &HeaderMap) -> Option<String> {
  let header = |name: &str| {
    headers
      .get(name)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|v| !v.is_empty())
  };

  if let Some(subject) = header(AUTH_USER) {
    let cn = subject
      .split(',')
      .find_map(|part| part.trim().strip_prefix("CN="))
      .unwrap_or(subject);
    return cn
      .rsplit('.')
      .next()
      .filter(|id| !id.is_empty())
      .map(str::to_owned);
  }
  header(ON_BEHALF_OF).map(str::to_owned)
}

/// The soldier making the request, with their role grants.
#[derive(Debug, Clone)]
pub struct Requester {
  pub soldier: Soldier,
  pub roles:   Vec<UserRole>,
}

impl Requester {
  pub fn user_id(&self) -> &str { &self.soldier.user_id }

  /// Fetch `uic` and check the requester may view it.
  pub async fn view_unit<S: ReadinessStore>(&self, store: &S, uic: &str) -> Result<Unit, ApiError> {
    let unit = fetch_unit(store, uic).await?;
    if !can_view_unit(&self.soldier, &self.roles, &unit) {
      return Err(ApiError::Unauthorized(
        "Requesting user does not have a user role for this unit.".into(),
      ));
    }
    Ok(unit)
  }

  /// Fetch `uic` and check the requester may edit records in it.
  pub async fn manage_unit<S: ReadinessStore>(&self, store: &S, uic: &str) -> Result<Unit, ApiError> {
    let unit = fetch_unit(store, uic).await?;
    if !can_manage_unit(&self.soldier, &self.roles, &unit) {
      return Err(ApiError::Forbidden(format!(
        "user {} does not manage unit {uic}",
        self.soldier.user_id
      )));
    }
    Ok(unit)
  }

  pub fn require_admin(&self) -> Result<(), ApiError> {
    if self.soldier.is_admin {
      Ok(())
    } else {
      Err(ApiError::Forbidden("admin access required".into()))
    }
  }
}

async fn fetch_unit<S: ReadinessStore>(store: &S, uic: &str) -> Result<Unit, ApiError> {
  store
    .get_unit(uic)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("unit {uic} not found")))
}

impl<S> FromRequestParts<Arc<S>> for Requester
where
  S: ReadinessStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, store: &Arc<S>) -> Result<Self, Self::Rejection> {
    let user_id = user_id_from_headers(&parts.headers)
      .ok_or_else(|| ApiError::BadRequest("No user ID in header.".into()))?;

    let soldier = store
      .get_soldier(&user_id)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::NotFound(format!("soldier {user_id} not found")))?;
    let roles = store.roles_for(&user_id).await.map_err(ApiError::store)?;

    Ok(Requester { soldier, roles })
  }
}
