//! Handlers for `/notifications` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/notifications` | The requester's notifications, newest first |
//! | `PUT`  | `/notifications/{id}/read` | 204, or 404 if never delivered to the requester |
//! | `POST` | `/notifications/broadcast` | Admin only. Body: [`Broadcast`]; returns 201 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use redcon_core::{
  notification::{Broadcast, Notice, Notification, SoldierNotification},
  store::{ReadinessStore, SoldierQuery},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{auth::Requester, error::ApiError};

#[derive(Debug, Serialize)]
pub struct NotificationOut {
  #[serde(flatten)]
  pub delivery: SoldierNotification,
  pub title:    String,
  pub body:     String,
}

impl From<SoldierNotification> for NotificationOut {
  fn from(delivery: SoldierNotification) -> Self {
    NotificationOut {
      title: delivery.notification.short_display(),
      body: delivery.notification.verbose_display(),
      delivery,
    }
  }
}

/// `GET /notifications`
pub async fn mine<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
) -> Result<Json<Vec<NotificationOut>>, ApiError>
where
  S: ReadinessStore + 'static,
{
  let delivered = store
    .notifications_for(requester.user_id())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(delivered.into_iter().map(NotificationOut::from).collect()))
}

/// `PUT /notifications/{id}/read`
pub async fn mark_read<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ReadinessStore + 'static,
{
  let delivered = store
    .notifications_for(requester.user_id())
    .await
    .map_err(ApiError::store)?;
  if !delivered.iter().any(|d| d.notification.notification_id == id) {
    return Err(ApiError::NotFound(format!("notification {id} not found")));
  }
  store
    .mark_notification_read(requester.user_id(), id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct Broadcasted {
  pub notification: Notification,
  pub recipients:   usize,
}

/// `POST /notifications/broadcast`
pub async fn broadcast<S>(
  State(store): State<Arc<S>>,
  requester: Requester,
  Json(body): Json<Broadcast>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReadinessStore + 'static,
{
  requester.require_admin()?;
  if !body.is_broadcastable() {
    return Err(ApiError::Unprocessable(
      "only release, announcement and bugfix notifications can be broadcast".into(),
    ));
  }

  let soldiers = store
    .list_soldiers(&SoldierQuery::default())
    .await
    .map_err(ApiError::store)?;
  let roles = store.list_roles().await.map_err(ApiError::store)?;
  let recipients = body.audience.recipients(&soldiers, &roles);
  let count = recipients.len();

  let notice = Notice::to(Notification::new(body.content, Utc::now()), recipients);
  let notification = store.deliver(notice).await.map_err(ApiError::store)?;
  tracing::info!(audience = ?body.audience, recipients = count, "broadcast notification");
  Ok((StatusCode::CREATED, Json(Broadcasted { notification, recipients: count })))
}
