use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{NotificationId, UserId};

/// What a notification is about. Closed set; the inbox UI keys off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PetitionApproved,
    PetitionRejected,
}

/// Notification row - write-only from the petition workflow's perspective.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Values for a notification about to be raised.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub metadata: serde_json::Value,
}

impl Notification {
    /// Insert a new unread notification.
    pub async fn insert(new: &NewNotification, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO notifications (id, recipient_id, kind, title, message, read, metadata)
             VALUES ($1, $2, $3, $4, $5, false, $6)
             RETURNING *",
        )
        .bind(NotificationId::new())
        .bind(new.recipient_id)
        .bind(new.kind)
        .bind(&new.title)
        .bind(&new.message)
        .bind(&new.metadata)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}
