//! In-app notification models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Warning,
    Subscription,
    Review,
    System,
}

/// Represents a notification record from the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,

    /// Whether at least one admin of the hotel was emailed
    pub emailed: bool,

    pub created_at: DateTime<Utc>,
}

/// Values for a notification row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub hotel_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// Request body for `POST /api/admin/notifications`.
///
/// Without `hotel_id` the notification is broadcast to every active hotel.
#[derive(Debug, Deserialize, Validate)]
pub struct SendNotificationRequest {
    pub hotel_id: Option<Uuid>,

    pub kind: NotificationKind,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Message must be 1-5000 characters"))]
    pub message: String,

    #[serde(default = "default_send_email")]
    pub send_email: bool,
}

fn default_send_email() -> bool {
    true
}

/// Response for a send: how many hotels got the notification and how many
/// emails went out.
#[derive(Debug, Serialize)]
pub struct SendNotificationResponse {
    pub notifications_created: usize,
    pub emails_sent: usize,
    pub notifications: Vec<Notification>,
}

/// Query parameters for listing notifications.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationListQuery {
    pub unread_only: Option<bool>,
    pub hotel_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}
