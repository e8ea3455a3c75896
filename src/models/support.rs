//! Support request models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "support_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SupportPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "support_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SupportStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl SupportStatus {
    pub fn label(self) -> &'static str {
        match self {
            SupportStatus::Open => "Open",
            SupportStatus::InProgress => "In progress",
            SupportStatus::Resolved => "Resolved",
            SupportStatus::Closed => "Closed",
        }
    }
}

/// Represents a support request record from the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SupportRequest {
    pub id: Uuid,
    pub hotel_id: Uuid,

    /// Hotel admin who opened the request
    pub user_id: Uuid,

    pub subject: String,
    pub message: String,
    pub priority: SupportPriority,
    pub status: SupportStatus,
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Support request with hotel and requester details for the admin queue.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SupportRequestView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: SupportRequest,
    pub hotel_name: String,
    pub requester_name: String,
    pub requester_email: String,
}

/// Request body for `POST /api/support`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupportRequest {
    #[validate(length(min = 1, max = 200, message = "Subject must be 1-200 characters"))]
    pub subject: String,

    #[validate(length(min = 1, max = 5000, message = "Message must be 1-5000 characters"))]
    pub message: String,

    #[serde(default)]
    pub priority: SupportPriority,
}

/// Request body for `PATCH /api/admin/support/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSupportRequest {
    pub status: Option<SupportStatus>,

    #[validate(length(min = 1, max = 5000, message = "Response must be 1-5000 characters"))]
    pub response: Option<String>,
}

/// Query parameters for listing support requests.
#[derive(Debug, Default, Deserialize)]
pub struct SupportListQuery {
    pub status: Option<SupportStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
