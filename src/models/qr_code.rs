//! QR code models.
//!
//! A QR code row is a labelled entry point ("Lobby", "Room 204") to a form.
//! The printed code encodes a tracking URL so scans can be counted before the
//! guest is redirected to the public form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct QrCode {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub form_id: Uuid,
    pub label: String,
    pub scan_count: i64,
    pub created_at: DateTime<Utc>,
}

/// QR code as returned to clients, with the URLs it points at.
#[derive(Debug, Serialize)]
pub struct QrCodeResponse {
    #[serde(flatten)]
    pub qr_code: QrCode,
    pub tracking_url: String,
    pub form_url: String,
    pub image_url: String,
}

/// Request body for `POST /api/forms/{id}/qr-codes`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQrCodeRequest {
    #[validate(length(min = 1, max = 120, message = "Label must be 1-120 characters"))]
    pub label: String,
}

/// Query parameters for PNG rendering.
#[derive(Debug, Default, Deserialize)]
pub struct QrImageQuery {
    /// Minimum edge length in pixels
    pub size: Option<u32>,
}
