//! QR code service - PNG rendering and QR code entry points.

use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::QrCode as QrMatrix;
use uuid::Uuid;

use crate::{
    config::Config,
    db::DbPool,
    error::AppError,
    models::qr_code::{QrCode, QrCodeResponse},
    services::form_service,
};

pub const DEFAULT_IMAGE_SIZE: u32 = 300;
const MIN_IMAGE_SIZE: u32 = 100;
const MAX_IMAGE_SIZE: u32 = 2000;

/// Render `data` as a PNG QR code at least `size` pixels wide.
pub fn render_png(data: &str, size: u32) -> Result<Vec<u8>, AppError> {
    let size = size.clamp(MIN_IMAGE_SIZE, MAX_IMAGE_SIZE);

    let matrix = QrMatrix::new(data.as_bytes())
        .map_err(|e| AppError::InvalidRequest(format!("Cannot encode QR code: {e}")))?;

    let image = matrix
        .render::<Luma<u8>>()
        .min_dimensions(size, size)
        .quiet_zone(true)
        .build();

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(png.into_inner())
}

pub fn to_response(config: &Config, qr_code: QrCode) -> QrCodeResponse {
    QrCodeResponse {
        tracking_url: config.qr_tracking_url(qr_code.id),
        form_url: config.public_form_url(qr_code.form_id),
        image_url: format!("{}/api/qr-codes/{}/image", config.base_url(), qr_code.id),
        qr_code,
    }
}

/// Create a labelled QR code for a form of `hotel_id`.
pub async fn create_qr_code(
    pool: &DbPool,
    hotel_id: Uuid,
    form_id: Uuid,
    label: &str,
) -> Result<QrCode, AppError> {
    // Form must exist, belong to the hotel and not be deleted
    form_service::get_form(pool, form_id, hotel_id).await?;

    let qr_code = sqlx::query_as::<_, QrCode>(
        r#"
        INSERT INTO qr_codes (hotel_id, form_id, label)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(hotel_id)
    .bind(form_id)
    .bind(label.trim())
    .fetch_one(pool)
    .await?;

    tracing::info!(qr_code_id = %qr_code.id, %form_id, "QR code created");
    Ok(qr_code)
}

/// List QR codes of a hotel, optionally for one form.
pub async fn list_qr_codes(
    pool: &DbPool,
    hotel_id: Uuid,
    form_id: Option<Uuid>,
) -> Result<Vec<QrCode>, AppError> {
    let qr_codes = sqlx::query_as::<_, QrCode>(
        r#"
        SELECT q.*
        FROM qr_codes q
        JOIN feedback_forms f ON f.id = q.form_id
        WHERE q.hotel_id = $1
          AND f.deleted_at IS NULL
          AND ($2::uuid IS NULL OR q.form_id = $2)
        ORDER BY q.created_at DESC
        "#,
    )
    .bind(hotel_id)
    .bind(form_id)
    .fetch_all(pool)
    .await?;

    Ok(qr_codes)
}

pub async fn get_qr_code(pool: &DbPool, qr_code_id: Uuid) -> Result<QrCode, AppError> {
    sqlx::query_as::<_, QrCode>("SELECT * FROM qr_codes WHERE id = $1")
        .bind(qr_code_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("QR code"))
}

pub async fn delete_qr_code(pool: &DbPool, hotel_id: Uuid, qr_code_id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM qr_codes WHERE id = $1 AND hotel_id = $2")
        .bind(qr_code_id)
        .bind(hotel_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("QR code"));
    }

    Ok(())
}

/// Count a scan and return the form the code points at.
pub async fn record_scan(pool: &DbPool, qr_code_id: Uuid) -> Result<Uuid, AppError> {
    let form_id: Option<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE qr_codes
        SET scan_count = scan_count + 1
        WHERE id = $1
        RETURNING form_id
        "#,
    )
    .bind(qr_code_id)
    .fetch_optional(pool)
    .await?;

    form_id.ok_or(AppError::NotFound("QR code"))
}
