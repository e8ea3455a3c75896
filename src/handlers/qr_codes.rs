//! QR code HTTP handlers.
//!
//! - POST /api/forms/{id}/qr-codes - Create a labelled QR code for a form
//! - GET /api/hotels/{id}/qr-codes?form_id= - List a hotel's QR codes
//! - GET /api/qr-codes/{id}/image - PNG encoding the tracking URL
//! - DELETE /api/qr-codes/{id}

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::qr_code::{CreateQrCodeRequest, QrCodeResponse, QrImageQuery},
    services::{form_service, qr_service},
    state::AppState,
    validation::validate_request,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct QrCodeListQuery {
    pub form_id: Option<Uuid>,
}

pub async fn create_qr_code(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(form_id): Path<Uuid>,
    Json(request): Json<CreateQrCodeRequest>,
) -> Result<(StatusCode, Json<QrCodeResponse>), AppError> {
    validate_request(&request)?;

    let form = form_service::find_form(&state.pool, form_id).await?;
    auth.ensure_hotel_access(form.hotel_id)?;

    let qr_code = qr_service::create_qr_code(&state.pool, form.hotel_id, form.id, &request.label).await?;
    Ok((StatusCode::CREATED, Json(qr_service::to_response(&state.config, qr_code))))
}

pub async fn list_qr_codes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(hotel_id): Path<Uuid>,
    Query(query): Query<QrCodeListQuery>,
) -> Result<Json<Vec<QrCodeResponse>>, AppError> {
    auth.ensure_hotel_access(hotel_id)?;

    let qr_codes = qr_service::list_qr_codes(&state.pool, hotel_id, query.form_id).await?;
    Ok(Json(
        qr_codes
            .into_iter()
            .map(|qr| qr_service::to_response(&state.config, qr))
            .collect(),
    ))
}

/// Printable PNG. Scanning it goes through `/q/{id}` so scans are counted.
///
/// # Query Parameters
///
/// - `size` - minimum edge in pixels, clamped to 100..=2000 (default 300)
pub async fn qr_code_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(qr_code_id): Path<Uuid>,
    Query(query): Query<QrImageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let qr_code = qr_service::get_qr_code(&state.pool, qr_code_id).await?;
    auth.ensure_hotel_access(qr_code.hotel_id)?;

    let png = qr_service::render_png(
        &state.config.qr_tracking_url(qr_code.id),
        query.size.unwrap_or(qr_service::DEFAULT_IMAGE_SIZE),
    )?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

pub async fn delete_qr_code(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(qr_code_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let qr_code = qr_service::get_qr_code(&state.pool, qr_code_id).await?;
    auth.ensure_hotel_access(qr_code.hotel_id)?;

    qr_service::delete_qr_code(&state.pool, qr_code.hotel_id, qr_code.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
