//! Guest-facing endpoints. No authentication.
//!
//! - GET /api/public/forms/{id}?lang=xx - Form in the guest's language
//! - POST /api/public/forms/{id}/reviews - Submit feedback
//! - GET /q/{id} - Count a QR scan and redirect to the form

use crate::{
    error::AppError,
    models::{
        form::{PublicForm, PublicFormQuery},
        review::{Review, SubmitReviewRequest},
    },
    services::{form_service, qr_service, review_service},
    state::AppState,
    validation::{validate_language, validate_request},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
};
use uuid::Uuid;

/// Public form.
///
/// Returns 404 unless the form is active, its hotel is active and the
/// hotel's subscription is usable. With `lang` different from the hotel's
/// default language the texts are machine-translated; anything the
/// translator cannot handle is served in the original language.
pub async fn get_public_form(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
    Query(query): Query<PublicFormQuery>,
) -> Result<Json<PublicForm>, AppError> {
    if let Some(lang) = query.lang.as_deref() {
        validate_language(lang)?;
    }

    let answerable = form_service::load_answerable_form(&state.pool, form_id).await?;
    let form = form_service::public_form(answerable, query.lang.as_deref(), &state.translator).await;

    Ok(Json(form))
}

/// Submit a review.
///
/// # Request Body
///
/// ```json
/// {
///   "guest_name": "Alex",
///   "room_number": "204",
///   "qr_code_id": "550e8400-e29b-41d4-a716-446655440000",
///   "answers": [
///     { "question_id": "...", "value": 5 },
///     { "question_id": "...", "value": ["Pool", "Spa"] }
///   ]
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: the stored review with its computed rating
/// - **Error (400)**: An answer breaks the form's rules
/// - **Error (404)**: Form not available
pub async fn submit_review(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
    Json(request): Json<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    validate_request(&request)?;

    let review = review_service::submit_review(
        &state.pool,
        &state.config,
        state.mailer.as_ref(),
        form_id,
        request,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// QR scan landing: counts the scan and sends the guest to the form.
pub async fn scan_qr_code(
    State(state): State<AppState>,
    Path(qr_code_id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    let form_id = qr_service::record_scan(&state.pool, qr_code_id).await?;

    tracing::debug!(%qr_code_id, %form_id, "QR code scanned");

    Ok(Redirect::to(&format!(
        "{}?qr={}",
        state.config.public_form_url(form_id),
        qr_code_id
    )))
}
