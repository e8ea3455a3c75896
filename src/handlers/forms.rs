//! Feedback form HTTP handlers.
//!
//! - GET/POST /api/hotels/{id}/forms - List or create forms of a hotel
//! - GET/PUT/DELETE /api/forms/{id} - Read, update, soft delete
//! - PATCH /api/forms/{id}/active - Open or close a form for guests
//! - GET /api/forms/{id}/qr - PNG QR code of the public form URL

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        form::{
            CreateFormRequest, FeedbackForm, FormSummary, FormWithQuestions, SetFormActiveRequest,
            UpdateFormRequest,
        },
        qr_code::QrImageQuery,
    },
    services::{form_service, hotel_service, qr_service},
    state::AppState,
    validation::validate_request,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use uuid::Uuid;

/// Load a form and check the caller may manage it.
async fn authorized_form(
    state: &AppState,
    auth: &AuthContext,
    form_id: Uuid,
) -> Result<FeedbackForm, AppError> {
    let form = form_service::find_form(&state.pool, form_id).await?;
    auth.ensure_hotel_access(form.hotel_id)?;
    Ok(form)
}

/// Create a form.
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Checkout survey",
///   "questions": [
///     { "text": "How was your stay?", "question_type": "rating", "required": true },
///     { "text": "What did you use?", "question_type": "multiple_choice",
///       "options": ["Pool", "Spa", "Gym"] }
///   ]
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: the form with its numbered questions
/// - **Error (400)**: Validation failed (see the message for the rule)
/// - **Error (403)**: Another hotel's forms
pub async fn create_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(hotel_id): Path<Uuid>,
    Json(request): Json<CreateFormRequest>,
) -> Result<(StatusCode, Json<FormWithQuestions>), AppError> {
    auth.ensure_hotel_access(hotel_id)?;
    validate_request(&request)?;
    hotel_service::find_hotel(&state.pool, hotel_id).await?;

    let form = form_service::create_form(&state.pool, hotel_id, request).await?;
    Ok((StatusCode::CREATED, Json(form)))
}

pub async fn list_forms(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(hotel_id): Path<Uuid>,
) -> Result<Json<Vec<FormSummary>>, AppError> {
    auth.ensure_hotel_access(hotel_id)?;

    let forms = form_service::list_forms(&state.pool, hotel_id).await?;
    Ok(Json(forms))
}

pub async fn get_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(form_id): Path<Uuid>,
) -> Result<Json<FormWithQuestions>, AppError> {
    authorized_form(&state, &auth, form_id).await?;

    let form = form_service::get_form_with_questions(&state.pool, form_id).await?;
    Ok(Json(form))
}

/// Update a form. A `questions` list replaces all existing questions.
pub async fn update_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(form_id): Path<Uuid>,
    Json(request): Json<UpdateFormRequest>,
) -> Result<Json<FormWithQuestions>, AppError> {
    validate_request(&request)?;
    authorized_form(&state, &auth, form_id).await?;

    let form = form_service::update_form(&state.pool, form_id, request).await?;
    Ok(Json(form))
}

pub async fn set_form_active(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(form_id): Path<Uuid>,
    Json(request): Json<SetFormActiveRequest>,
) -> Result<Json<FeedbackForm>, AppError> {
    authorized_form(&state, &auth, form_id).await?;

    let form = form_service::set_form_active(&state.pool, form_id, request.is_active).await?;
    Ok(Json(form))
}

pub async fn delete_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(form_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    authorized_form(&state, &auth, form_id).await?;

    form_service::delete_form(&state.pool, form_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PNG QR code pointing straight at the public form (no scan tracking).
pub async fn form_qr_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(form_id): Path<Uuid>,
    Query(query): Query<QrImageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let form = authorized_form(&state, &auth, form_id).await?;

    let png = qr_service::render_png(
        &state.config.public_form_url(form.id),
        query.size.unwrap_or(qr_service::DEFAULT_IMAGE_SIZE),
    )?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
