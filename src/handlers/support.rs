//! Support request HTTP handlers.
//!
//! - POST /api/support - Open a request (hotel admin)
//! - GET /api/support - Own hotel's requests
//! - GET /api/admin/support - Every request, `status` filter (super-admin)
//! - PATCH /api/admin/support/{id} - Set status and/or respond (super-admin)

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        pagination::Paginated,
        support::{
            CreateSupportRequest, SupportListQuery, SupportRequest, SupportRequestView,
            UpdateSupportRequest,
        },
    },
    services::support_service,
    state::AppState,
    validation::validate_request,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

/// Open a support request. The requester gets a confirmation email.
pub async fn create_support_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateSupportRequest>,
) -> Result<(StatusCode, Json<SupportRequest>), AppError> {
    let hotel_id = auth.hotel_id()?;
    validate_request(&request)?;

    let support_request = support_service::create_request(
        &state.pool,
        &state.config,
        state.mailer.as_ref(),
        hotel_id,
        auth.user_id,
        request,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(support_request)))
}

pub async fn list_own_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<SupportListQuery>,
) -> Result<Json<Paginated<SupportRequestView>>, AppError> {
    let requests =
        support_service::list_requests(&state.pool, Some(auth.hotel_id()?), &query).await?;
    Ok(Json(requests))
}

pub async fn list_all_requests(
    State(state): State<AppState>,
    Query(query): Query<SupportListQuery>,
) -> Result<Json<Paginated<SupportRequestView>>, AppError> {
    let requests = support_service::list_requests(&state.pool, None, &query).await?;
    Ok(Json(requests))
}

/// Update a request.
///
/// # Request Body
///
/// ```json
/// { "status": "resolved", "response": "The export is fixed, please try again." }
/// ```
///
/// A new or changed `response` is emailed to the requester.
pub async fn update_support_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(request): Json<UpdateSupportRequest>,
) -> Result<Json<SupportRequestView>, AppError> {
    validate_request(&request)?;

    let updated = support_service::update_request(
        &state.pool,
        &state.config,
        state.mailer.as_ref(),
        request_id,
        request,
    )
    .await?;

    Ok(Json(updated))
}
