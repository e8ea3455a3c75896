//! Review inbox HTTP handlers.
//!
//! - GET /api/hotels/{id}/reviews - Filtered, paginated list
//! - GET /api/hotels/{id}/stats - Dashboard numbers
//! - GET /api/reviews/{id} - Review with answers
//! - PATCH /api/reviews/{id}/status - Mark new/read/archived
//! - DELETE /api/reviews/{id}

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        pagination::Paginated,
        review::{Review, ReviewDetail, ReviewListQuery, UpdateReviewStatusRequest},
        stats::HotelStats,
    },
    services::review_service,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

/// List reviews of a hotel, newest first.
///
/// # Query Parameters
///
/// - `status` - `new`, `read` or `archived`
/// - `form_id` - only reviews of this form
/// - `min_rating`, `max_rating` - inclusive rating bounds
/// - `from`, `to` - RFC 3339 timestamps bounding `created_at`
/// - `page`, `limit` - pagination
pub async fn list_reviews(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(hotel_id): Path<Uuid>,
    Query(query): Query<ReviewListQuery>,
) -> Result<Json<Paginated<Review>>, AppError> {
    auth.ensure_hotel_access(hotel_id)?;

    let reviews = review_service::list_reviews(&state.pool, hotel_id, &query).await?;
    Ok(Json(reviews))
}

pub async fn get_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(review_id): Path<Uuid>,
) -> Result<Json<ReviewDetail>, AppError> {
    let review = review_service::find_review(&state.pool, review_id).await?;
    auth.ensure_hotel_access(review.hotel_id)?;

    let detail = review_service::get_review_detail(&state.pool, review).await?;
    Ok(Json(detail))
}

pub async fn update_review_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(review_id): Path<Uuid>,
    Json(request): Json<UpdateReviewStatusRequest>,
) -> Result<Json<Review>, AppError> {
    let review = review_service::find_review(&state.pool, review_id).await?;
    auth.ensure_hotel_access(review.hotel_id)?;

    let review = review_service::set_review_status(&state.pool, review.id, request.status).await?;
    Ok(Json(review))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(review_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let review = review_service::find_review(&state.pool, review_id).await?;
    auth.ensure_hotel_access(review.hotel_id)?;

    review_service::delete_review(&state.pool, review.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn hotel_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(hotel_id): Path<Uuid>,
) -> Result<Json<HotelStats>, AppError> {
    auth.ensure_hotel_access(hotel_id)?;

    let stats = review_service::hotel_stats(&state.pool, hotel_id).await?;
    Ok(Json(stats))
}
