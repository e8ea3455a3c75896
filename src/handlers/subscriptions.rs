//! Subscription HTTP handlers.
//!
//! - GET /api/hotels/{id}/subscription - Current plan with effective status
//! - PUT /api/admin/hotels/{id}/subscription - Create or replace (super-admin)
//! - POST /api/admin/hotels/{id}/subscription/cancel - Cancel (super-admin)
//! - GET /api/admin/subscriptions - Overview of all hotels (super-admin)

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        pagination::Paginated,
        subscription::{
            SubscriptionListQuery, SubscriptionOverview, SubscriptionResponse,
            UpsertSubscriptionRequest,
        },
    },
    services::subscription_service,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

pub async fn get_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(hotel_id): Path<Uuid>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    auth.ensure_hotel_access(hotel_id)?;

    let subscription = subscription_service::get_subscription(&state.pool, hotel_id).await?;
    Ok(Json(subscription))
}

/// Set a hotel's plan, status and period.
///
/// # Request Body
///
/// ```json
/// {
///   "plan": "premium",
///   "status": "active",
///   "starts_at": "2025-01-01T00:00:00Z",
///   "ends_at": "2026-01-01T00:00:00Z"
/// }
/// ```
///
/// `starts_at` defaults to now; `ends_at` may be omitted for an open-ended
/// period but must otherwise be after `starts_at`. The hotel's admins are
/// emailed and a `subscription` notification is recorded.
pub async fn upsert_subscription(
    State(state): State<AppState>,
    Path(hotel_id): Path<Uuid>,
    Json(request): Json<UpsertSubscriptionRequest>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let subscription = subscription_service::upsert_subscription(
        &state.pool,
        &state.config,
        state.mailer.as_ref(),
        hotel_id,
        request,
    )
    .await?;

    Ok(Json(subscription))
}

pub async fn cancel_subscription(
    State(state): State<AppState>,
    Path(hotel_id): Path<Uuid>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let subscription = subscription_service::cancel_subscription(
        &state.pool,
        &state.config,
        state.mailer.as_ref(),
        hotel_id,
    )
    .await?;

    Ok(Json(subscription))
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    Query(query): Query<SubscriptionListQuery>,
) -> Result<Json<Paginated<SubscriptionOverview>>, AppError> {
    let subscriptions = subscription_service::list_subscriptions(&state.pool, &query).await?;
    Ok(Json(subscriptions))
}
