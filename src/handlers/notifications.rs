//! Notification HTTP handlers.
//!
//! Hotel admins:
//! - GET /api/notifications - Own notifications (`unread_only`, pagination)
//! - GET /api/notifications/unread-count
//! - PATCH /api/notifications/{id}/read
//! - POST /api/notifications/read-all
//!
//! Super-admins:
//! - POST /api/admin/notifications - Send to one hotel or broadcast
//! - GET /api/admin/notifications - Every hotel's notifications (`hotel_id` filter)

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        notification::{
            MarkAllReadResponse, Notification, NotificationListQuery, SendNotificationRequest,
            SendNotificationResponse, UnreadCountResponse,
        },
        pagination::Paginated,
    },
    services::notification_service,
    state::AppState,
    validation::validate_request,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

/// Send a notification.
///
/// # Request Body
///
/// ```json
/// {
///   "hotel_id": "550e8400-e29b-41d4-a716-446655440000",
///   "kind": "warning",
///   "title": "Scheduled maintenance",
///   "message": "The dashboard will be unavailable on Sunday 02:00-03:00 UTC.",
///   "send_email": true
/// }
/// ```
///
/// Without `hotel_id` every active hotel receives it. The email template is
/// chosen by `kind`.
///
/// # Response
///
/// - **Success (201 Created)**: created rows and number of emails sent
/// - **Error (404)**: Unknown hotel
pub async fn send_notification(
    State(state): State<AppState>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<(StatusCode, Json<SendNotificationResponse>), AppError> {
    validate_request(&request)?;

    let response = notification_service::send_notification(
        &state.pool,
        &state.config,
        state.mailer.as_ref(),
        request,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_all_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<Paginated<Notification>>, AppError> {
    let notifications =
        notification_service::list_notifications(&state.pool, query.hotel_id, &query).await?;
    Ok(Json(notifications))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<Paginated<Notification>>, AppError> {
    let hotel_id = auth.hotel_id()?;

    let notifications =
        notification_service::list_notifications(&state.pool, Some(hotel_id), &query).await?;
    Ok(Json(notifications))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let unread = notification_service::unread_count(&state.pool, auth.hotel_id()?).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    let notification =
        notification_service::mark_read(&state.pool, auth.hotel_id()?, notification_id).await?;
    Ok(Json(notification))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let updated = notification_service::mark_all_read(&state.pool, auth.hotel_id()?).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
