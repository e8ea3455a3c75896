//! Hotel management HTTP handlers.
//!
//! Super-admin endpoints (behind the super-admin layer):
//! - POST /api/admin/hotels - Onboard a hotel with its first admin
//! - GET /api/admin/hotels - Search and page through hotels
//! - PATCH /api/admin/hotels/{id}/status - Activate or suspend
//! - DELETE /api/admin/hotels/{id} - Soft delete
//! - GET/POST /api/admin/hotels/{id}/users - Hotel admins
//! - PATCH /api/admin/users/{id}/status - Activate or deactivate an admin
//!
//! Hotel-scoped endpoints (own hotel, or any hotel for super-admins):
//! - GET/PUT /api/hotels/{id}

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        hotel::{
            CreateHotelRequest, CreateHotelResponse, Hotel, HotelListQuery, UpdateHotelRequest,
            UpdateHotelStatusRequest,
        },
        pagination::Paginated,
        user::{CreateHotelAdminRequest, UpdateUserStatusRequest, UserResponse},
    },
    services::hotel_service,
    state::AppState,
    validation::validate_request,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

/// Onboard a new hotel.
///
/// # Endpoint
///
/// `POST /api/admin/hotels`
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Seaside Inn",
///   "email": "front-desk@seaside.example",
///   "city": "Lisbon",
///   "default_language": "en",
///   "admin_name": "Maria Costa",
///   "admin_email": "maria@seaside.example"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: hotel, admin profile and trial subscription.
///   The admin receives a welcome email with a temporary password.
/// - **Error (400)**: Validation failed
/// - **Error (409)**: Admin email already registered
pub async fn create_hotel(
    State(state): State<AppState>,
    Json(request): Json<CreateHotelRequest>,
) -> Result<(StatusCode, Json<CreateHotelResponse>), AppError> {
    validate_request(&request)?;

    let response =
        hotel_service::create_hotel(&state.pool, &state.config, state.mailer.as_ref(), request)
            .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// List hotels.
///
/// # Query Parameters
///
/// - `search` - matches name, city or email (case-insensitive)
/// - `status` - `active`, `suspended` or `deleted`
/// - `page`, `limit` - pagination (defaults 1 and 20)
pub async fn list_hotels(
    State(state): State<AppState>,
    Query(query): Query<HotelListQuery>,
) -> Result<Json<Paginated<Hotel>>, AppError> {
    let hotels = hotel_service::list_hotels(&state.pool, query).await?;
    Ok(Json(hotels))
}

pub async fn get_hotel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(hotel_id): Path<Uuid>,
) -> Result<Json<Hotel>, AppError> {
    auth.ensure_hotel_access(hotel_id)?;

    let hotel = hotel_service::find_hotel(&state.pool, hotel_id).await?;
    Ok(Json(hotel))
}

/// Update the hotel profile. Absent fields are left unchanged.
pub async fn update_hotel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(hotel_id): Path<Uuid>,
    Json(request): Json<UpdateHotelRequest>,
) -> Result<Json<Hotel>, AppError> {
    auth.ensure_hotel_access(hotel_id)?;
    validate_request(&request)?;

    let hotel = hotel_service::update_hotel(&state.pool, hotel_id, request).await?;
    Ok(Json(hotel))
}

pub async fn update_hotel_status(
    State(state): State<AppState>,
    Path(hotel_id): Path<Uuid>,
    Json(request): Json<UpdateHotelStatusRequest>,
) -> Result<Json<Hotel>, AppError> {
    let hotel = hotel_service::set_hotel_status(&state.pool, hotel_id, request.status).await?;
    Ok(Json(hotel))
}

/// Soft delete a hotel. Its admins can no longer log in.
pub async fn delete_hotel(
    State(state): State<AppState>,
    Path(hotel_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    hotel_service::delete_hotel(&state.pool, hotel_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_hotel_admins(
    State(state): State<AppState>,
    Path(hotel_id): Path<Uuid>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    hotel_service::find_hotel(&state.pool, hotel_id).await?;

    let admins = hotel_service::list_hotel_admins(&state.pool, hotel_id).await?;
    Ok(Json(admins))
}

/// Add another admin to a hotel; they get a welcome email with a temporary
/// password.
pub async fn add_hotel_admin(
    State(state): State<AppState>,
    Path(hotel_id): Path<Uuid>,
    Json(request): Json<CreateHotelAdminRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    validate_request(&request)?;

    let admin = hotel_service::add_hotel_admin(
        &state.pool,
        &state.config,
        state.mailer.as_ref(),
        hotel_id,
        &request.name,
        &request.email,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(admin)))
}

pub async fn update_user_status(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserStatusRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = hotel_service::set_user_active(&state.pool, user_id, request.is_active).await?;
    Ok(Json(user))
}
