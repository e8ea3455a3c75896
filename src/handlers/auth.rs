//! Authentication endpoints.
//!
//! - POST /api/auth/login - Exchange email + password for an access token
//! - GET /api/auth/me - Current user profile
//! - POST /api/auth/change-password - Change own password
//! - POST /api/auth/forgot-password - Email a reset link
//! - POST /api/auth/reset-password - Set a new password with the emailed token

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::user::{
        ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse,
        ResetPasswordRequest, UserResponse,
    },
    services::auth_service,
    state::AppState,
    validation::validate_request,
};
use axum::{Extension, Json, extract::State, http::StatusCode};

/// Log in.
///
/// # Endpoint
///
/// `POST /api/auth/login`
///
/// # Request Body
///
/// ```json
/// { "email": "admin@seaside.example", "password": "..." }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: access token, its lifetime and the user profile
/// - **Error (400)**: Malformed email
/// - **Error (401)**: Unknown email, wrong password or deactivated account
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_request(&request)?;

    let response =
        auth_service::login(&state.pool, &state.config, &request.email, &request.password).await?;

    Ok(Json(response))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserResponse>, AppError> {
    let user = auth_service::find_user_by_id(&state.pool, auth.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(user.into()))
}

/// Change the caller's password. Returns 204 on success.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    validate_request(&request)?;

    auth_service::change_password(
        &state.pool,
        auth.user_id,
        &request.current_password,
        &request.new_password,
    )
    .await?;

    tracing::info!(user_id = %auth.user_id, email = %auth.email, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// Request a password reset email.
///
/// Always answers 202 Accepted, whether or not an account exists. Malformed
/// emails cannot match an account and are not looked up.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<StatusCode, AppError> {
    if let Err(e) = validate_request(&request) {
        tracing::debug!(error = %e, "Ignoring password reset for malformed email");
        return Ok(StatusCode::ACCEPTED);
    }

    if let Err(e) = auth_service::request_password_reset(
        &state.pool,
        &state.config,
        state.mailer.as_ref(),
        &request.email,
    )
    .await
    {
        tracing::error!(error = %e, "Password reset request failed");
    }

    Ok(StatusCode::ACCEPTED)
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    validate_request(&request)?;

    auth_service::reset_password(&state.pool, &request.token, &request.new_password).await?;

    Ok(StatusCode::NO_CONTENT)
}
