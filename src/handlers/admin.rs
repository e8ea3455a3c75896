//! Super-admin dashboard.

use crate::{
    error::AppError, models::stats::PlatformStats, services::stats_service, state::AppState,
};
use axum::{Json, extract::State};

/// `GET /api/admin/stats`
pub async fn platform_stats(State(state): State<AppState>) -> Result<Json<PlatformStats>, AppError> {
    let stats = stats_service::platform_stats(&state.pool).await?;
    Ok(Json(stats))
}
