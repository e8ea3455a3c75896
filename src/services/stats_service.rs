//! Platform-wide counters for the super-admin dashboard.

use chrono::{Duration, Utc};

use crate::{db::DbPool, error::AppError, models::stats::PlatformStats};

/// Subscriptions count as lapsed when cancelled, expired, past due, or
/// active/trialing with a period that already ended. Deleted hotels and
/// their subscriptions are left out.
pub async fn platform_stats(pool: &DbPool) -> Result<PlatformStats, AppError> {
    let now = Utc::now();

    let stats = sqlx::query_as::<_, PlatformStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM hotels WHERE status <> 'deleted') AS total_hotels,
            (SELECT COUNT(*) FROM hotels WHERE status = 'active') AS active_hotels,
            (SELECT COUNT(*) FROM hotels WHERE status = 'suspended') AS suspended_hotels,
            (SELECT COUNT(*) FROM subscriptions s JOIN hotels h ON h.id = s.hotel_id
                WHERE h.status <> 'deleted'
                  AND s.status = 'active' AND (s.ends_at IS NULL OR s.ends_at > $1)) AS active_subscriptions,
            (SELECT COUNT(*) FROM subscriptions s JOIN hotels h ON h.id = s.hotel_id
                WHERE h.status <> 'deleted'
                  AND s.status = 'trialing' AND (s.ends_at IS NULL OR s.ends_at > $1)) AS trialing_subscriptions,
            (SELECT COUNT(*) FROM subscriptions s JOIN hotels h ON h.id = s.hotel_id
                WHERE h.status <> 'deleted'
                  AND (s.status IN ('past_due', 'cancelled', 'expired')
                       OR (s.status IN ('active', 'trialing') AND s.ends_at <= $1))) AS lapsed_subscriptions,
            (SELECT COUNT(*) FROM reviews) AS total_reviews,
            (SELECT COUNT(*) FROM reviews WHERE created_at >= $2) AS reviews_last_30_days,
            (SELECT COUNT(*) FROM support_requests
                WHERE status IN ('open', 'in_progress')) AS open_support_requests
        "#,
    )
    .bind(now)
    .bind(now - Duration::days(30))
    .fetch_one(pool)
    .await?;

    Ok(stats)
}
