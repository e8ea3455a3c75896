//! Subscription service - plan changes and the admin overview.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    config::Config,
    db::DbPool,
    error::AppError,
    models::{
        notification::{NewNotification, NotificationKind},
        pagination::{PageParams, Paginated},
        subscription::{
            Subscription, SubscriptionListQuery, SubscriptionOverview, SubscriptionResponse,
            SubscriptionStatus, SubscriptionWithHotel, UpsertSubscriptionRequest,
        },
    },
    services::{
        hotel_service,
        mail::{self, Mailer},
        notification_service,
    },
};

pub async fn find_subscription(pool: &DbPool, hotel_id: Uuid) -> Result<Option<Subscription>, AppError> {
    let subscription =
        sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE hotel_id = $1")
            .bind(hotel_id)
            .fetch_optional(pool)
            .await?;

    Ok(subscription)
}

/// Current subscription of a hotel with its effective status.
pub async fn get_subscription(pool: &DbPool, hotel_id: Uuid) -> Result<SubscriptionResponse, AppError> {
    hotel_service::find_hotel(pool, hotel_id).await?;

    find_subscription(pool, hotel_id)
        .await?
        .map(Into::into)
        .ok_or(AppError::NotFound("Subscription"))
}

fn check_period(starts_at: DateTime<Utc>, ends_at: Option<DateTime<Utc>>) -> Result<(), AppError> {
    match ends_at {
        Some(end) if end <= starts_at => Err(AppError::InvalidRequest(
            "Subscription must end after it starts".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Create or replace the subscription of a hotel, then tell its admins.
pub async fn upsert_subscription(
    pool: &DbPool,
    config: &Config,
    mailer: &dyn Mailer,
    hotel_id: Uuid,
    request: UpsertSubscriptionRequest,
) -> Result<SubscriptionResponse, AppError> {
    let hotel = hotel_service::find_hotel(pool, hotel_id).await?;

    let starts_at = request.starts_at.unwrap_or_else(Utc::now);
    check_period(starts_at, request.ends_at)?;

    let subscription = sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions (hotel_id, plan, status, starts_at, ends_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (hotel_id) DO UPDATE
        SET plan = EXCLUDED.plan,
            status = EXCLUDED.status,
            starts_at = EXCLUDED.starts_at,
            ends_at = EXCLUDED.ends_at,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(hotel.id)
    .bind(request.plan)
    .bind(request.status)
    .bind(starts_at)
    .bind(request.ends_at)
    .fetch_one(pool)
    .await?;

    tracing::info!(
        %hotel_id,
        plan = ?subscription.plan,
        status = ?subscription.status,
        "Subscription updated"
    );

    if let Err(e) = announce_change(pool, config, mailer, &hotel.name, &subscription).await {
        tracing::error!(%hotel_id, error = %e, "Failed to announce subscription change");
    }
    Ok(subscription.into())
}

/// Cancel a hotel's subscription. The period end is kept for the record.
pub async fn cancel_subscription(
    pool: &DbPool,
    config: &Config,
    mailer: &dyn Mailer,
    hotel_id: Uuid,
) -> Result<SubscriptionResponse, AppError> {
    let hotel = hotel_service::find_hotel(pool, hotel_id).await?;

    let subscription = sqlx::query_as::<_, Subscription>(
        r#"
        UPDATE subscriptions SET status = $2, updated_at = NOW()
        WHERE hotel_id = $1
        RETURNING *
        "#,
    )
    .bind(hotel.id)
    .bind(SubscriptionStatus::Cancelled)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Subscription"))?;

    tracing::info!(%hotel_id, "Subscription cancelled");

    if let Err(e) = announce_change(pool, config, mailer, &hotel.name, &subscription).await {
        tracing::error!(%hotel_id, error = %e, "Failed to announce subscription change");
    }
    Ok(subscription.into())
}

/// Email the hotel admins and leave a subscription notification.
async fn announce_change(
    pool: &DbPool,
    config: &Config,
    mailer: &dyn Mailer,
    hotel_name: &str,
    subscription: &Subscription,
) -> Result<(), AppError> {
    let status = subscription.effective_status(Utc::now());
    let ends_at = subscription
        .ends_at
        .map(|end| end.format("%Y-%m-%d").to_string());

    let recipients = hotel_service::admin_emails(pool, subscription.hotel_id).await?;
    let content = mail::templates::subscription_changed(
        &config.app_name,
        hotel_name,
        subscription.plan,
        status,
        ends_at.as_deref(),
    );
    let sent = mail::deliver_all(mailer, &recipients, content).await;

    let message = match &ends_at {
        Some(end) => format!(
            "Plan: {}. Status: {}. Current period ends {end}.",
            subscription.plan.label(),
            status.label()
        ),
        None => format!(
            "Plan: {}. Status: {}.",
            subscription.plan.label(),
            status.label()
        ),
    };

    notification_service::record(
        pool,
        NewNotification {
            hotel_id: subscription.hotel_id,
            kind: NotificationKind::Subscription,
            title: "Subscription updated".to_string(),
            message,
        },
        sent > 0,
    )
    .await?;

    Ok(())
}

/// Every subscription with its hotel, soonest-ending first.
///
/// The status filter applies to the stored status; expired periods are
/// reported with their effective status in the response.
pub async fn list_subscriptions(
    pool: &DbPool,
    query: &SubscriptionListQuery,
) -> Result<Paginated<SubscriptionOverview>, AppError> {
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM subscriptions s
        JOIN hotels h ON h.id = s.hotel_id
        WHERE h.status <> 'deleted'
          AND ($1::subscription_status IS NULL OR s.status = $1)
        "#,
    )
    .bind(query.status)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, SubscriptionWithHotel>(
        r#"
        SELECT s.*, h.name AS hotel_name
        FROM subscriptions s
        JOIN hotels h ON h.id = s.hotel_id
        WHERE h.status <> 'deleted'
          AND ($1::subscription_status IS NULL OR s.status = $1)
        ORDER BY s.ends_at ASC NULLS LAST, h.name
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(query.status)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    Ok(Paginated::new(rows, total, params).map(Into::into))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::test_config,
        db::fixtures,
        models::{notification::Notification, subscription::SubscriptionPlan},
        services::mail::testing::RecordingMailer,
    };
    use chrono::Duration;
    use sqlx::PgPool;

    fn premium_year() -> UpsertSubscriptionRequest {
        UpsertSubscriptionRequest {
            plan: SubscriptionPlan::Premium,
            status: SubscriptionStatus::Active,
            starts_at: None,
            ends_at: Some(Utc::now() + Duration::days(365)),
        }
    }

    #[sqlx::test]
    async fn upgrade_replaces_trial_and_tells_admins(pool: PgPool) {
        let hotel = fixtures::onboard(&pool, "Seaside Inn").await;
        let mailer = RecordingMailer::default();

        let subscription = upsert_subscription(&pool, &test_config(), &mailer, hotel.hotel.id, premium_year())
            .await
            .unwrap();

        assert_eq!(subscription.plan, SubscriptionPlan::Premium);
        assert_eq!(subscription.status, SubscriptionStatus::Active);
        assert_eq!(subscription.id, hotel.subscription.id);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Seaside Inn: subscription active");

        let notices = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE hotel_id = $1 AND kind = 'subscription'",
        )
        .bind(hotel.hotel.id)
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].emailed);
    }

    #[sqlx::test]
    async fn change_is_kept_when_announcement_fails(pool: PgPool) {
        let hotel = fixtures::onboard(&pool, "Seaside Inn").await;
        sqlx::query("DROP TABLE notifications").execute(&pool).await.unwrap();
        let config = test_config();
        let mailer = RecordingMailer::default();

        upsert_subscription(&pool, &config, &mailer, hotel.hotel.id, premium_year())
            .await
            .unwrap();
        let cancelled = cancel_subscription(&pool, &config, &mailer, hotel.hotel.id)
            .await
            .unwrap();

        assert_eq!(cancelled.status, SubscriptionStatus::Cancelled);
        let stored = find_subscription(&pool, hotel.hotel.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Cancelled);
        assert_eq!(stored.plan, SubscriptionPlan::Premium);
    }

    #[test]
    fn period_must_end_after_start() {
        let now = Utc::now();
        assert!(check_period(now, None).is_ok());
        assert!(check_period(now, Some(now + Duration::days(30))).is_ok());
        assert!(matches!(
            check_period(now, Some(now)),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(check_period(now, Some(now - Duration::days(1))).is_err());
    }
}
