//! Notification service - in-app notifications and their emails.

use uuid::Uuid;

use crate::{
    config::Config,
    db::DbPool,
    error::AppError,
    models::{
        notification::{
            NewNotification, Notification, NotificationListQuery, SendNotificationRequest,
            SendNotificationResponse,
        },
        pagination::{PageParams, Paginated},
    },
    services::{
        hotel_service,
        mail::{self, Mailer},
    },
};

/// Insert a notification row.
pub async fn record(pool: &DbPool, notification: NewNotification, emailed: bool) -> Result<Notification, AppError> {
    let notification = sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (hotel_id, kind, title, message, emailed)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(notification.hotel_id)
    .bind(notification.kind)
    .bind(notification.title)
    .bind(notification.message)
    .bind(emailed)
    .fetch_one(pool)
    .await?;

    Ok(notification)
}

/// Record a notification for one hotel and, if asked, email its admins using
/// the template for the notification kind. Returns the row and emails sent.
pub async fn notify_hotel(
    pool: &DbPool,
    config: &Config,
    mailer: &dyn Mailer,
    notification: NewNotification,
    send_email: bool,
) -> Result<(Notification, usize), AppError> {
    let mut emails_sent = 0;

    if send_email {
        let hotel = hotel_service::find_hotel(pool, notification.hotel_id).await?;
        let recipients = hotel_service::admin_emails(pool, hotel.id).await?;
        let content = mail::templates::notification(
            &config.app_name,
            &hotel.name,
            notification.kind,
            &notification.title,
            &notification.message,
            &format!("{}/dashboard", config.base_url()),
        );
        emails_sent = mail::deliver_all(mailer, &recipients, content).await;
    }

    let row = record(pool, notification, emails_sent > 0).await?;
    Ok((row, emails_sent))
}

/// Super-admin send: one hotel when `hotel_id` is set, otherwise every
/// active hotel.
///
/// # Errors
///
/// `NotFound("Hotel")` when the target hotel does not exist or is deleted.
pub async fn send_notification(
    pool: &DbPool,
    config: &Config,
    mailer: &dyn Mailer,
    request: SendNotificationRequest,
) -> Result<SendNotificationResponse, AppError> {
    let targets: Vec<Uuid> = match request.hotel_id {
        Some(hotel_id) => vec![hotel_service::find_hotel(pool, hotel_id).await?.id],
        None => {
            sqlx::query_scalar("SELECT id FROM hotels WHERE status = 'active' ORDER BY created_at")
                .fetch_all(pool)
                .await?
        }
    };

    let title = request.title.trim().to_string();
    let message = request.message.trim().to_string();

    let mut notifications = Vec::with_capacity(targets.len());
    let mut emails_sent = 0;

    for hotel_id in targets {
        let (notification, sent) = notify_hotel(
            pool,
            config,
            mailer,
            NewNotification {
                hotel_id,
                kind: request.kind,
                title: title.clone(),
                message: message.clone(),
            },
            request.send_email,
        )
        .await?;
        emails_sent += sent;
        notifications.push(notification);
    }

    tracing::info!(
        kind = ?request.kind,
        hotels = notifications.len(),
        emails_sent,
        "Notification sent"
    );

    Ok(SendNotificationResponse {
        notifications_created: notifications.len(),
        emails_sent,
        notifications,
    })
}

/// Notifications, newest first. `hotel_id = None` lists every hotel's.
pub async fn list_notifications(
    pool: &DbPool,
    hotel_id: Option<Uuid>,
    query: &NotificationListQuery,
) -> Result<Paginated<Notification>, AppError> {
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };
    let unread_only = query.unread_only.unwrap_or(false);

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM notifications
        WHERE ($1::uuid IS NULL OR hotel_id = $1)
          AND (NOT $2 OR is_read = false)
        "#,
    )
    .bind(hotel_id)
    .bind(unread_only)
    .fetch_one(pool)
    .await?;

    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT * FROM notifications
        WHERE ($1::uuid IS NULL OR hotel_id = $1)
          AND (NOT $2 OR is_read = false)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(hotel_id)
    .bind(unread_only)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    Ok(Paginated::new(notifications, total, params))
}

pub async fn unread_count(pool: &DbPool, hotel_id: Uuid) -> Result<i64, AppError> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE hotel_id = $1 AND is_read = false",
    )
    .bind(hotel_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Mark one notification of `hotel_id` as read.
pub async fn mark_read(pool: &DbPool, hotel_id: Uuid, notification_id: Uuid) -> Result<Notification, AppError> {
    sqlx::query_as::<_, Notification>(
        r#"
        UPDATE notifications SET is_read = true
        WHERE id = $1 AND hotel_id = $2
        RETURNING *
        "#,
    )
    .bind(notification_id)
    .bind(hotel_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Notification"))
}

/// Returns the number of notifications that changed.
pub async fn mark_all_read(pool: &DbPool, hotel_id: Uuid) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = true WHERE hotel_id = $1 AND is_read = false",
    )
    .bind(hotel_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
