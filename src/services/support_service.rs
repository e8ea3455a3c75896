//! Support service - hotel admins ask, super-admins answer.

use uuid::Uuid;

use crate::{
    config::Config,
    db::DbPool,
    error::AppError,
    models::{
        pagination::{PageParams, Paginated},
        support::{
            CreateSupportRequest, SupportListQuery, SupportRequest, SupportRequestView,
            UpdateSupportRequest,
        },
    },
    services::{
        auth_service,
        mail::{self, Mailer},
    },
    validation::normalize_optional,
};

const VIEW_SELECT: &str = r#"
    SELECT r.*, h.name AS hotel_name, u.name AS requester_name, u.email AS requester_email
    FROM support_requests r
    JOIN hotels h ON h.id = r.hotel_id
    JOIN users u ON u.id = r.user_id
"#;

/// Open a support request and send the requester a confirmation.
pub async fn create_request(
    pool: &DbPool,
    config: &Config,
    mailer: &dyn Mailer,
    hotel_id: Uuid,
    user_id: Uuid,
    request: CreateSupportRequest,
) -> Result<SupportRequest, AppError> {
    let requester = auth_service::find_user_by_id(pool, user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let support_request = sqlx::query_as::<_, SupportRequest>(
        r#"
        INSERT INTO support_requests (hotel_id, user_id, subject, message, priority)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(hotel_id)
    .bind(user_id)
    .bind(request.subject.trim())
    .bind(request.message.trim())
    .bind(request.priority)
    .fetch_one(pool)
    .await?;

    tracing::info!(
        support_request_id = %support_request.id,
        %hotel_id,
        priority = ?support_request.priority,
        "Support request opened"
    );

    let confirmation = mail::templates::support_received(
        &config.app_name,
        &requester.name,
        &support_request.subject,
    );
    mail::deliver(mailer, &requester.email, confirmation).await;

    Ok(support_request)
}

/// Requests of one hotel, or all hotels when `hotel_id` is `None`.
pub async fn list_requests(
    pool: &DbPool,
    hotel_id: Option<Uuid>,
    query: &SupportListQuery,
) -> Result<Paginated<SupportRequestView>, AppError> {
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM support_requests
        WHERE ($1::uuid IS NULL OR hotel_id = $1)
          AND ($2::support_status IS NULL OR status = $2)
        "#,
    )
    .bind(hotel_id)
    .bind(query.status)
    .fetch_one(pool)
    .await?;

    let requests = sqlx::query_as::<_, SupportRequestView>(&format!(
        r#"{VIEW_SELECT}
        WHERE ($1::uuid IS NULL OR r.hotel_id = $1)
          AND ($2::support_status IS NULL OR r.status = $2)
        ORDER BY r.created_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(hotel_id)
    .bind(query.status)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    Ok(Paginated::new(requests, total, params))
}

async fn find_request_view(pool: &DbPool, request_id: Uuid) -> Result<SupportRequestView, AppError> {
    sqlx::query_as::<_, SupportRequestView>(&format!("{VIEW_SELECT} WHERE r.id = $1"))
        .bind(request_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Support request"))
}

/// Update status and/or response. The requester is emailed when the
/// response text changes.
pub async fn update_request(
    pool: &DbPool,
    config: &Config,
    mailer: &dyn Mailer,
    request_id: Uuid,
    update: UpdateSupportRequest,
) -> Result<SupportRequestView, AppError> {
    let response = normalize_optional(update.response);
    if update.status.is_none() && response.is_none() {
        return Err(AppError::InvalidRequest(
            "Nothing to update: provide a status or a response".to_string(),
        ));
    }

    let current = find_request_view(pool, request_id).await?;

    let updated = sqlx::query_as::<_, SupportRequest>(
        r#"
        UPDATE support_requests
        SET status = COALESCE($2, status),
            response = COALESCE($3, response),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(request_id)
    .bind(update.status)
    .bind(&response)
    .fetch_one(pool)
    .await?;

    tracing::info!(
        support_request_id = %request_id,
        status = ?updated.status,
        responded = response.is_some(),
        "Support request updated"
    );

    let answered = response.is_some() && response != current.request.response;
    if answered {
        let content = mail::templates::support_response(
            &config.app_name,
            &current.requester_name,
            &updated.subject,
            updated.status,
            updated.response.as_deref(),
        );
        mail::deliver(mailer, &current.requester_email, content).await;
    }

    Ok(SupportRequestView {
        request: updated,
        ..current
    })
}
