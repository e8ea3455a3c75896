//! Hotel service - tenant onboarding, profile updates and hotel admins.
//!
//! Creating a hotel is the onboarding flow: the hotel row, its first admin
//! (with a temporary password), and a trial subscription are written in one
//! database transaction; the welcome email and a system notification follow.

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    config::Config,
    db::DbPool,
    error::AppError,
    models::{
        hotel::{
            CreateHotelRequest, CreateHotelResponse, Hotel, HotelListQuery, HotelStatus,
            UpdateHotelRequest, slugify,
        },
        notification::{NewNotification, NotificationKind},
        pagination::{PageParams, Paginated},
        subscription::{Subscription, SubscriptionPlan, SubscriptionStatus},
        user::{User, UserResponse, UserRole},
    },
    services::{
        auth_service,
        mail::{self, Mailer},
        notification_service,
    },
    validation::{normalize_optional, validate_language},
};

/// Postgres unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

pub async fn find_hotel(pool: &DbPool, hotel_id: Uuid) -> Result<Hotel, AppError> {
    sqlx::query_as::<_, Hotel>("SELECT * FROM hotels WHERE id = $1 AND status <> 'deleted'")
        .bind(hotel_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Hotel"))
}

/// Pick a slug not used by another hotel: `name`, `name-2`, `name-3`, ...
async fn unique_slug(pool: &DbPool, name: &str) -> Result<String, AppError> {
    let base = slugify(name);

    let taken: Vec<String> = sqlx::query_scalar(
        "SELECT slug FROM hotels WHERE slug = $1 OR slug LIKE $1 || '-%'",
    )
    .bind(&base)
    .fetch_all(pool)
    .await?;

    Ok(next_free_slug(&base, &taken))
}

fn next_free_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|s| s == base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| format!("{base}-{}", Uuid::new_v4().simple()))
}

/// Onboard a hotel together with its first admin and a trial subscription.
///
/// # Errors
///
/// - `AlreadyExists("User")` when the admin email is already registered
/// - `InvalidRequest` for an invalid default language
pub async fn create_hotel(
    pool: &DbPool,
    config: &Config,
    mailer: &dyn Mailer,
    request: CreateHotelRequest,
) -> Result<CreateHotelResponse, AppError> {
    let default_language = request
        .default_language
        .clone()
        .unwrap_or_else(|| "en".to_string());
    validate_language(&default_language)?;

    if auth_service::find_user_by_email(pool, &request.admin_email)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists("User"));
    }

    let slug = unique_slug(pool, &request.name).await?;
    let temporary_password = auth_service::generate_temporary_password();
    let password_hash = auth_service::hash_password(&temporary_password)?;

    let mut tx = pool.begin().await?;

    let hotel = sqlx::query_as::<_, Hotel>(
        r#"
        INSERT INTO hotels (name, slug, email, phone, address, city, country, website, logo_url, default_language)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(request.name.trim())
    .bind(&slug)
    .bind(request.email.trim().to_lowercase())
    .bind(normalize_optional(request.phone))
    .bind(normalize_optional(request.address))
    .bind(normalize_optional(request.city))
    .bind(normalize_optional(request.country))
    .bind(normalize_optional(request.website))
    .bind(normalize_optional(request.logo_url))
    .bind(&default_language)
    .fetch_one(&mut *tx)
    .await?;

    let admin = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, name, password_hash, role, hotel_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(request.admin_email.trim().to_lowercase())
    .bind(request.admin_name.trim())
    .bind(password_hash)
    .bind(UserRole::HotelAdmin)
    .bind(hotel.id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::AlreadyExists("User")
        } else {
            e.into()
        }
    })?;

    let now = Utc::now();
    let subscription = sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions (hotel_id, plan, status, starts_at, ends_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(hotel.id)
    .bind(SubscriptionPlan::Trial)
    .bind(SubscriptionStatus::Trialing)
    .bind(now)
    .bind(now + Duration::days(config.trial_days))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(hotel_id = %hotel.id, slug = %hotel.slug, admin_id = %admin.id, "Hotel onboarded");

    let welcome = mail::templates::welcome(
        &config.app_name,
        &admin.name,
        &hotel.name,
        &admin.email,
        &temporary_password,
        &format!("{}/login", config.base_url()),
    );
    mail::deliver(mailer, &admin.email, welcome).await;

    let welcome_notice = NewNotification {
        hotel_id: hotel.id,
        kind: NotificationKind::System,
        title: format!("Welcome to {}", config.app_name),
        message: format!(
            "Your {}-day trial has started. Create a feedback form and print its QR code to start collecting reviews.",
            config.trial_days
        ),
    };
    if let Err(e) = notification_service::record(pool, welcome_notice, false).await {
        tracing::error!(hotel_id = %hotel.id, error = %e, "Failed to record welcome notification");
    }

    Ok(CreateHotelResponse {
        hotel,
        admin: admin.into(),
        subscription: subscription.into(),
    })
}

/// Paginated hotel list for super-admins. Deleted hotels only show when
/// filtered for explicitly.
pub async fn list_hotels(pool: &DbPool, query: HotelListQuery) -> Result<Paginated<Hotel>, AppError> {
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.replace('%', "\\%").replace('_', "\\_")));

    let filter = r#"
        FROM hotels
        WHERE ($1::hotel_status IS NULL OR status = $1)
          AND ($1::hotel_status IS NOT NULL OR status <> 'deleted')
          AND ($2::text IS NULL OR name ILIKE $2 OR city ILIKE $2 OR email ILIKE $2)
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {filter}"))
        .bind(query.status)
        .bind(&search)
        .fetch_one(pool)
        .await?;

    let hotels = sqlx::query_as::<_, Hotel>(&format!(
        "SELECT * {filter} ORDER BY created_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(query.status)
    .bind(&search)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    Ok(Paginated::new(hotels, total, params))
}

pub async fn update_hotel(
    pool: &DbPool,
    hotel_id: Uuid,
    request: UpdateHotelRequest,
) -> Result<Hotel, AppError> {
    if let Some(language) = request.default_language.as_deref() {
        validate_language(language)?;
    }

    let hotel = sqlx::query_as::<_, Hotel>(
        r#"
        UPDATE hotels
        SET name = COALESCE($2, name),
            email = COALESCE($3, email),
            phone = COALESCE($4, phone),
            address = COALESCE($5, address),
            city = COALESCE($6, city),
            country = COALESCE($7, country),
            website = COALESCE($8, website),
            logo_url = COALESCE($9, logo_url),
            default_language = COALESCE($10, default_language),
            updated_at = NOW()
        WHERE id = $1 AND status <> 'deleted'
        RETURNING *
        "#,
    )
    .bind(hotel_id)
    .bind(request.name.as_deref().map(str::trim))
    .bind(request.email.map(|e| e.trim().to_lowercase()))
    .bind(normalize_optional(request.phone))
    .bind(normalize_optional(request.address))
    .bind(normalize_optional(request.city))
    .bind(normalize_optional(request.country))
    .bind(normalize_optional(request.website))
    .bind(normalize_optional(request.logo_url))
    .bind(request.default_language)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Hotel"))?;

    tracing::info!(%hotel_id, "Hotel updated");
    Ok(hotel)
}

/// Activate or suspend a hotel. Suspended hotels keep their data but their
/// forms stop accepting feedback.
pub async fn set_hotel_status(pool: &DbPool, hotel_id: Uuid, status: HotelStatus) -> Result<Hotel, AppError> {
    if status == HotelStatus::Deleted {
        return Err(AppError::InvalidRequest(
            "Use DELETE to remove a hotel".to_string(),
        ));
    }

    let hotel = sqlx::query_as::<_, Hotel>(
        r#"
        UPDATE hotels SET status = $2, updated_at = NOW()
        WHERE id = $1 AND status <> 'deleted'
        RETURNING *
        "#,
    )
    .bind(hotel_id)
    .bind(status)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Hotel"))?;

    tracing::info!(%hotel_id, ?status, "Hotel status changed");
    Ok(hotel)
}

/// Soft delete a hotel and deactivate its users.
pub async fn delete_hotel(pool: &DbPool, hotel_id: Uuid) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE hotels SET status = 'deleted', updated_at = NOW() WHERE id = $1 AND status <> 'deleted'",
    )
    .bind(hotel_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Hotel"));
    }

    sqlx::query("UPDATE users SET is_active = false, updated_at = NOW() WHERE hotel_id = $1")
        .bind(hotel_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(%hotel_id, "Hotel deleted");
    Ok(())
}

/// Admin accounts of a hotel.
pub async fn list_hotel_admins(pool: &DbPool, hotel_id: Uuid) -> Result<Vec<UserResponse>, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE hotel_id = $1 ORDER BY created_at",
    )
    .bind(hotel_id)
    .fetch_all(pool)
    .await?;

    Ok(users.into_iter().map(Into::into).collect())
}

/// Email addresses of the active admins of a hotel.
pub async fn admin_emails(pool: &DbPool, hotel_id: Uuid) -> Result<Vec<String>, AppError> {
    let emails = sqlx::query_scalar(
        "SELECT email FROM users WHERE hotel_id = $1 AND is_active = true ORDER BY created_at",
    )
    .bind(hotel_id)
    .fetch_all(pool)
    .await?;

    Ok(emails)
}

/// Add another admin to an existing hotel and send them a welcome email.
pub async fn add_hotel_admin(
    pool: &DbPool,
    config: &Config,
    mailer: &dyn Mailer,
    hotel_id: Uuid,
    name: &str,
    email: &str,
) -> Result<UserResponse, AppError> {
    let hotel = find_hotel(pool, hotel_id).await?;

    let temporary_password = auth_service::generate_temporary_password();
    let password_hash = auth_service::hash_password(&temporary_password)?;

    let admin = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, name, password_hash, role, hotel_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(email.trim().to_lowercase())
    .bind(name.trim())
    .bind(password_hash)
    .bind(UserRole::HotelAdmin)
    .bind(hotel.id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::AlreadyExists("User")
        } else {
            e.into()
        }
    })?;

    tracing::info!(%hotel_id, admin_id = %admin.id, "Hotel admin added");

    let welcome = mail::templates::welcome(
        &config.app_name,
        &admin.name,
        &hotel.name,
        &admin.email,
        &temporary_password,
        &format!("{}/login", config.base_url()),
    );
    mail::deliver(mailer, &admin.email, welcome).await;

    Ok(admin.into())
}

/// Activate or deactivate a hotel admin.
pub async fn set_user_active(pool: &DbPool, user_id: Uuid, is_active: bool) -> Result<UserResponse, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET is_active = $2, updated_at = NOW()
        WHERE id = $1 AND role = 'hotel_admin'
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(is_active)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("User"))?;

    Ok(user.into())
}
