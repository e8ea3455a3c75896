//! Database connection pool, migrations and bootstrap data.
//!
//! This module provides utilities for:
//! - Creating and managing a PostgreSQL connection pool
//! - Running database migrations automatically
//! - Seeding the first super-admin account

use sqlx::{Pool, Postgres};

use crate::{config::Config, models::user::UserRole, services::auth_service};

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// # Configuration
///
/// - Maximum connections: 10
/// - Connections are created lazily as needed
///
/// # Errors
///
/// Returns an error if the connection string is invalid or the server
/// cannot be reached.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table, so each
/// migration runs only once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro embeds ./migrations at compile time
    sqlx::migrate!("./migrations").run(pool).await
}

/// Create the bootstrap super-admin when configured and none exists yet.
///
/// Returns `true` when an account was created.
pub async fn seed_super_admin(pool: &DbPool, config: &Config) -> anyhow::Result<bool> {
    let (Some(email), Some(password)) = (
        config.super_admin_email.as_deref(),
        config.super_admin_password.as_deref(),
    ) else {
        return Ok(false);
    };

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = $1)")
            .bind(UserRole::SuperAdmin)
            .fetch_one(pool)
            .await?;

    if exists {
        return Ok(false);
    }

    let password_hash = auth_service::hash_password(password)?;

    sqlx::query(
        r#"
        INSERT INTO users (email, name, password_hash, role)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(email.trim().to_lowercase())
    .bind("Super Admin")
    .bind(password_hash)
    .bind(UserRole::SuperAdmin)
    .execute(pool)
    .await?;

    tracing::info!(%email, "Bootstrap super-admin created");

    Ok(true)
}

/// Fixtures for `#[sqlx::test]` cases, which get a fresh migrated database.
#[cfg(test)]
pub mod fixtures {
    use uuid::Uuid;

    use super::DbPool;
    use crate::{
        config::test_config,
        models::{
            form::{CreateFormRequest, FormWithQuestions, QuestionInput, QuestionType},
            hotel::{CreateHotelRequest, CreateHotelResponse, slugify},
            user::User,
        },
        services::{auth_service, form_service, hotel_service, mail::testing::RecordingMailer},
    };

    /// Onboard a hotel; its admin is `admin@<slug>.test`.
    pub async fn onboard(pool: &DbPool, name: &str) -> CreateHotelResponse {
        let slug = slugify(name);
        hotel_service::create_hotel(
            pool,
            &test_config(),
            &RecordingMailer::default(),
            CreateHotelRequest {
                name: name.to_string(),
                email: format!("front-desk@{slug}.test"),
                phone: None,
                address: None,
                city: None,
                country: None,
                website: None,
                logo_url: None,
                default_language: None,
                admin_name: "Maria".to_string(),
                admin_email: format!("admin@{slug}.test"),
            },
        )
        .await
        .unwrap()
    }

    /// Active form with two required rating questions and an optional
    /// comment, in that order.
    pub async fn rating_form(pool: &DbPool, hotel_id: Uuid) -> FormWithQuestions {
        let question = |text: &str, question_type, required| QuestionInput {
            text: text.to_string(),
            question_type,
            options: Vec::new(),
            required,
        };

        form_service::create_form(
            pool,
            hotel_id,
            CreateFormRequest {
                title: "Checkout survey".to_string(),
                description: None,
                is_active: true,
                questions: vec![
                    question("How was your room?", QuestionType::Rating, true),
                    question("How was breakfast?", QuestionType::Rating, true),
                    question("Anything else?", QuestionType::Text, false),
                ],
            },
        )
        .await
        .unwrap()
    }

    pub async fn user(pool: &DbPool, user_id: Uuid) -> User {
        auth_service::find_user_by_id(pool, user_id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn super_admin(pool: &DbPool) -> User {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash, role)
            VALUES ('root@platform.test', 'Root', '', 'super_admin')
            RETURNING *
            "#,
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    pub fn bearer(user: &User) -> String {
        auth_service::generate_access_token(user, &test_config().jwt_secret, 3600).unwrap()
    }
}
