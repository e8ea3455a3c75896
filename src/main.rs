//! Guest Feedback Service - Main Application Entry Point
//!
//! Multi-tenant backend for hotel guest feedback: hotels build feedback
//! forms, guests answer them from QR codes in their own language, and hotel
//! admins work through the reviews. A super-admin onboards hotels and
//! manages their subscriptions.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: JWT bearer tokens, Argon2 password hashes
//! - **Email**: SMTP via lettre (logged when SMTP is not configured)
//! - **Translation**: MyMemory HTTP API behind an in-memory cache
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations and seed the bootstrap super-admin
//! 4. Build the mailer and translation service
//! 5. Build HTTP router with routes and middleware
//! 6. Start server on configured port

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod validation;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use services::translation_service::{MyMemoryProvider, TranslationService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    config.validate()?;
    tracing::info!(app_url = %config.base_url(), "Configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    db::seed_super_admin(&pool, &config).await?;

    let mailer = services::mail::from_config(&config)?;
    let provider = MyMemoryProvider::new(&config)?;
    let translator = TranslationService::new(Arc::new(provider));

    let addr = format!("0.0.0.0:{}", config.server_port);

    let app = routes::router(state::AppState {
        pool,
        config: Arc::new(config),
        mailer,
        translator: Arc::new(translator),
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
