//! Authentication service - passwords, access tokens and password resets.
//!
//! - Passwords are hashed with Argon2id
//! - Access tokens are HS256 JWTs carrying the user's role and hotel
//! - Password reset tokens are random; only their SHA-256 hash is stored

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    config::Config,
    db::DbPool,
    error::AppError,
    models::user::{LoginResponse, User, UserRole},
    services::mail::{self, Mailer},
};

/// How long a password reset link stays valid.
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub hotel_id: Option<Uuid>,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

/// Verify a password against an Argon2id hash. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Generate a signed access token for a user.
pub fn generate_access_token(
    user: &User,
    secret: &str,
    ttl_secs: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role,
        hotel_id: user.hotel_id,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_secs as i64)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate and decode an access token.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Random alphanumeric string, used for temporary passwords.
pub fn generate_temporary_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

/// Random reset token (64 hex chars).
fn generate_reset_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// SHA-256 hex digest of a reset token, the form stored in the database.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub async fn find_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_user_by_id(pool: &DbPool, user_id: Uuid) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Authenticate with email + password.
///
/// # Errors
///
/// - `InvalidCredentials`: unknown email, wrong password, or inactive user.
///   The three cases are indistinguishable to the caller.
pub async fn login(
    pool: &DbPool,
    config: &Config,
    email: &str,
    password: &str,
) -> Result<LoginResponse, AppError> {
    let user = find_user_by_email(pool, email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash) || !user.is_active {
        return Err(AppError::InvalidCredentials);
    }

    let access_token =
        generate_access_token(&user, &config.jwt_secret, config.access_token_ttl_secs)
            .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(user_id = %user.id, role = ?user.role, "User logged in");

    Ok(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl_secs,
        user: user.into(),
    })
}

/// Change the password of a logged-in user after checking the current one.
pub async fn change_password(
    pool: &DbPool,
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
) -> Result<(), AppError> {
    let user = find_user_by_id(pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if !verify_password(current_password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    set_password(pool, user_id, new_password).await
}

async fn set_password(pool: &DbPool, user_id: Uuid, new_password: &str) -> Result<(), AppError> {
    let password_hash = hash_password(new_password)?;

    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Start a password reset.
///
/// Unknown or inactive emails are silently ignored so the endpoint does not
/// reveal which addresses have accounts.
pub async fn request_password_reset(
    pool: &DbPool,
    config: &Config,
    mailer: &dyn Mailer,
    email: &str,
) -> Result<(), AppError> {
    let Some(user) = find_user_by_email(pool, email).await? else {
        tracing::debug!("Password reset requested for unknown email");
        return Ok(());
    };

    if !user.is_active {
        return Ok(());
    }

    let token = generate_reset_token();
    let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

    sqlx::query(
        r#"
        INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user.id)
    .bind(hash_token(&token))
    .bind(expires_at)
    .execute(pool)
    .await?;

    let reset_url = format!("{}/reset-password?token={}", config.base_url(), token);
    let email = mail::templates::password_reset(
        &config.app_name,
        &user.name,
        &reset_url,
        RESET_TOKEN_TTL_MINUTES,
    );
    mail::deliver(mailer, &user.email, email).await;

    Ok(())
}

/// Finish a password reset with the emailed token.
///
/// # Errors
///
/// - `InvalidRequest`: token unknown, already used, or expired
pub async fn reset_password(pool: &DbPool, token: &str, new_password: &str) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    // Claim the token atomically so it can only be used once
    let user_id: Option<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE password_reset_tokens
        SET used_at = NOW()
        WHERE token_hash = $1 AND used_at IS NULL AND expires_at > NOW()
        RETURNING user_id
        "#,
    )
    .bind(hash_token(token))
    .fetch_optional(&mut *tx)
    .await?;

    let user_id = user_id.ok_or_else(|| {
        AppError::InvalidRequest("Reset link is invalid or has expired".to_string())
    })?;

    let password_hash = hash_password(new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(%user_id, "Password reset completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole, hotel_id: Option<Uuid>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "admin@hotel.test".into(),
            name: "Admin".into(),
            password_hash: String::new(),
            role,
            hotel_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn password_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn token_carries_role_and_hotel() {
        let hotel_id = Uuid::new_v4();
        let admin = user(UserRole::HotelAdmin, Some(hotel_id));
        let token = generate_access_token(&admin, "secret", 60).unwrap();

        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, admin.id.to_string());
        assert_eq!(claims.role, UserRole::HotelAdmin);
        assert_eq!(claims.hotel_id, Some(hotel_id));

        assert!(validate_token(&token, "other-secret").is_err());
    }

    #[test]
    fn temporary_passwords_are_random_alphanumeric() {
        let a = generate_temporary_password();
        let b = generate_temporary_password();
        assert_eq!(a.len(), 12);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn token_hash_is_sha256_hex() {
        let hash = hash_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(generate_reset_token().len(), 64);
    }

    #[sqlx::test]
    async fn reset_token_works_once(pool: sqlx::PgPool) {
        let config = crate::config::test_config();
        let mailer = mail::testing::RecordingMailer::default();
        crate::db::fixtures::onboard(&pool, "Seaside Inn").await;

        request_password_reset(&pool, &config, &mailer, "ADMIN@seaside-inn.test")
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        let start = sent[0].html.find("token=").unwrap() + "token=".len();
        let token = &sent[0].html[start..start + 64];

        reset_password(&pool, token, "a brand new password").await.unwrap();
        assert!(matches!(
            reset_password(&pool, token, "another password").await,
            Err(AppError::InvalidRequest(_))
        ));

        let session = login(&pool, &config, "admin@seaside-inn.test", "a brand new password")
            .await
            .unwrap();
        assert_eq!(session.user.email, "admin@seaside-inn.test");
    }

    #[sqlx::test]
    async fn unknown_email_sends_nothing(pool: sqlx::PgPool) {
        let mailer = mail::testing::RecordingMailer::default();

        request_password_reset(&pool, &crate::config::test_config(), &mailer, "nobody@nowhere.test")
            .await
            .unwrap();

        assert!(mailer.sent().is_empty());
    }
}
