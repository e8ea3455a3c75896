//! HTTP routing: which handler serves which path, and behind which layer.

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, middleware::auth, state::AppState};

/// Build the application router.
///
/// Three groups:
/// - public routes (guests, login, health)
/// - super-admin routes under `/api/admin`
/// - hotel-scoped routes, where handlers check tenant access themselves
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route(
            "/api/auth/reset-password",
            post(handlers::auth::reset_password),
        )
        .route(
            "/api/public/forms/{id}",
            get(handlers::public::get_public_form),
        )
        .route(
            "/api/public/forms/{id}/reviews",
            post(handlers::public::submit_review),
        )
        .route("/q/{id}", get(handlers::public::scan_qr_code))
        .route("/api/translate", post(handlers::translate::translate))
        .route(
            "/api/translate/batch",
            post(handlers::translate::translate_batch),
        );

    let admin_routes = Router::new()
        .route("/api/admin/stats", get(handlers::admin::platform_stats))
        // Hotels
        .route(
            "/api/admin/hotels",
            post(handlers::hotels::create_hotel).get(handlers::hotels::list_hotels),
        )
        .route(
            "/api/admin/hotels/{id}",
            get(handlers::hotels::get_hotel)
                .put(handlers::hotels::update_hotel)
                .delete(handlers::hotels::delete_hotel),
        )
        .route(
            "/api/admin/hotels/{id}/status",
            patch(handlers::hotels::update_hotel_status),
        )
        .route(
            "/api/admin/hotels/{id}/users",
            get(handlers::hotels::list_hotel_admins).post(handlers::hotels::add_hotel_admin),
        )
        .route(
            "/api/admin/users/{id}/status",
            patch(handlers::hotels::update_user_status),
        )
        // Subscriptions
        .route(
            "/api/admin/hotels/{id}/subscription",
            put(handlers::subscriptions::upsert_subscription),
        )
        .route(
            "/api/admin/hotels/{id}/subscription/cancel",
            post(handlers::subscriptions::cancel_subscription),
        )
        .route(
            "/api/admin/subscriptions",
            get(handlers::subscriptions::list_subscriptions),
        )
        // Notifications
        .route(
            "/api/admin/notifications",
            post(handlers::notifications::send_notification)
                .get(handlers::notifications::list_all_notifications),
        )
        // Support
        .route(
            "/api/admin/support",
            get(handlers::support::list_all_requests),
        )
        .route(
            "/api/admin/support/{id}",
            patch(handlers::support::update_support_request),
        )
        .route_layer(axum_middleware::from_fn(auth::super_admin_middleware));

    let authenticated_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/auth/change-password",
            post(handlers::auth::change_password),
        )
        // Hotel profile and hotel-scoped collections
        .route(
            "/api/hotels/{id}",
            get(handlers::hotels::get_hotel).put(handlers::hotels::update_hotel),
        )
        .route(
            "/api/hotels/{id}/forms",
            get(handlers::forms::list_forms).post(handlers::forms::create_form),
        )
        .route(
            "/api/hotels/{id}/reviews",
            get(handlers::reviews::list_reviews),
        )
        .route("/api/hotels/{id}/stats", get(handlers::reviews::hotel_stats))
        .route(
            "/api/hotels/{id}/qr-codes",
            get(handlers::qr_codes::list_qr_codes),
        )
        .route(
            "/api/hotels/{id}/subscription",
            get(handlers::subscriptions::get_subscription),
        )
        // Forms
        .route(
            "/api/forms/{id}",
            get(handlers::forms::get_form)
                .put(handlers::forms::update_form)
                .delete(handlers::forms::delete_form),
        )
        .route(
            "/api/forms/{id}/active",
            patch(handlers::forms::set_form_active),
        )
        .route("/api/forms/{id}/qr", get(handlers::forms::form_qr_image))
        .route(
            "/api/forms/{id}/qr-codes",
            post(handlers::qr_codes::create_qr_code),
        )
        // QR codes
        .route(
            "/api/qr-codes/{id}",
            delete(handlers::qr_codes::delete_qr_code),
        )
        .route(
            "/api/qr-codes/{id}/image",
            get(handlers::qr_codes::qr_code_image),
        )
        // Reviews
        .route(
            "/api/reviews/{id}",
            get(handlers::reviews::get_review).delete(handlers::reviews::delete_review),
        )
        .route(
            "/api/reviews/{id}/status",
            patch(handlers::reviews::update_review_status),
        )
        // Notifications
        .route(
            "/api/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route(
            "/api/notifications/unread-count",
            get(handlers::notifications::unread_count),
        )
        .route(
            "/api/notifications/read-all",
            post(handlers::notifications::mark_all_read),
        )
        .route(
            "/api/notifications/{id}/read",
            patch(handlers::notifications::mark_read),
        )
        // Support
        .route(
            "/api/support",
            post(handlers::support::create_support_request)
                .get(handlers::support::list_own_requests),
        )
        .merge(admin_routes)
        // Token check runs before the super-admin check on admin routes
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::test_config,
        db::fixtures,
        services::{
            hotel_service,
            mail::testing::RecordingMailer,
            translation_service::{TranslationService, testing::FakeProvider},
        },
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use sqlx::{PgPool, postgres::PgPoolOptions};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state_with(pool: PgPool, provider: FakeProvider) -> AppState {
        AppState {
            pool,
            config: Arc::new(test_config()),
            mailer: Arc::new(RecordingMailer::default()),
            translator: Arc::new(TranslationService::new(Arc::new(provider))),
        }
    }

    /// State whose pool never connects; only routes that answer before
    /// touching the database can be exercised.
    fn test_state(provider: FakeProvider) -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy(&test_config().database_url)
            .unwrap();
        state_with(pool, provider)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let app = router(test_state(FakeProvider::default()));
        let (status, body) = send(app, get("/api/auth/me", None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "unauthorized");
    }

    #[tokio::test]
    async fn forged_token_is_unauthorized() {
        let app = router(test_state(FakeProvider::default()));
        let (status, _) = send(app, get("/api/admin/stats", Some("not-a-jwt"))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn hotel_admin_cannot_reach_admin_routes(pool: PgPool) {
        let hotel = fixtures::onboard(&pool, "Seaside Inn").await;
        let admin = fixtures::user(&pool, hotel.admin.id).await;
        let app = router(state_with(pool, FakeProvider::default()));

        let (status, body) = send(app, get("/api/admin/stats", Some(&fixtures::bearer(&admin)))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "forbidden");
    }

    #[sqlx::test]
    async fn hotel_admin_cannot_read_other_hotel(pool: PgPool) {
        let own = fixtures::onboard(&pool, "Seaside Inn").await;
        let other = fixtures::onboard(&pool, "Mountain Lodge").await;
        let admin = fixtures::user(&pool, own.admin.id).await;
        let token = fixtures::bearer(&admin);
        let app = router(state_with(pool, FakeProvider::default()));

        let (status, _) = send(
            app.clone(),
            get(&format!("/api/hotels/{}/forms", other.hotel.id), Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            app,
            get(&format!("/api/hotels/{}/forms", own.hotel.id), Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[sqlx::test]
    async fn super_admin_has_no_own_notifications(pool: PgPool) {
        let root = fixtures::super_admin(&pool).await;
        let app = router(state_with(pool, FakeProvider::default()));

        let (status, _) = send(app, get("/api/notifications", Some(&fixtures::bearer(&root)))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    async fn admins_of_deleted_hotel_lose_access_immediately(pool: PgPool) {
        let hotel = fixtures::onboard(&pool, "Seaside Inn").await;
        let admin = fixtures::user(&pool, hotel.admin.id).await;
        let token = fixtures::bearer(&admin);
        let app = router(state_with(pool.clone(), FakeProvider::default()));
        let reviews = format!("/api/hotels/{}/reviews", hotel.hotel.id);

        let (status, _) = send(app.clone(), get(&reviews, Some(&token))).await;
        assert_eq!(status, StatusCode::OK);

        hotel_service::delete_hotel(&pool, hotel.hotel.id).await.unwrap();

        for uri in [reviews.as_str(), "/api/notifications", "/api/auth/me"] {
            let (status, body) = send(app.clone(), get(uri, Some(&token))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["error"]["code"], "unauthorized");
        }
    }

    #[sqlx::test]
    async fn deactivated_admin_is_rejected(pool: PgPool) {
        let hotel = fixtures::onboard(&pool, "Seaside Inn").await;
        let admin = fixtures::user(&pool, hotel.admin.id).await;
        let token = fixtures::bearer(&admin);
        hotel_service::set_user_active(&pool, admin.id, false).await.unwrap();
        let app = router(state_with(pool, FakeProvider::default()));

        let (status, _) = send(
            app,
            get(&format!("/api/hotels/{}/forms", hotel.hotel.id), Some(&token)),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn translate_uses_provider() {
        let app = router(test_state(FakeProvider::default()));

        let (status, body) = send(
            app,
            post_json(
                "/api/translate",
                json!({ "text": "How was your stay?", "source": "en", "target": "fr" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translated"], "[fr] HOW WAS YOUR STAY?");
        assert_eq!(body["target"], "fr");
    }

    #[tokio::test]
    async fn translate_rejects_bad_language() {
        let app = router(test_state(FakeProvider::default()));

        let (status, body) = send(
            app,
            post_json(
                "/api/translate",
                json!({ "text": "Hello", "source": "en", "target": "f1" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn translate_provider_failure_is_bad_gateway() {
        let provider = FakeProvider {
            fail: true,
            ..Default::default()
        };
        let app = router(test_state(provider));

        let (status, body) = send(
            app,
            post_json(
                "/api/translate",
                json!({ "text": "Hello", "source": "en", "target": "de" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "translation_failed");
    }

    #[tokio::test]
    async fn batch_keeps_order() {
        let app = router(test_state(FakeProvider::default()));

        let (status, body) = send(
            app,
            post_json(
                "/api/translate/batch",
                json!({ "texts": ["Pool", "Spa"], "source": "en", "target": "es" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translations"], json!(["[es] POOL", "[es] SPA"]));
    }

    #[tokio::test]
    async fn invalid_login_body_is_rejected_before_lookup() {
        let app = router(test_state(FakeProvider::default()));

        let (status, _) = send(
            app,
            post_json(
                "/api/auth/login",
                json!({ "email": "not-an-email", "password": "x" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn forgot_password_accepts_malformed_email() {
        let app = router(test_state(FakeProvider::default()));

        let (status, _) = send(
            app,
            post_json("/api/auth/forgot-password", json!({ "email": "not-an-email" })),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
    }
}
