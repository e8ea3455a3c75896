//! Review service - guest submissions, the review inbox and hotel stats.
//!
//! A submission is checked against the form's current questions, then the
//! review and its answers are written in a single database transaction.
//! Question text, type and position are copied onto each answer so later
//! form edits do not rewrite history.

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    config::Config,
    db::DbPool,
    error::AppError,
    models::{
        notification::{NewNotification, NotificationKind},
        pagination::{PageParams, Paginated},
        review::{
            QuestionAnswer, Review, ReviewDetail, ReviewListQuery, ReviewStatus,
            SubmitReviewRequest, compute_rating, validate_answers,
        },
        stats::{HotelStats, rating_distribution},
    },
    services::{
        form_service::{self, AnswerableForm},
        hotel_service,
        mail::{self, Mailer},
        notification_service, qr_service,
    },
    validation::{normalize_optional, validate_language},
};

const LATEST_REVIEWS: i64 = 5;

/// Store a guest review for a public form.
///
/// # Errors
///
/// - `NotFound("Form")` when the form is not currently answerable
/// - `InvalidRequest` when an answer breaks the form's rules or the QR code
///   belongs to another form
pub async fn submit_review(
    pool: &DbPool,
    config: &Config,
    mailer: &dyn Mailer,
    form_id: Uuid,
    request: SubmitReviewRequest,
) -> Result<Review, AppError> {
    let answerable = form_service::load_answerable_form(pool, form_id).await?;

    let language = normalize_optional(request.language);
    if let Some(language) = language.as_deref() {
        validate_language(language)?;
    }

    if let Some(qr_code_id) = request.qr_code_id {
        let qr_code = qr_service::get_qr_code(pool, qr_code_id).await?;
        if qr_code.form_id != form_id {
            return Err(AppError::InvalidRequest(
                "QR code does not belong to this form".to_string(),
            ));
        }
    }

    let answers = validate_answers(&answerable.questions, &request.answers)?;
    let rating = compute_rating(&answers);

    let mut tx = pool.begin().await?;

    let review = sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (hotel_id, form_id, qr_code_id, guest_name, guest_email, room_number, comment, rating, language)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(answerable.hotel.id)
    .bind(form_id)
    .bind(request.qr_code_id)
    .bind(normalize_optional(request.guest_name))
    .bind(normalize_optional(request.guest_email).map(|e| e.to_lowercase()))
    .bind(normalize_optional(request.room_number))
    .bind(normalize_optional(request.comment))
    .bind(rating)
    .bind(&language)
    .fetch_one(&mut *tx)
    .await?;

    for answer in &answers {
        sqlx::query(
            r#"
            INSERT INTO question_answers (review_id, question_id, question_text, question_type, position, value)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(review.id)
        .bind(answer.question_id)
        .bind(&answer.question_text)
        .bind(answer.question_type)
        .bind(answer.position)
        .bind(sqlx::types::Json(&answer.value))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        review_id = %review.id,
        %form_id,
        hotel_id = %review.hotel_id,
        rating = ?review.rating,
        answers = answers.len(),
        "Review submitted"
    );

    if let Err(e) = announce_review(pool, config, mailer, &answerable, &review).await {
        tracing::error!(review_id = %review.id, error = %e, "Failed to notify hotel of new review");
    }

    Ok(review)
}

/// Notification row plus email to the hotel's admins.
async fn announce_review(
    pool: &DbPool,
    config: &Config,
    mailer: &dyn Mailer,
    answerable: &AnswerableForm,
    review: &Review,
) -> Result<(), AppError> {
    let hotel = &answerable.hotel;
    let recipients = hotel_service::admin_emails(pool, hotel.id).await?;

    let content = mail::templates::new_review(
        &config.app_name,
        &hotel.name,
        &answerable.form.title,
        review.guest_name.as_deref(),
        review.room_number.as_deref(),
        review.rating,
        review.comment.as_deref(),
        &format!("{}/reviews/{}", config.base_url(), review.id),
    );
    let sent = mail::deliver_all(mailer, &recipients, content).await;

    let guest = review.guest_name.as_deref().unwrap_or("A guest");
    let message = match review.rating {
        Some(rating) => format!("{guest} rated their stay {rating:.1}/5 on \"{}\".", answerable.form.title),
        None => format!("{guest} answered \"{}\".", answerable.form.title),
    };

    notification_service::record(
        pool,
        NewNotification {
            hotel_id: hotel.id,
            kind: NotificationKind::Review,
            title: "New guest review".to_string(),
            message,
        },
        sent > 0,
    )
    .await?;

    Ok(())
}

/// Reviews of a hotel, newest first.
pub async fn list_reviews(
    pool: &DbPool,
    hotel_id: Uuid,
    query: &ReviewListQuery,
) -> Result<Paginated<Review>, AppError> {
    if let (Some(min), Some(max)) = (query.min_rating, query.max_rating) {
        if min > max {
            return Err(AppError::InvalidRequest(
                "min_rating must not exceed max_rating".to_string(),
            ));
        }
    }

    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };

    let filter = r#"
        FROM reviews
        WHERE hotel_id = $1
          AND ($2::review_status IS NULL OR status = $2)
          AND ($3::uuid IS NULL OR form_id = $3)
          AND ($4::float8 IS NULL OR rating >= $4)
          AND ($5::float8 IS NULL OR rating <= $5)
          AND ($6::timestamptz IS NULL OR created_at >= $6)
          AND ($7::timestamptz IS NULL OR created_at <= $7)
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {filter}"))
        .bind(hotel_id)
        .bind(query.status)
        .bind(query.form_id)
        .bind(query.min_rating)
        .bind(query.max_rating)
        .bind(query.from)
        .bind(query.to)
        .fetch_one(pool)
        .await?;

    let reviews = sqlx::query_as::<_, Review>(&format!(
        "SELECT * {filter} ORDER BY created_at DESC LIMIT $8 OFFSET $9"
    ))
    .bind(hotel_id)
    .bind(query.status)
    .bind(query.form_id)
    .bind(query.min_rating)
    .bind(query.max_rating)
    .bind(query.from)
    .bind(query.to)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    Ok(Paginated::new(reviews, total, params))
}

pub async fn find_review(pool: &DbPool, review_id: Uuid) -> Result<Review, AppError> {
    sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
        .bind(review_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Review"))
}

/// A review with its answers in question order.
pub async fn get_review_detail(pool: &DbPool, review: Review) -> Result<ReviewDetail, AppError> {
    let form_title: String = sqlx::query_scalar("SELECT title FROM feedback_forms WHERE id = $1")
        .bind(review.form_id)
        .fetch_one(pool)
        .await?;

    let answers = sqlx::query_as::<_, QuestionAnswer>(
        "SELECT * FROM question_answers WHERE review_id = $1 ORDER BY position",
    )
    .bind(review.id)
    .fetch_all(pool)
    .await?;

    Ok(ReviewDetail {
        review,
        form_title,
        answers,
    })
}

pub async fn set_review_status(pool: &DbPool, review_id: Uuid, status: ReviewStatus) -> Result<Review, AppError> {
    let review = sqlx::query_as::<_, Review>(
        "UPDATE reviews SET status = $2 WHERE id = $1 RETURNING *",
    )
    .bind(review_id)
    .bind(status)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Review"))?;

    tracing::info!(%review_id, ?status, "Review status changed");
    Ok(review)
}

/// Delete a review and its answers.
pub async fn delete_review(pool: &DbPool, review_id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(review_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Review"));
    }

    tracing::info!(%review_id, "Review deleted");
    Ok(())
}

#[derive(sqlx::FromRow)]
struct ReviewTotals {
    total_reviews: i64,
    reviews_last_30_days: i64,
    average_rating: Option<f64>,
    new_reviews: i64,
    read_reviews: i64,
    archived_reviews: i64,
}

/// Dashboard numbers for one hotel.
pub async fn hotel_stats(pool: &DbPool, hotel_id: Uuid) -> Result<HotelStats, AppError> {
    let since = Utc::now() - Duration::days(30);

    let totals = sqlx::query_as::<_, ReviewTotals>(
        r#"
        SELECT
            COUNT(*) AS total_reviews,
            COUNT(*) FILTER (WHERE created_at >= $2) AS reviews_last_30_days,
            ROUND(AVG(rating)::numeric, 1)::float8 AS average_rating,
            COUNT(*) FILTER (WHERE status = 'new') AS new_reviews,
            COUNT(*) FILTER (WHERE status = 'read') AS read_reviews,
            COUNT(*) FILTER (WHERE status = 'archived') AS archived_reviews
        FROM reviews
        WHERE hotel_id = $1
        "#,
    )
    .bind(hotel_id)
    .bind(since)
    .fetch_one(pool)
    .await?;

    let distribution: Vec<(i32, i64)> = sqlx::query_as(
        r#"
        SELECT ROUND(rating::numeric)::int4 AS star, COUNT(*)
        FROM reviews
        WHERE hotel_id = $1 AND rating IS NOT NULL
        GROUP BY star
        "#,
    )
    .bind(hotel_id)
    .fetch_all(pool)
    .await?;

    let active_forms: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM feedback_forms WHERE hotel_id = $1 AND is_active = true AND deleted_at IS NULL",
    )
    .bind(hotel_id)
    .fetch_one(pool)
    .await?;

    let qr_scans: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(scan_count), 0)::int8 FROM qr_codes WHERE hotel_id = $1",
    )
    .bind(hotel_id)
    .fetch_one(pool)
    .await?;

    let latest_reviews = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE hotel_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(hotel_id)
    .bind(LATEST_REVIEWS)
    .fetch_all(pool)
    .await?;

    Ok(HotelStats {
        total_reviews: totals.total_reviews,
        reviews_last_30_days: totals.reviews_last_30_days,
        average_rating: totals.average_rating,
        rating_distribution: rating_distribution(&distribution),
        new_reviews: totals.new_reviews,
        read_reviews: totals.read_reviews,
        archived_reviews: totals.archived_reviews,
        active_forms,
        qr_scans,
        latest_reviews,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::test_config,
        db::fixtures,
        models::{form::FormWithQuestions, notification::Notification, review::AnswerInput},
        services::mail::testing::RecordingMailer,
    };
    use serde_json::json;
    use sqlx::PgPool;

    fn rated(form: &FormWithQuestions, room: i64, breakfast: i64) -> SubmitReviewRequest {
        SubmitReviewRequest {
            answers: vec![
                AnswerInput {
                    question_id: form.questions[0].id,
                    value: json!(room),
                },
                AnswerInput {
                    question_id: form.questions[1].id,
                    value: json!(breakfast),
                },
            ],
            ..Default::default()
        }
    }

    async fn review_notifications(pool: &DbPool, hotel_id: Uuid) -> Vec<Notification> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE hotel_id = $1 AND kind = 'review'",
        )
        .bind(hotel_id)
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn qr_code_must_belong_to_the_form(pool: PgPool) {
        let config = test_config();
        let mailer = RecordingMailer::default();
        let hotel = fixtures::onboard(&pool, "Seaside Inn").await;
        let survey = fixtures::rating_form(&pool, hotel.hotel.id).await;
        let other = fixtures::rating_form(&pool, hotel.hotel.id).await;
        let lobby = qr_service::create_qr_code(&pool, hotel.hotel.id, other.form.id, "Lobby")
            .await
            .unwrap();

        let foreign = SubmitReviewRequest {
            qr_code_id: Some(lobby.id),
            ..rated(&survey, 4, 4)
        };
        let result = submit_review(&pool, &config, &mailer, survey.form.id, foreign).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));

        let unknown = SubmitReviewRequest {
            qr_code_id: Some(Uuid::new_v4()),
            ..rated(&survey, 4, 4)
        };
        let result = submit_review(&pool, &config, &mailer, survey.form.id, unknown).await;
        assert!(matches!(result, Err(AppError::NotFound("QR code"))));

        let own = SubmitReviewRequest {
            qr_code_id: Some(lobby.id),
            ..rated(&other, 4, 4)
        };
        let review = submit_review(&pool, &config, &mailer, other.form.id, own).await.unwrap();
        assert_eq!(review.qr_code_id, Some(lobby.id));
    }

    #[sqlx::test]
    async fn submission_emails_admins_and_records_notification(pool: PgPool) {
        let mailer = RecordingMailer::default();
        let hotel = fixtures::onboard(&pool, "Seaside Inn").await;
        let survey = fixtures::rating_form(&pool, hotel.hotel.id).await;

        let review = submit_review(&pool, &test_config(), &mailer, survey.form.id, rated(&survey, 4, 5))
            .await
            .unwrap();

        assert_eq!(review.rating, Some(4.5));
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "admin@seaside-inn.test");
        assert_eq!(sent[0].subject, "New review for Seaside Inn (4.5/5)");

        let notifications = review_notifications(&pool, hotel.hotel.id).await;
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].emailed);
    }

    #[sqlx::test]
    async fn mailer_failure_does_not_fail_submission(pool: PgPool) {
        let mailer = RecordingMailer {
            failing: vec!["admin@seaside-inn.test".to_string()],
            ..Default::default()
        };
        let hotel = fixtures::onboard(&pool, "Seaside Inn").await;
        let survey = fixtures::rating_form(&pool, hotel.hotel.id).await;

        let review = submit_review(&pool, &test_config(), &mailer, survey.form.id, rated(&survey, 3, 3))
            .await
            .unwrap();

        assert_eq!(review.rating, Some(3.0));
        assert!(mailer.sent().is_empty());
        let notifications = review_notifications(&pool, hotel.hotel.id).await;
        assert_eq!(notifications.len(), 1);
        assert!(!notifications[0].emailed);
    }

    #[sqlx::test]
    async fn half_star_means_round_up_in_distribution(pool: PgPool) {
        let config = test_config();
        let mailer = RecordingMailer::default();
        let hotel = fixtures::onboard(&pool, "Seaside Inn").await;
        let survey = fixtures::rating_form(&pool, hotel.hotel.id).await;

        for (room, breakfast) in [(4, 5), (2, 3)] {
            submit_review(&pool, &config, &mailer, survey.form.id, rated(&survey, room, breakfast))
                .await
                .unwrap();
        }

        let stats = hotel_stats(&pool, hotel.hotel.id).await.unwrap();
        assert_eq!(stats.total_reviews, 2);
        assert_eq!(stats.average_rating, Some(3.5));
        assert_eq!(stats.rating_distribution, [0, 0, 1, 0, 1]);
    }
}
