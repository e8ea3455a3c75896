//! Feedback form service - form and question management, public form view.

use chrono::Utc;
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        form::{
            CreateFormRequest, FeedbackForm, FormQuestion, FormSummary, FormWithQuestions,
            PublicForm, PublicQuestion, QuestionInput, UpdateFormRequest,
        },
        hotel::HotelStatus,
    },
    services::{hotel_service, subscription_service, translation_service::TranslationService},
    validation::normalize_optional,
};

/// Normalize every question, failing on the first invalid one.
fn normalize_questions(questions: Vec<QuestionInput>) -> Result<Vec<QuestionInput>, AppError> {
    questions.into_iter().map(QuestionInput::normalized).collect()
}

/// Insert questions in order, positions starting at 1.
async fn insert_questions(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    form_id: Uuid,
    questions: &[QuestionInput],
) -> Result<Vec<FormQuestion>, AppError> {
    let mut inserted = Vec::with_capacity(questions.len());

    for (index, question) in questions.iter().enumerate() {
        let row = sqlx::query_as::<_, FormQuestion>(
            r#"
            INSERT INTO form_questions (form_id, position, text, question_type, options, required)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(form_id)
        .bind(index as i32 + 1)
        .bind(&question.text)
        .bind(question.question_type)
        .bind(SqlJson(&question.options))
        .bind(question.required)
        .fetch_one(&mut **tx)
        .await?;

        inserted.push(row);
    }

    Ok(inserted)
}

/// Create a form with its questions in one transaction.
pub async fn create_form(
    pool: &DbPool,
    hotel_id: Uuid,
    request: CreateFormRequest,
) -> Result<FormWithQuestions, AppError> {
    let questions = normalize_questions(request.questions)?;

    let mut tx = pool.begin().await?;

    let form = sqlx::query_as::<_, FeedbackForm>(
        r#"
        INSERT INTO feedback_forms (hotel_id, title, description, is_active)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(hotel_id)
    .bind(request.title.trim())
    .bind(normalize_optional(request.description))
    .bind(request.is_active)
    .fetch_one(&mut *tx)
    .await?;

    let questions = insert_questions(&mut tx, form.id, &questions).await?;

    tx.commit().await?;

    tracing::info!(form_id = %form.id, %hotel_id, questions = questions.len(), "Form created");

    Ok(FormWithQuestions { form, questions })
}

/// List a hotel's forms (not deleted), newest first, with counters.
pub async fn list_forms(pool: &DbPool, hotel_id: Uuid) -> Result<Vec<FormSummary>, AppError> {
    let forms = sqlx::query_as::<_, FormSummary>(
        r#"
        SELECT f.*,
               (SELECT COUNT(*) FROM form_questions q WHERE q.form_id = f.id) AS question_count,
               (SELECT COUNT(*) FROM reviews r WHERE r.form_id = f.id) AS review_count
        FROM feedback_forms f
        WHERE f.hotel_id = $1 AND f.deleted_at IS NULL
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(hotel_id)
    .fetch_all(pool)
    .await?;

    Ok(forms)
}

/// Fetch a non-deleted form by id.
pub async fn find_form(pool: &DbPool, form_id: Uuid) -> Result<FeedbackForm, AppError> {
    sqlx::query_as::<_, FeedbackForm>(
        "SELECT * FROM feedback_forms WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(form_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Form"))
}

/// Fetch a form owned by `hotel_id`.
pub async fn get_form(pool: &DbPool, form_id: Uuid, hotel_id: Uuid) -> Result<FeedbackForm, AppError> {
    let form = find_form(pool, form_id).await?;
    if form.hotel_id != hotel_id {
        return Err(AppError::NotFound("Form"));
    }
    Ok(form)
}

pub async fn list_questions(pool: &DbPool, form_id: Uuid) -> Result<Vec<FormQuestion>, AppError> {
    let questions = sqlx::query_as::<_, FormQuestion>(
        "SELECT * FROM form_questions WHERE form_id = $1 ORDER BY position",
    )
    .bind(form_id)
    .fetch_all(pool)
    .await?;

    Ok(questions)
}

pub async fn get_form_with_questions(pool: &DbPool, form_id: Uuid) -> Result<FormWithQuestions, AppError> {
    let form = find_form(pool, form_id).await?;
    let questions = list_questions(pool, form.id).await?;
    Ok(FormWithQuestions { form, questions })
}

/// Update title/description and, when given, replace the questions.
pub async fn update_form(
    pool: &DbPool,
    form_id: Uuid,
    request: UpdateFormRequest,
) -> Result<FormWithQuestions, AppError> {
    let questions = request.questions.map(normalize_questions).transpose()?;

    let mut tx = pool.begin().await?;

    let form = sqlx::query_as::<_, FeedbackForm>(
        r#"
        UPDATE feedback_forms
        SET title = COALESCE($2, title),
            description = CASE WHEN $3::boolean THEN $4 ELSE description END,
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(form_id)
    .bind(request.title.as_deref().map(str::trim))
    .bind(request.description.is_some())
    .bind(normalize_optional(request.description))
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Form"))?;

    let questions = match questions {
        Some(questions) => {
            // Stored answers keep their own copy of the question text
            sqlx::query("DELETE FROM form_questions WHERE form_id = $1")
                .bind(form_id)
                .execute(&mut *tx)
                .await?;
            insert_questions(&mut tx, form_id, &questions).await?
        }
        None => {
            sqlx::query_as::<_, FormQuestion>(
                "SELECT * FROM form_questions WHERE form_id = $1 ORDER BY position",
            )
            .bind(form_id)
            .fetch_all(&mut *tx)
            .await?
        }
    };

    tx.commit().await?;

    tracing::info!(%form_id, "Form updated");
    Ok(FormWithQuestions { form, questions })
}

pub async fn set_form_active(pool: &DbPool, form_id: Uuid, is_active: bool) -> Result<FeedbackForm, AppError> {
    sqlx::query_as::<_, FeedbackForm>(
        r#"
        UPDATE feedback_forms
        SET is_active = $2, updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(form_id)
    .bind(is_active)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Form"))
}

/// Soft delete: the form disappears from lists and the public endpoint but
/// its reviews are kept.
pub async fn delete_form(pool: &DbPool, form_id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE feedback_forms
        SET deleted_at = NOW(), is_active = false, updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(form_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Form"));
    }

    tracing::info!(%form_id, "Form deleted");
    Ok(())
}

/// Load a form guests may answer: active, not deleted, hotel active and
/// subscription usable. Anything else reads as not found.
pub async fn load_answerable_form(pool: &DbPool, form_id: Uuid) -> Result<AnswerableForm, AppError> {
    let form = find_form(pool, form_id).await?;
    if !form.is_active {
        return Err(AppError::NotFound("Form"));
    }

    let hotel = hotel_service::find_hotel(pool, form.hotel_id).await?;
    if hotel.status != HotelStatus::Active {
        return Err(AppError::NotFound("Form"));
    }

    let usable = subscription_service::find_subscription(pool, hotel.id)
        .await?
        .is_some_and(|s| s.is_usable(Utc::now()));
    if !usable {
        tracing::debug!(%form_id, hotel_id = %hotel.id, "Form hidden, subscription not usable");
        return Err(AppError::NotFound("Form"));
    }

    let questions = list_questions(pool, form.id).await?;

    Ok(AnswerableForm {
        form,
        hotel,
        questions,
    })
}

/// A form guests may answer, with its hotel and questions.
#[derive(Debug, Clone)]
pub struct AnswerableForm {
    pub form: FeedbackForm,
    pub hotel: crate::models::hotel::Hotel,
    pub questions: Vec<FormQuestion>,
}

/// Build the guest-facing form, translated into `lang` when it differs from
/// the hotel's default language.
pub async fn public_form(
    answerable: AnswerableForm,
    lang: Option<&str>,
    translator: &TranslationService,
) -> PublicForm {
    let AnswerableForm {
        form,
        hotel,
        questions,
    } = answerable;

    let source = hotel.default_language.clone();
    let target = lang.unwrap_or(&source).to_string();

    let mut public = PublicForm {
        id: form.id,
        hotel_id: hotel.id,
        hotel_name: hotel.name,
        hotel_logo_url: hotel.logo_url,
        language: source.clone(),
        title: form.title,
        description: form.description,
        questions: questions.into_iter().map(PublicQuestion::from).collect(),
    };

    if crate::services::translation_service::same_language(&source, &target) {
        return public;
    }

    public.language = target.clone();
    public.title = translator.translate_or_original(&public.title, &source, &target).await;
    if let Some(description) = public.description.take() {
        public.description =
            Some(translator.translate_or_original(&description, &source, &target).await);
    }

    for question in &mut public.questions {
        question.text = translator.translate_or_original(&question.text, &source, &target).await;
        let mut labels = Vec::with_capacity(question.options.len());
        for option in &question.options {
            labels.push(translator.translate_or_original(option, &source, &target).await);
        }
        question.option_labels = labels;
    }

    public
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            form::QuestionType,
            hotel::{Hotel, HotelStatus},
        },
        db::fixtures,
        services::translation_service::testing::FakeProvider,
    };
    use sqlx::PgPool;
    use std::sync::Arc;

    fn answerable() -> AnswerableForm {
        let now = Utc::now();
        let hotel_id = Uuid::new_v4();
        let form_id = Uuid::new_v4();
        AnswerableForm {
            form: FeedbackForm {
                id: form_id,
                hotel_id,
                title: "Your stay".into(),
                description: Some("Tell us more".into()),
                is_active: true,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            },
            hotel: Hotel {
                id: hotel_id,
                name: "Seaside Inn".into(),
                slug: "seaside-inn".into(),
                email: "desk@seaside.test".into(),
                phone: None,
                address: None,
                city: None,
                country: None,
                website: None,
                logo_url: None,
                default_language: "en".into(),
                status: HotelStatus::Active,
                created_at: now,
                updated_at: now,
            },
            questions: vec![FormQuestion {
                id: Uuid::new_v4(),
                form_id,
                position: 1,
                text: "Favourite spot".into(),
                question_type: QuestionType::SingleChoice,
                options: SqlJson(vec!["Pool".into(), "Bar".into()]),
                required: false,
            }],
        }
    }

    #[tokio::test]
    async fn default_language_is_served_untranslated() {
        let provider = Arc::new(FakeProvider::default());
        let translator = TranslationService::new(provider.clone());

        let form = public_form(answerable(), Some("en-US"), &translator).await;

        assert_eq!(form.title, "Your stay");
        assert_eq!(form.language, "en");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn other_language_translates_text_but_keeps_option_values() {
        let translator = TranslationService::new(Arc::new(FakeProvider::default()));

        let form = public_form(answerable(), Some("fr"), &translator).await;

        assert_eq!(form.language, "fr");
        assert_eq!(form.title, "[fr] YOUR STAY");
        assert_eq!(form.description.as_deref(), Some("[fr] TELL US MORE"));
        let question = &form.questions[0];
        assert_eq!(question.text, "[fr] FAVOURITE SPOT");
        assert_eq!(question.options, vec!["Pool", "Bar"]);
        assert_eq!(question.option_labels, vec!["[fr] POOL", "[fr] BAR"]);
    }

    #[tokio::test]
    async fn translation_failure_falls_back_to_original() {
        let translator = TranslationService::new(Arc::new(FakeProvider {
            fail: true,
            ..Default::default()
        }));

        let form = public_form(answerable(), Some("de"), &translator).await;

        assert_eq!(form.title, "Your stay");
        assert_eq!(form.questions[0].option_labels, vec!["Pool", "Bar"]);
    }

    #[sqlx::test]
    async fn form_is_hidden_without_usable_subscription(pool: PgPool) {
        let hotel = fixtures::onboard(&pool, "Seaside Inn").await;
        let survey = fixtures::rating_form(&pool, hotel.hotel.id).await;
        assert!(load_answerable_form(&pool, survey.form.id).await.is_ok());

        // Trial ran out yesterday; the stored status still says trialing
        sqlx::query(
            "UPDATE subscriptions SET starts_at = NOW() - INTERVAL '15 days', ends_at = NOW() - INTERVAL '1 day' WHERE hotel_id = $1",
        )
        .bind(hotel.hotel.id)
        .execute(&pool)
        .await
        .unwrap();
        assert!(matches!(
            load_answerable_form(&pool, survey.form.id).await,
            Err(AppError::NotFound("Form"))
        ));

        sqlx::query("DELETE FROM subscriptions WHERE hotel_id = $1")
            .bind(hotel.hotel.id)
            .execute(&pool)
            .await
            .unwrap();
        assert!(matches!(
            load_answerable_form(&pool, survey.form.id).await,
            Err(AppError::NotFound("Form"))
        ));
    }

    #[sqlx::test]
    async fn form_is_hidden_while_hotel_is_suspended(pool: PgPool) {
        let hotel = fixtures::onboard(&pool, "Seaside Inn").await;
        let survey = fixtures::rating_form(&pool, hotel.hotel.id).await;

        hotel_service::set_hotel_status(&pool, hotel.hotel.id, HotelStatus::Suspended)
            .await
            .unwrap();

        assert!(matches!(
            load_answerable_form(&pool, survey.form.id).await,
            Err(AppError::NotFound("Form"))
        ));
    }
}
