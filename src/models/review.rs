//! Review (guest response) models, answer validation and rating computation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json as SqlJson;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::form::{FormQuestion, QuestionType},
};

/// Longest accepted free-text answer.
pub const MAX_TEXT_ANSWER: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "review_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    New,
    Read,
    Archived,
}

/// Represents a review record from the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Review {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub form_id: Uuid,
    pub qr_code_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub room_number: Option<String>,
    pub comment: Option<String>,

    /// Mean of the rating answers, one decimal; `None` when the form has no
    /// rating question answered
    pub rating: Option<f64>,

    pub language: Option<String>,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

/// Represents a stored answer. Question text and type are snapshots taken
/// at submission time.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct QuestionAnswer {
    pub id: Uuid,
    pub review_id: Uuid,
    pub question_id: Option<Uuid>,
    pub question_text: String,
    pub question_type: QuestionType,
    pub position: i32,
    pub value: SqlJson<Value>,
}

/// Review with its answers in question order.
#[derive(Debug, Serialize)]
pub struct ReviewDetail {
    #[serde(flatten)]
    pub review: Review,
    pub form_title: String,
    pub answers: Vec<QuestionAnswer>,
}

/// One answer in a guest submission.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub question_id: Uuid,
    pub value: Value,
}

/// Request body for `POST /api/public/forms/{id}/reviews`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SubmitReviewRequest {
    #[validate(length(max = 200, message = "Name must be at most 200 characters"))]
    pub guest_name: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub guest_email: Option<String>,

    #[validate(length(max = 20, message = "Room number must be at most 20 characters"))]
    pub room_number: Option<String>,

    #[validate(length(max = 5000, message = "Comment must be at most 5000 characters"))]
    pub comment: Option<String>,

    pub language: Option<String>,

    /// QR code the guest scanned, if any
    pub qr_code_id: Option<Uuid>,

    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}

/// Answer that passed validation, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAnswer {
    pub question_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub position: i32,
    pub value: Value,
}

/// Request body for `PATCH /api/reviews/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateReviewStatusRequest {
    pub status: ReviewStatus,
}

/// Query parameters for listing reviews.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewListQuery {
    pub status: Option<ReviewStatus>,
    pub form_id: Option<Uuid>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Check a submission's answers against the form's questions.
///
/// Returns the answers in question order. Rules:
/// - every answer references a question of the form, at most once
/// - every required question is answered
/// - rating: integer 1..=5
/// - text: string of at most [`MAX_TEXT_ANSWER`] chars (blank counts as unanswered)
/// - yes_no: boolean
/// - single_choice: one of the options
/// - multiple_choice: non-empty array of distinct options
pub fn validate_answers(
    questions: &[FormQuestion],
    answers: &[AnswerInput],
) -> Result<Vec<ValidatedAnswer>, AppError> {
    let mut seen = HashSet::with_capacity(answers.len());
    let mut validated = Vec::with_capacity(answers.len());

    for answer in answers {
        let question = questions
            .iter()
            .find(|q| q.id == answer.question_id)
            .ok_or_else(|| {
                AppError::InvalidRequest(format!(
                    "Question {} does not belong to this form",
                    answer.question_id
                ))
            })?;

        if !seen.insert(question.id) {
            return Err(AppError::InvalidRequest(format!(
                "Question '{}' answered more than once",
                question.text
            )));
        }

        if let Some(value) = check_answer_value(question, &answer.value)? {
            validated.push(ValidatedAnswer {
                question_id: question.id,
                question_text: question.text.clone(),
                question_type: question.question_type,
                position: question.position,
                value,
            });
        }
    }

    if let Some(missing) = questions
        .iter()
        .find(|q| q.required && !validated.iter().any(|a| a.question_id == q.id))
    {
        return Err(AppError::InvalidRequest(format!(
            "Question '{}' is required",
            missing.text
        )));
    }

    validated.sort_by_key(|a| a.position);
    Ok(validated)
}

/// Validate a single value; `Ok(None)` means the answer is empty.
fn check_answer_value(question: &FormQuestion, value: &Value) -> Result<Option<Value>, AppError> {
    let invalid = |what: &str| {
        AppError::InvalidRequest(format!("Answer to '{}' {what}", question.text))
    };

    if value.is_null() {
        return Ok(None);
    }

    let options = &question.options.0;

    match question.question_type {
        QuestionType::Rating => match value.as_i64() {
            Some(stars @ 1..=5) => Ok(Some(Value::from(stars))),
            _ => Err(invalid("must be a whole number from 1 to 5")),
        },
        QuestionType::Text => {
            let text = value.as_str().ok_or_else(|| invalid("must be text"))?.trim();
            if text.is_empty() {
                Ok(None)
            } else if text.chars().count() > MAX_TEXT_ANSWER {
                Err(invalid("is too long"))
            } else {
                Ok(Some(Value::from(text)))
            }
        }
        QuestionType::YesNo => value
            .as_bool()
            .map(|b| Some(Value::from(b)))
            .ok_or_else(|| invalid("must be true or false")),
        QuestionType::SingleChoice => {
            let choice = value.as_str().ok_or_else(|| invalid("must be one option"))?;
            if options.iter().any(|o| o == choice) {
                Ok(Some(Value::from(choice)))
            } else {
                Err(invalid("is not one of the options"))
            }
        }
        QuestionType::MultipleChoice => {
            let items = value
                .as_array()
                .ok_or_else(|| invalid("must be a list of options"))?;
            if items.is_empty() {
                return Ok(None);
            }

            let mut chosen: Vec<&str> = Vec::with_capacity(items.len());
            for item in items {
                let choice = item.as_str().ok_or_else(|| invalid("must be a list of options"))?;
                if !options.iter().any(|o| o == choice) {
                    return Err(invalid("contains an unknown option"));
                }
                if chosen.contains(&choice) {
                    return Err(invalid("repeats an option"));
                }
                chosen.push(choice);
            }
            Ok(Some(Value::from(chosen)))
        }
    }
}

/// Mean of the rating answers rounded to one decimal.
pub fn compute_rating(answers: &[ValidatedAnswer]) -> Option<f64> {
    let stars: Vec<i64> = answers
        .iter()
        .filter(|a| a.question_type == QuestionType::Rating)
        .filter_map(|a| a.value.as_i64())
        .collect();

    if stars.is_empty() {
        return None;
    }

    let mean = stars.iter().sum::<i64>() as f64 / stars.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn q(position: i32, question_type: QuestionType, required: bool, options: &[&str]) -> FormQuestion {
        FormQuestion {
            id: Uuid::new_v4(),
            form_id: Uuid::nil(),
            position,
            text: format!("Question {position}"),
            question_type,
            options: SqlJson(options.iter().map(|o| o.to_string()).collect()),
            required,
        }
    }

    fn answer(question: &FormQuestion, value: Value) -> AnswerInput {
        AnswerInput {
            question_id: question.id,
            value,
        }
    }

    #[test]
    fn accepts_valid_submission_in_question_order() {
        let rating = q(1, QuestionType::Rating, true, &[]);
        let text = q(2, QuestionType::Text, false, &[]);
        let multi = q(3, QuestionType::MultipleChoice, false, &["Pool", "Spa", "Gym"]);
        let questions = vec![rating.clone(), text.clone(), multi.clone()];

        let answers = vec![
            answer(&multi, json!(["Spa", "Pool"])),
            answer(&text, json!("  lovely  ")),
            answer(&rating, json!(4)),
        ];

        let validated = validate_answers(&questions, &answers).unwrap();
        assert_eq!(validated.len(), 3);
        assert_eq!(validated[0].question_id, rating.id);
        assert_eq!(validated[1].value, json!("lovely"));
        assert_eq!(validated[2].value, json!(["Spa", "Pool"]));
    }

    #[test]
    fn rejects_missing_required_answer() {
        let rating = q(1, QuestionType::Rating, true, &[]);
        let text = q(2, QuestionType::Text, false, &[]);
        let questions = vec![rating, text.clone()];

        let err = validate_answers(&questions, &[answer(&text, json!("hi"))]).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(msg) if msg.contains("required")));
    }

    #[test]
    fn blank_text_does_not_satisfy_required() {
        let text = q(1, QuestionType::Text, true, &[]);
        let questions = vec![text.clone()];
        assert!(validate_answers(&questions, &[answer(&text, json!("   "))]).is_err());
    }

    #[test]
    fn rejects_foreign_and_duplicate_questions() {
        let rating = q(1, QuestionType::Rating, false, &[]);
        let other = q(1, QuestionType::Rating, false, &[]);
        let questions = vec![rating.clone()];

        assert!(validate_answers(&questions, &[answer(&other, json!(3))]).is_err());
        assert!(
            validate_answers(
                &questions,
                &[answer(&rating, json!(3)), answer(&rating, json!(4))]
            )
            .is_err()
        );
    }

    #[test]
    fn rating_bounds() {
        let rating = q(1, QuestionType::Rating, false, &[]);
        let questions = vec![rating.clone()];
        for bad in [json!(0), json!(6), json!(3.5), json!("4")] {
            assert!(validate_answers(&questions, &[answer(&rating, bad)]).is_err());
        }
    }

    #[test]
    fn choice_answers_must_match_options() {
        let single = q(1, QuestionType::SingleChoice, false, &["Yes please", "No thanks"]);
        let multi = q(2, QuestionType::MultipleChoice, false, &["A", "B"]);
        let yes_no = q(3, QuestionType::YesNo, false, &[]);
        let questions = vec![single.clone(), multi.clone(), yes_no.clone()];

        assert!(validate_answers(&questions, &[answer(&single, json!("Maybe"))]).is_err());
        assert!(validate_answers(&questions, &[answer(&multi, json!(["A", "A"]))]).is_err());
        assert!(validate_answers(&questions, &[answer(&yes_no, json!("yes"))]).is_err());
        assert!(validate_answers(&questions, &[answer(&yes_no, json!(false))]).is_ok());
    }

    #[test]
    fn rating_is_rounded_mean_of_rating_answers() {
        let a = q(1, QuestionType::Rating, false, &[]);
        let b = q(2, QuestionType::Rating, false, &[]);
        let c = q(3, QuestionType::Rating, false, &[]);
        let yes_no = q(4, QuestionType::YesNo, false, &[]);
        let questions = vec![a.clone(), b.clone(), c.clone(), yes_no.clone()];

        let validated = validate_answers(
            &questions,
            &[
                answer(&a, json!(5)),
                answer(&b, json!(4)),
                answer(&c, json!(4)),
                answer(&yes_no, json!(true)),
            ],
        )
        .unwrap();
        assert_eq!(compute_rating(&validated), Some(4.3));
    }

    #[test]
    fn no_rating_answers_means_no_rating() {
        let text = q(1, QuestionType::Text, false, &[]);
        let questions = vec![text.clone()];
        let validated = validate_answers(&questions, &[answer(&text, json!("ok"))]).unwrap();
        assert_eq!(compute_rating(&validated), None);
    }
}
