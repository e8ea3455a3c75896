//! Feedback form and question models.
//!
//! A form is an ordered list of questions. Questions are replaced wholesale
//! when a form is edited; answers keep a snapshot of the question text so
//! old reviews stay readable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 1 to 5 stars; the only type that feeds the review rating
    Rating,
    Text,
    SingleChoice,
    MultipleChoice,
    YesNo,
}

impl QuestionType {
    pub fn has_options(self) -> bool {
        matches!(self, QuestionType::SingleChoice | QuestionType::MultipleChoice)
    }
}

/// Represents a feedback form record from the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct FeedbackForm {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Soft delete marker
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Represents a form question record from the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct FormQuestion {
    pub id: Uuid,
    pub form_id: Uuid,
    pub position: i32,
    pub text: String,
    pub question_type: QuestionType,
    pub options: SqlJson<Vec<String>>,
    pub required: bool,
}

/// Form with its questions in display order.
#[derive(Debug, Clone, Serialize)]
pub struct FormWithQuestions {
    #[serde(flatten)]
    pub form: FeedbackForm,
    pub questions: Vec<FormQuestion>,
}

/// Form list entry with response counters.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct FormSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub form: FeedbackForm,
    pub question_count: i64,
    pub review_count: i64,
}

/// One question in a create/update request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuestionInput {
    #[validate(length(min = 1, max = 500, message = "Question text must be 1-500 characters"))]
    pub text: String,

    pub question_type: QuestionType,

    #[serde(default)]
    pub options: Vec<String>,

    #[serde(default)]
    pub required: bool,
}

impl QuestionInput {
    /// Check the options against the question type and normalize them
    /// (trimmed, non-empty, distinct).
    pub fn normalized(mut self) -> Result<Self, AppError> {
        self.text = self.text.trim().to_string();
        if self.text.is_empty() {
            return Err(AppError::InvalidRequest(
                "Question text must not be blank".to_string(),
            ));
        }

        if !self.question_type.has_options() {
            if !self.options.is_empty() {
                return Err(AppError::InvalidRequest(format!(
                    "Question '{}' does not take options",
                    self.text
                )));
            }
            return Ok(self);
        }

        let mut options: Vec<String> = Vec::with_capacity(self.options.len());
        for option in self.options.iter().map(|o| o.trim()) {
            if option.is_empty() {
                return Err(AppError::InvalidRequest(format!(
                    "Question '{}' has a blank option",
                    self.text
                )));
            }
            if options.iter().any(|existing| existing == option) {
                return Err(AppError::InvalidRequest(format!(
                    "Question '{}' has duplicate option '{option}'",
                    self.text
                )));
            }
            options.push(option.to_string());
        }

        if options.len() < 2 {
            return Err(AppError::InvalidRequest(format!(
                "Question '{}' needs at least two options",
                self.text
            )));
        }

        self.options = options;
        Ok(self)
    }
}

/// Request body for creating a form.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFormRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[validate(
        length(min = 1, max = 50, message = "A form needs 1-50 questions"),
        nested
    )]
    pub questions: Vec<QuestionInput>,
}

/// Request body for updating a form. Questions, when given, replace the
/// existing list.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFormRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(
        length(min = 1, max = 50, message = "A form needs 1-50 questions"),
        nested
    )]
    pub questions: Option<Vec<QuestionInput>>,
}

/// Request body for `PATCH /api/forms/{id}/active`.
#[derive(Debug, Deserialize)]
pub struct SetFormActiveRequest {
    pub is_active: bool,
}

/// Query parameters for the public form endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct PublicFormQuery {
    /// Guest language; triggers translation when it differs from the hotel's
    pub lang: Option<String>,
}

/// Form as served to guests.
#[derive(Debug, Clone, Serialize)]
pub struct PublicForm {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub hotel_name: String,
    pub hotel_logo_url: Option<String>,
    pub language: String,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub position: i32,
    pub text: String,
    pub question_type: QuestionType,

    /// Canonical option values submitted back with answers
    pub options: Vec<String>,

    /// Option labels in the guest language, same order as `options`
    pub option_labels: Vec<String>,

    pub required: bool,
}

impl From<FormQuestion> for PublicQuestion {
    fn from(question: FormQuestion) -> Self {
        let options = question.options.0;
        Self {
            id: question.id,
            position: question.position,
            text: question.text,
            question_type: question.question_type,
            option_labels: options.clone(),
            options,
            required: question.required,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(question_type: QuestionType, options: &[&str]) -> QuestionInput {
        QuestionInput {
            text: " How was your stay? ".into(),
            question_type,
            options: options.iter().map(|o| o.to_string()).collect(),
            required: true,
        }
    }

    #[test]
    fn choice_options_are_trimmed() {
        let q = question(QuestionType::SingleChoice, &[" Good ", "Bad"])
            .normalized()
            .unwrap();
        assert_eq!(q.text, "How was your stay?");
        assert_eq!(q.options, vec!["Good", "Bad"]);
    }

    #[test]
    fn choice_needs_two_distinct_options() {
        assert!(question(QuestionType::MultipleChoice, &["Only"]).normalized().is_err());
        assert!(question(QuestionType::SingleChoice, &["A", " A"]).normalized().is_err());
        assert!(question(QuestionType::SingleChoice, &["A", " "]).normalized().is_err());
    }

    #[test]
    fn non_choice_rejects_options() {
        assert!(question(QuestionType::Rating, &["1"]).normalized().is_err());
        assert!(question(QuestionType::YesNo, &[]).normalized().is_ok());
    }

    #[test]
    fn create_request_validates_nested_questions() {
        let request: CreateFormRequest = serde_json::from_value(serde_json::json!({
            "title": "Stay survey",
            "questions": [{ "text": "", "question_type": "rating" }]
        }))
        .unwrap();
        assert!(request.is_active);
        assert!(request.validate().is_err());
    }
}
