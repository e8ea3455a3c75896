//! Translation endpoint request/response types.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request body for `POST /api/translate`.
#[derive(Debug, Deserialize, Validate)]
pub struct TranslateRequest {
    #[validate(length(max = 5000, message = "Text must be at most 5000 characters"))]
    pub text: String,

    #[validate(length(min = 2, max = 10, message = "Source language must be 2-10 characters"))]
    pub source: String,

    #[validate(length(min = 2, max = 10, message = "Target language must be 2-10 characters"))]
    pub target: String,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translated: String,
    pub source: String,
    pub target: String,
}

/// Request body for `POST /api/translate/batch`.
#[derive(Debug, Deserialize, Validate)]
pub struct BatchTranslateRequest {
    #[validate(length(min = 1, max = 100, message = "Send 1-100 texts per batch"))]
    pub texts: Vec<String>,

    #[validate(length(min = 2, max = 10, message = "Source language must be 2-10 characters"))]
    pub source: String,

    #[validate(length(min = 2, max = 10, message = "Target language must be 2-10 characters"))]
    pub target: String,
}

/// Translations in request order.
#[derive(Debug, Serialize)]
pub struct BatchTranslateResponse {
    pub translations: Vec<String>,
    pub source: String,
    pub target: String,
}
