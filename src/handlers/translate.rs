//! Translation endpoints. Public, used by the guest form front-end.
//!
//! - POST /api/translate
//! - POST /api/translate/batch

use crate::{
    error::AppError,
    models::translation::{
        BatchTranslateRequest, BatchTranslateResponse, TranslateRequest, TranslateResponse,
    },
    state::AppState,
    validation::{validate_language, validate_request},
};
use axum::{Json, extract::State};

const MAX_TEXT_CHARS: usize = 5000;

/// Translate one text.
///
/// # Request Body
///
/// ```json
/// { "text": "How was your stay?", "source": "en", "target": "fr" }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `{ "translated": "...", "source": "en", "target": "fr" }`
/// - **Error (400)**: Text over 5000 characters or bad language code
/// - **Error (502)**: Translation provider failed
pub async fn translate(
    State(state): State<AppState>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, AppError> {
    validate_request(&request)?;
    validate_language(&request.source)?;
    validate_language(&request.target)?;

    let translated = state
        .translator
        .translate(&request.text, &request.source, &request.target)
        .await?;

    Ok(Json(TranslateResponse {
        translated,
        source: request.source,
        target: request.target,
    }))
}

/// Translate several texts with the same language pair. Fails as a whole
/// when any text cannot be translated.
pub async fn translate_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchTranslateRequest>,
) -> Result<Json<BatchTranslateResponse>, AppError> {
    validate_request(&request)?;
    validate_language(&request.source)?;
    validate_language(&request.target)?;

    if request.texts.iter().any(|t| t.chars().count() > MAX_TEXT_CHARS) {
        return Err(AppError::InvalidRequest(format!(
            "Each text must be at most {MAX_TEXT_CHARS} characters"
        )));
    }

    let mut translations = Vec::with_capacity(request.texts.len());
    for text in &request.texts {
        translations.push(
            state
                .translator
                .translate(text, &request.source, &request.target)
                .await?,
        );
    }

    Ok(Json(BatchTranslateResponse {
        translations,
        source: request.source,
        target: request.target,
    }))
}
