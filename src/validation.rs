//! Input validation helpers shared by the handlers.

use validator::Validate;

use crate::error::AppError;

/// Validate a request body, returning `AppError::InvalidRequest` on failure.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate()
        .map_err(|e| AppError::InvalidRequest(format_validation_errors(&e)))
}

/// Flatten validator errors into one human-readable string.
fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for '{field}'"))
            })
        })
        .collect();

    if messages.is_empty() {
        // Only nested (list/struct) errors
        messages.push("Invalid request body".to_string());
    }

    messages.sort();
    messages.join("; ")
}

/// Validate a language code such as `en`, `fr` or `pt-BR`.
pub fn validate_language(code: &str) -> Result<(), AppError> {
    let valid = (2..=10).contains(&code.len())
        && code.chars().all(|c| c.is_ascii_alphabetic() || c == '-');

    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidRequest(format!(
            "Invalid language code '{code}'"
        )))
    }
}

/// Trim an optional string, turning blank values into `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
