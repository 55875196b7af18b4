//! # Error Handling
//!
//! This module defines the request-level error type and how each variant is
//! converted to an HTTP response.
//!
//! ## Key Rust Concepts for Error Handling:
//!
//! ### Enums for Error Types
//! - **Variants**: Each variant is one failure category the API reports
//! - **Data**: Each variant holds the human-readable message
//! - **Pattern matching**: `match` maps every variant to a status code
//!
//! ### Traits for Error Conversion
//! - **From trait**: `?` converts provider and I/O errors automatically
//! - **ResponseError trait**: actix-web calls it to render the JSON body
//! - **Display trait**: Defines how errors are formatted as strings
//!
//! ## Response body
//! Every error is rendered with the same shape so clients can branch on `code`:
//! ```json
//! { "success": false, "error": "Unsupported target language: xx", "code": "unsupported_language" }
//! ```

use crate::providers::ProviderError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Custom error types for the application.
///
/// ## Error Categories:
/// - **ValidationError**: Bad upload or form input (400)
/// - **UnsupportedLanguage**: `targetLanguage` is not in the catalog (400)
/// - **NoSpeechDetected**: The recognizer returned no usable segments (400)
/// - **Provider**: A speech or detection call failed (500)
/// - **Translation**: The translate call failed; fatal unlike detection (500)
/// - **NotFound**: Unknown route (404)
/// - **Internal**: Server-side problems such as upload I/O failures (500)
#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    UnsupportedLanguage(String),
    NoSpeechDetected,
    Provider(String),
    Translation(String),
    NotFound(String),
    Internal(String),
}

impl AppError {
    /// Machine-readable code placed in the `code` field of the error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::UnsupportedLanguage(_) => "unsupported_language",
            AppError::NoSpeechDetected => "no_speech_detected",
            AppError::Provider(_) => "provider_error",
            AppError::Translation(_) => "translation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(msg) => write!(f, "{}", msg),
            AppError::UnsupportedLanguage(lang) => {
                write!(f, "Unsupported target language: {}", lang)
            }
            AppError::NoSpeechDetected => write!(f, "No speech detected in the audio"),
            AppError::Provider(msg) => write!(f, "Speech service error: {}", msg),
            AppError::Translation(msg) => write!(f, "Translation failed: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

/// ## HTTP Status Code Mapping:
/// - ValidationError/UnsupportedLanguage/NoSpeechDetected → 400
/// - NotFound → 404
/// - Provider/Translation/Internal → 500
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::UnsupportedLanguage(_)
            | AppError::NoSpeechDetected => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Provider(_)
            | AppError::Translation(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.to_string(),
            "code": self.code(),
        }))
    }
}

/// Provider failures surface as `Provider`. The translate path converts
/// explicitly to `Translation` instead of relying on this impl.
impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Provider(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("I/O error: {}", err))
    }
}

/// Shorthand for `Result<T, AppError>`.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::UnsupportedLanguage("xx".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NoSpeechDetected.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Provider("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Translation("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::NotFound("/x".into()).status_code(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_error_body_shape() {
        let response = AppError::UnsupportedLanguage("xx-unknown".into()).error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["code"], "unsupported_language");
        assert_eq!(value["error"], "Unsupported target language: xx-unknown");
    }

    #[test]
    fn test_provider_error_conversion() {
        let err: AppError = ProviderError::InvalidResponse("missing data".into()).into();
        assert!(matches!(err, AppError::Provider(_)));
        assert_eq!(err.code(), "provider_error");
    }
}
