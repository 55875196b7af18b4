//! # External Providers
//!
//! Trait seams for the two third-party services the orchestrator calls:
//! speech recognition and text translation. Production implementations talk
//! to the Google Cloud REST APIs; tests swap in the counters from [`mock`].
//!
//! ## Key Components:
//! - **SpeechRecognizer**: audio bytes (base64) in, ordered transcript segments out
//! - **Translator**: language detection and translation of plain text
//! - **ProviderError**: transport, API and decoding failures shared by both
//!
//! Clients are created once at startup and shared through `AppState` as
//! `Arc<dyn ...>` handles, so every implementation must be `Send + Sync`.

pub mod google_speech;
pub mod google_translate;

#[cfg(test)]
pub mod mock;

pub use google_speech::GoogleSpeechClient;
pub use google_translate::GoogleTranslateClient;

use async_trait::async_trait;
use serde::Serialize;

/// Everything the recognizer needs for one synchronous recognition call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionRequest {
    /// Base64-encoded audio bytes
    pub audio_content: String,
    /// Provider encoding name (`WEBM_OPUS`, `LINEAR16`, ...), if known
    pub encoding: Option<String>,
    pub sample_rate_hertz: Option<u32>,
    /// Primary BCP-47 language hint (e.g. `en-US`)
    pub language_code: String,
    pub alternative_language_codes: Vec<String>,
    pub enable_automatic_punctuation: bool,
}

/// One transcript piece as returned by the provider, in provider order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionSegment {
    pub text: String,
    pub confidence: Option<f32>,
    pub language_code: Option<String>,
}

/// Transcript plus the segments it was assembled from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecognitionResult {
    pub transcript: String,
    pub segments: Vec<RecognitionSegment>,
}

impl RecognitionResult {
    /// Build a result from ordered segments. Blank segments are dropped and
    /// the remaining texts are joined by a single space.
    pub fn from_segments(segments: Vec<RecognitionSegment>) -> Self {
        let segments: Vec<RecognitionSegment> = segments
            .into_iter()
            .map(|mut segment| {
                segment.text = segment.text.trim().to_string();
                segment
            })
            .filter(|segment| !segment.text.is_empty())
            .collect();

        let transcript = segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self { transcript, segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() || self.transcript.trim().is_empty()
    }
}

/// Failures from any provider call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API key is not configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, request: RecognitionRequest) -> Result<RecognitionResult, ProviderError>;

    /// Short backend name used in logs.
    fn name(&self) -> &str;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Returns the detected language code of `text` (e.g. `en`).
    async fn detect(&self, text: &str) -> Result<String, ProviderError>;

    /// Translates `text` into `target` and returns the translated text.
    async fn translate(&self, text: &str, target: &str) -> Result<String, ProviderError>;
}

/// Turn a non-2xx provider response into [`ProviderError::Api`], preferring
/// the `error.message` field Google puts in its error bodies.
pub(crate) async fn api_error(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ProviderError::Api {
        status,
        message: extract_error_message(&body),
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(|message| message.as_str())
                .map(|message| message.to_string())
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str) -> RecognitionSegment {
        RecognitionSegment {
            text: text.to_string(),
            confidence: Some(0.9),
            language_code: None,
        }
    }

    #[test]
    fn test_segments_joined_in_order_with_single_space() {
        let result = RecognitionResult::from_segments(vec![segment("hello"), segment(" world ")]);
        assert_eq!(result.transcript, "hello world");
        assert_eq!(result.segments.len(), 2);
        assert!(!result.is_empty());
    }

    #[test]
    fn test_blank_segments_are_dropped() {
        let result = RecognitionResult::from_segments(vec![segment("  "), segment("")]);
        assert!(result.is_empty());
        assert_eq!(result.transcript, "");
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(extract_error_message(body), "API key not valid");
        assert_eq!(extract_error_message("plain failure"), "plain failure");
        assert_eq!(extract_error_message(""), "empty response body");
    }
}
