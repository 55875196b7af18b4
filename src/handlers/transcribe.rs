//! # Speech-to-Text Handler
//!
//! `POST /speech-to-text` (alias `POST /google-speech-to-text`)
//!
//! ## Request:
//! Multipart form data with an audio file field named `audio` and an optional
//! `targetLanguage` text field (defaults to `en`).
//!
//! ## Response:
//! ```json
//! {
//!   "success": true,
//!   "sourceLanguage": "en",
//!   "targetLanguage": "es",
//!   "transcription": "hello world",
//!   "translation": "hola mundo"
//! }
//! ```
//!
//! ## Pipeline:
//! 1. Store and validate the upload, then check `targetLanguage` against the catalog
//! 2. Recognize speech (one provider call) and join the segments
//! 3. Detect the transcript language (fail-open) and translate if it differs
//!
//! The stored file is an [`UploadedFile`](crate::upload::UploadedFile) owned by
//! this function, so it is removed from disk whenever the handler returns.

use crate::error::{AppError, AppResult};
use crate::language::{alternative_language_codes, regional_tag};
use crate::providers::RecognitionRequest;
use crate::state::AppState;
use crate::upload::{receive_upload, UploadedFile};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use base64::Engine;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechToTextResponse {
    pub success: bool,
    pub source_language: String,
    pub target_language: String,
    pub transcription: String,
    pub translation: String,
}

/// Recognizer encoding for an accepted upload MIME type.
fn encoding_for_mime(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "audio/webm" => Some("WEBM_OPUS"),
        "audio/ogg" => Some("OGG_OPUS"),
        "audio/wav" | "audio/x-wav" | "audio/wave" => Some("LINEAR16"),
        "audio/mp3" | "audio/mpeg" => Some("MP3"),
        _ => None,
    }
}

/// Build the recognition request for `audio` with `target` as the primary
/// language hint and the rest of the catalog as alternatives.
fn build_recognition_request(state: &AppState, audio: &[u8], mime_type: &str, target: &str) -> RecognitionRequest {
    let config = &state.config;
    let encoding = encoding_for_mime(mime_type);
    let sample_rate_hertz = match encoding {
        Some("WEBM_OPUS") | Some("OGG_OPUS") => Some(config.google.opus_sample_rate_hertz),
        _ => None,
    };

    RecognitionRequest {
        audio_content: base64::engine::general_purpose::STANDARD.encode(audio),
        encoding: encoding.map(str::to_string),
        sample_rate_hertz,
        language_code: regional_tag(target),
        alternative_language_codes: alternative_language_codes(
            target,
            &config.languages.supported,
            config.google.max_alternative_languages,
        ),
        enable_automatic_punctuation: true,
    }
}

pub async fn speech_to_text(state: web::Data<AppState>, payload: Multipart) -> AppResult<HttpResponse> {
    let form = receive_upload(payload, &state.config.upload).await?;

    let upload: UploadedFile = form
        .audio
        .ok_or_else(|| AppError::ValidationError("No audio file uploaded".to_string()))?;

    let target_language = form
        .target_language
        .unwrap_or_else(|| state.config.languages.default_target.clone());

    if !state.config.supports_language(&target_language) {
        return Err(AppError::UnsupportedLanguage(target_language));
    }

    tracing::info!(
        file = %upload.original_name(),
        mime_type = %upload.mime_type(),
        size = upload.size(),
        target = %target_language,
        "Processing speech-to-text request"
    );

    let audio = upload.read().await?;
    let request = build_recognition_request(&state, &audio, upload.mime_type(), &target_language);

    let recognition = state.speech.recognize(request).await.map_err(|e| {
        tracing::error!(provider = state.speech.name(), error = %e, "Speech recognition failed");
        AppError::from(e)
    })?;

    if recognition.is_empty() {
        tracing::info!(file = %upload.original_name(), "No speech detected");
        return Err(AppError::NoSpeechDetected);
    }

    tracing::debug!(
        segments = recognition.segments.len(),
        chars = recognition.transcript.len(),
        "Recognition complete"
    );

    let translation = state
        .languages
        .translate_text(&recognition.transcript, &target_language)
        .await?;

    Ok(HttpResponse::Ok().json(SpeechToTextResponse {
        success: true,
        source_language: translation.source_language,
        target_language: translation.target_language,
        transcription: recognition.transcript,
        translation: translation.translated_text,
    }))
}
