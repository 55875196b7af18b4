//! Google Cloud Speech-to-Text client (`POST /v1/speech:recognize`).
//!
//! The whole clip is sent inline as base64 in a single synchronous call; the
//! response's results are mapped to segments using each result's top
//! alternative.

use super::{
    api_error, ProviderError, RecognitionRequest, RecognitionResult, RecognitionSegment,
    SpeechRecognizer,
};
use crate::config::GoogleConfig;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfigBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate_hertz: Option<u32>,
    language_code: &'a str,
    #[serde(skip_serializing_if = "no_alternatives")]
    alternative_language_codes: &'a [String],
    enable_automatic_punctuation: bool,
}

fn no_alternatives(codes: &&[String]) -> bool {
    codes.is_empty()
}

#[derive(Debug, Serialize)]
struct RecognitionAudioBody<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct RecognizeBody<'a> {
    config: RecognitionConfigBody<'a>,
    audio: RecognitionAudioBody<'a>,
}

impl<'a> RecognizeBody<'a> {
    fn from_request(request: &'a RecognitionRequest) -> Self {
        Self {
            config: RecognitionConfigBody {
                encoding: request.encoding.as_deref(),
                sample_rate_hertz: request.sample_rate_hertz,
                language_code: &request.language_code,
                alternative_language_codes: &request.alternative_language_codes,
                enable_automatic_punctuation: request.enable_automatic_punctuation,
            },
            audio: RecognitionAudioBody {
                content: &request.audio_content,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<SpeechResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeechResult {
    #[serde(default)]
    alternatives: Vec<SpeechAlternative>,
    #[serde(default)]
    language_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpeechAlternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: Option<f32>,
}

impl RecognizeResponse {
    fn into_result(self) -> RecognitionResult {
        let segments = self
            .results
            .into_iter()
            .filter_map(|result| {
                let language_code = result.language_code;
                result
                    .alternatives
                    .into_iter()
                    .next()
                    .map(|alternative| RecognitionSegment {
                        text: alternative.transcript,
                        confidence: alternative.confidence,
                        language_code,
                    })
            })
            .collect();

        RecognitionResult::from_segments(segments)
    }
}

/// Speech recognizer backed by the Google Speech-to-Text REST API.
///
/// Authenticates with an API key passed as the `key` query parameter.
pub struct GoogleSpeechClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleSpeechClient {
    pub fn new(config: &GoogleConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.speech_endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn recognize_url(&self) -> String {
        format!("{}/v1/speech:recognize", self.endpoint)
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechClient {
    async fn recognize(&self, request: RecognitionRequest) -> Result<RecognitionResult, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        tracing::debug!(
            language = %request.language_code,
            alternatives = request.alternative_language_codes.len(),
            encoding = ?request.encoding,
            payload_kb = request.audio_content.len() / 1024,
            "Sending recognition request"
        );

        let response = self
            .client
            .post(self.recognize_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&RecognizeBody::from_request(&request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(body.into_result())
    }

    fn name(&self) -> &str {
        "google-speech"
    }
}
