//! Google Cloud Translation (v2 REST) client.
//!
//! Two calls are used:
//! - `POST /language/translate/v2/detect` for language detection
//! - `POST /language/translate/v2` for translation (`format: "text"` so the
//!   output is not HTML-escaped)

use super::{api_error, ProviderError, Translator};
use crate::config::GoogleConfig;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct DetectBody<'a> {
    q: &'a str,
}

#[derive(Debug, Serialize)]
struct TranslateBody<'a> {
    q: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct DetectData {
    #[serde(default)]
    detections: Vec<Vec<Detection>>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
    #[serde(default)]
    detected_source_language: Option<String>,
}

impl DetectData {
    /// Most confident detection for the single query we send.
    fn best_language(self) -> Option<String> {
        self.detections
            .into_iter()
            .next()?
            .into_iter()
            .max_by(|a, b| {
                a.confidence
                    .unwrap_or(0.0)
                    .partial_cmp(&b.confidence.unwrap_or(0.0))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|detection| detection.language)
            .filter(|language| !language.is_empty() && language != "und")
    }
}

/// Translator backed by the Google Cloud Translation v2 REST API.
pub struct GoogleTranslateClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleTranslateClient {
    pub fn new(config: &GoogleConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.translate_endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let response = self
            .client
            .post(format!("{}{}", self.endpoint, path))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl Translator for GoogleTranslateClient {
    async fn detect(&self, text: &str) -> Result<String, ProviderError> {
        let data: DetectData = self
            .post("/language/translate/v2/detect", &DetectBody { q: text })
            .await?;

        data.best_language()
            .ok_or_else(|| ProviderError::InvalidResponse("no language detected".to_string()))
    }

    async fn translate(&self, text: &str, target: &str) -> Result<String, ProviderError> {
        let body = TranslateBody {
            q: text,
            target,
            format: "text",
        };
        let data: TranslateData = self.post("/language/translate/v2", &body).await?;

        let translation = data
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("no translation returned".to_string()))?;

        if let Some(source) = &translation.detected_source_language {
            tracing::debug!(source = %source, target = %target, "Provider reported source language");
        }

        Ok(translation.translated_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{web, App, HttpResponse, HttpServer};

    fn config_for(endpoint: &str, api_key: &str) -> GoogleConfig {
        let mut config = crate::config::AppConfig::default().google;
        config.translate_endpoint = endpoint.to_string();
        config.api_key = api_key.to_string();
        config
    }

    /// Local stand-in for the translation API: detects everything as English
    /// and "translates" into Spanish by echoing a fixed phrase.
    fn start_mock_translate_server() -> String {
        let server = HttpServer::new(|| {
            App::new()
                .route(
                    "/language/translate/v2/detect",
                    web::post().to(|body: web::Json<serde_json::Value>| async move {
                        assert_eq!(body["q"], "hello world");
                        HttpResponse::Ok().json(serde_json::json!({
                            "data": {"detections": [[
                                {"language": "fr", "confidence": 0.2, "isReliable": false},
                                {"language": "en", "confidence": 0.98, "isReliable": true}
                            ]]}
                        }))
                    }),
                )
                .route(
                    "/language/translate/v2",
                    web::post().to(|body: web::Json<serde_json::Value>| async move {
                        if body["target"] == "xx" {
                            return HttpResponse::BadRequest().json(serde_json::json!({
                                "error": {"code": 400, "message": "Invalid Value"}
                            }));
                        }
                        assert_eq!(body["format"], "text");
                        HttpResponse::Ok().json(serde_json::json!({
                            "data": {"translations": [
                                {"translatedText": "hola mundo", "detectedSourceLanguage": "en"}
                            ]}
                        }))
                    }),
                )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{}", addr)
    }

    #[test]
    fn test_best_detection_is_most_confident() {
        let data: DetectData = serde_json::from_str(
            r#"{"detections": [[{"language": "es", "confidence": 0.4}, {"language": "en", "confidence": 0.9}]]}"#,
        )
        .unwrap();
        assert_eq!(data.best_language().as_deref(), Some("en"));
    }

    #[test]
    fn test_undetermined_language_is_rejected() {
        let data: DetectData =
            serde_json::from_str(r#"{"detections": [[{"language": "und"}]]}"#).unwrap();
        assert_eq!(data.best_language(), None);

        let empty: DetectData = serde_json::from_str(r#"{"detections": []}"#).unwrap();
        assert_eq!(empty.best_language(), None);
    }

    #[actix_web::test]
    async fn test_missing_api_key() {
        let client = GoogleTranslateClient::new(&config_for("http://127.0.0.1:9", " ")).unwrap();
        assert!(matches!(client.detect("hi").await, Err(ProviderError::MissingApiKey)));
        assert!(matches!(
            client.translate("hi", "es").await,
            Err(ProviderError::MissingApiKey)
        ));
    }

    #[actix_web::test]
    async fn test_detect_and_translate_against_local_server() {
        let base_url = start_mock_translate_server();
        let client = GoogleTranslateClient::new(&config_for(&base_url, "test-key")).unwrap();

        assert_eq!(client.detect("hello world").await.unwrap(), "en");
        assert_eq!(client.translate("hello world", "es").await.unwrap(), "hola mundo");
    }

    #[actix_web::test]
    async fn test_translate_error_status_is_reported() {
        let base_url = start_mock_translate_server();
        let client = GoogleTranslateClient::new(&config_for(&base_url, "test-key")).unwrap();

        match client.translate("hello world", "xx").await {
            Err(ProviderError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid Value");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }
}
