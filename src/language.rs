//! # Language Utilities
//!
//! Language detection and translation on top of the [`Translator`] provider,
//! plus the fixed lookup tables used to build recognition hints.
//!
//! ## Failure policy:
//! - **Detection is fail-open**: any provider error is logged and the
//!   configured fallback (`"en"`) is returned, so a flaky detector never
//!   aborts an otherwise successful transcription.
//! - **Translation is fail-closed**: a provider error becomes
//!   [`AppError::Translation`] and fails the request.

use crate::error::AppError;
use crate::providers::Translator;
use serde::Serialize;
use std::sync::Arc;

/// Regional tag used as the recognizer's primary language for each base code.
/// Codes that already carry a region are passed through unchanged.
const REGIONAL_TAGS: &[(&str, &str)] = &[
    ("en", "en-US"),
    ("es", "es-ES"),
    ("ar", "ar-XA"),
    ("hi", "hi-IN"),
    ("bn", "bn-IN"),
    ("id", "id-ID"),
    ("fil", "fil-PH"),
    ("tl", "fil-PH"),
    ("ja", "ja-JP"),
];

/// Map a language code to the regional BCP-47 tag the recognizer expects
/// (`en` → `en-US`). Unknown base codes and regional codes are returned as-is.
pub fn regional_tag(code: &str) -> String {
    REGIONAL_TAGS
        .iter()
        .find(|(base, _)| base.eq_ignore_ascii_case(code))
        .map(|(_, tag)| tag.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// One regional tag per distinct catalog language other than `primary`'s, in
/// catalog order. The first catalog entry of each language picks its tag, so
/// `en, en-US, en-GB` contributes only `en-US`. `cap == 0` means no limit; a
/// cap is applied after deduplication so the hints still span languages.
pub fn alternative_language_codes(primary: &str, catalog: &[String], cap: usize) -> Vec<String> {
    let mut seen = vec![language_key(primary)];
    let mut alternatives: Vec<String> = Vec::new();

    for code in catalog {
        let key = language_key(code);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        alternatives.push(regional_tag(code));
    }

    if cap > 0 {
        alternatives.truncate(cap);
    }
    alternatives
}

/// Primary language subtag, lowercased (`en-US` → `en`).
fn primary_subtag(code: &str) -> String {
    code.split(['-', '_'])
        .next()
        .unwrap_or(code)
        .trim()
        .to_ascii_lowercase()
}

/// Primary subtag with Filipino folded to one code; services report it as
/// either `fil` or `tl`.
fn language_key(code: &str) -> String {
    match primary_subtag(code).as_str() {
        "fil" => "tl".to_string(),
        other => other.to_string(),
    }
}

/// Whether two codes name the same language, ignoring region and case.
pub fn same_language(a: &str, b: &str) -> bool {
    language_key(a) == language_key(b)
}

/// Code sent to the translation provider for a catalog target.
pub fn provider_target(code: &str) -> String {
    language_key(code)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub source_language: String,
    pub target_language: String,
    pub translated_text: String,
}

/// Detection and translation with the fail-open / fail-closed split
/// described in the module docs.
#[derive(Clone)]
pub struct LanguageService {
    translator: Arc<dyn Translator>,
    fallback: String,
}

impl LanguageService {
    pub fn new(translator: Arc<dyn Translator>, fallback: impl Into<String>) -> Self {
        Self {
            translator,
            fallback: fallback.into(),
        }
    }

    /// Detect the language of `text`. Never fails: on provider error the
    /// fallback language is returned.
    pub async fn detect_language(&self, text: &str) -> String {
        match self.translator.detect(text).await {
            Ok(language) => language,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = %self.fallback,
                    "Language detection failed, using fallback"
                );
                self.fallback.clone()
            }
        }
    }

    /// Detect, then translate unless the text is already in `target`.
    pub async fn translate_text(&self, text: &str, target: &str) -> Result<TranslationResult, AppError> {
        let source = self.detect_language(text).await;
        self.translate_detected(text, &source, target).await
    }

    /// Translate `text` whose language is already known to be `source`.
    /// Same language in and out returns the input verbatim without a
    /// provider call.
    pub async fn translate_detected(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<TranslationResult, AppError> {
        if same_language(source, target) {
            tracing::debug!(source = %source, target = %target, "Skipping translation, languages match");
            return Ok(TranslationResult {
                source_language: source.to_string(),
                target_language: target.to_string(),
                translated_text: text.to_string(),
            });
        }

        let translated_text = self
            .translator
            .translate(text, &provider_target(target))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, source = %source, target = %target, "Translation failed");
                AppError::Translation(e.to_string())
            })?;

        Ok(TranslationResult {
            source_language: source.to_string(),
            target_language: target.to_string(),
            translated_text,
        })
    }
}
