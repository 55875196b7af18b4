//! In-process providers for tests. Each records how often it was called so
//! tests can assert that short-circuit paths never reach a provider.

use super::{
    ProviderError, RecognitionRequest, RecognitionResult, RecognitionSegment, SpeechRecognizer,
    Translator,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct MockSpeechRecognizer {
    segments: Option<Vec<String>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<RecognitionRequest>>,
}

impl MockSpeechRecognizer {
    /// Recognizer that returns one segment per entry, in order.
    pub fn returning(segments: &[&str]) -> Self {
        Self {
            segments: Some(segments.iter().map(|s| s.to_string()).collect()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Recognizer whose every call fails with an API error.
    pub fn failing() -> Self {
        Self {
            segments: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecognitionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechRecognizer for MockSpeechRecognizer {
    async fn recognize(&self, request: RecognitionRequest) -> Result<RecognitionResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);

        match &self.segments {
            Some(texts) => Ok(RecognitionResult::from_segments(
                texts
                    .iter()
                    .map(|text| RecognitionSegment {
                        text: text.clone(),
                        confidence: Some(0.95),
                        language_code: None,
                    })
                    .collect(),
            )),
            None => Err(ProviderError::Api {
                status: 503,
                message: "speech backend unavailable".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock-speech"
    }
}

pub struct MockTranslator {
    detected: Option<String>,
    translation: Option<String>,
    detect_calls: AtomicUsize,
    translate_calls: AtomicUsize,
}

impl MockTranslator {
    /// Translator that detects `detected` and translates everything to `translation`.
    pub fn new(detected: &str, translation: &str) -> Self {
        Self {
            detected: Some(detected.to_string()),
            translation: Some(translation.to_string()),
            detect_calls: AtomicUsize::new(0),
            translate_calls: AtomicUsize::new(0),
        }
    }

    /// Detection always fails; translation still works.
    pub fn with_failing_detection(translation: &str) -> Self {
        Self {
            detected: None,
            ..Self::new("", translation)
        }
    }

    /// Detection works; translation always fails.
    pub fn with_failing_translation(detected: &str) -> Self {
        Self {
            translation: None,
            ..Self::new(detected, "")
        }
    }

    pub fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    pub fn translate_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn detect(&self, _text: &str) -> Result<String, ProviderError> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        self.detected
            .clone()
            .ok_or_else(|| ProviderError::Transport("detector timed out".to_string()))
    }

    async fn translate(&self, _text: &str, _target: &str) -> Result<String, ProviderError> {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        self.translation.clone().ok_or_else(|| ProviderError::Api {
            status: 500,
            message: "translation backend error".to_string(),
        })
    }
}
