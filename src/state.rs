//! # Application State
//!
//! State shared by every HTTP request handler.
//!
//! ## Key Rust Concepts:
//!
//! ### Arc (Atomically Reference Counted)
//! - **Purpose**: Lets every worker thread hold the same configuration and provider clients
//! - **Cheap clones**: Cloning an `Arc` only bumps a counter; actix clones the state per worker
//!
//! ### Trait objects (`Arc<dyn Trait>`)
//! - **Purpose**: The handler only knows the `SpeechRecognizer` / `Translator` traits
//! - **Why needed**: Production wires in Google clients, tests wire in mocks
//!
//! Nothing in here is mutable after startup, so no locks are needed.

use crate::config::AppConfig;
use crate::language::LanguageService;
use crate::providers::{SpeechRecognizer, Translator};
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    /// Read-only configuration loaded at startup
    pub config: Arc<AppConfig>,

    /// Speech recognition provider, created once and shared
    pub speech: Arc<dyn SpeechRecognizer>,

    /// Detection and translation on top of the translation provider
    pub languages: LanguageService,

    /// When the server started (for the health endpoint's uptime)
    pub start_time: Instant,
}

impl AppState {
    /// Assemble the state from already-constructed provider clients.
    pub fn new(
        config: AppConfig,
        speech: Arc<dyn SpeechRecognizer>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let languages = LanguageService::new(translator, config.languages.detection_fallback.clone());
        Self {
            config: Arc::new(config),
            speech,
            languages,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
