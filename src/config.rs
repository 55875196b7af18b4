//! # Configuration Management
//!
//! This module handles loading and managing application configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Key Rust Concepts Used:
//! - **Serde**: Serialization/deserialization between Rust structs and config formats
//! - **derive macros**: Automatically generate Debug, Clone, Serialize, Deserialize
//! - **Result<T, E>**: Error handling that forces you to handle potential failures
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Platform variables (HOST, PORT, UPLOAD_DIR, GOOGLE_API_KEY)
//! 2. Environment variables (APP_SERVER__PORT, APP_UPLOAD__MAX_FILE_SIZE, etc.)
//! 3. Configuration file (config.toml)
//! 4. Default values (defined in the Default impl)
//!
//! The configuration is read once at startup and never mutated afterwards.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Language codes the service accepts as a `targetLanguage`.
///
/// Base codes (`en`, `es`, ...) are mapped to a regional tag before being sent
/// to the speech provider; regional codes are used as-is.
pub const DEFAULT_SUPPORTED_LANGUAGES: &[&str] = &[
    "en", "en-US", "en-GB", "en-AU", "en-IN",
    "es", "es-ES", "es-MX", "es-US",
    "ar", "ar-XA", "ar-EG", "ar-SA",
    "hi", "hi-IN",
    "bn", "bn-IN", "bn-BD",
    "id", "id-ID",
    "fil", "tl", "fil-PH",
    "ja", "ja-JP",
];

/// MIME types accepted by the upload receiver.
pub const DEFAULT_SUPPORTED_MIME_TYPES: &[&str] =
    &["audio/webm", "audio/mp3", "audio/wav", "audio/ogg"];

/// Main application configuration that contains all settings.
///
/// ## Why separate config structs:
/// Breaking configuration into logical groups (server, upload, languages, google)
/// keeps each concern readable and maps cleanly onto nested TOML tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub languages: LanguagesConfig,
    pub google: GoogleConfig,
}

/// Server-specific configuration settings.
///
/// ## Common values:
/// - `host = "127.0.0.1"`: Only accept connections from localhost (development)
/// - `host = "0.0.0.0"`: Accept connections from any IP address (production)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where and what the upload receiver is allowed to store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory for transient audio files (created on demand)
    pub dir: String,
    /// Maximum accepted file size in bytes
    pub max_file_size: usize,
    pub supported_mime_types: Vec<String>,
}

/// Language catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguagesConfig {
    /// Ordered catalog of accepted target languages
    pub supported: Vec<String>,
    /// Target used when the request omits `targetLanguage`
    pub default_target: String,
    /// Language assumed when detection fails
    pub detection_fallback: String,
}

/// Credentials and endpoints for the Google speech and translation APIs.
///
/// `api_key` is skipped when the config is serialized so it never ends up in
/// a log line or a debug dump of the merged settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    pub speech_endpoint: String,
    pub translate_endpoint: String,
    pub request_timeout_secs: u64,
    /// Upper bound on alternative-language hints; 0 sends one per catalog language
    pub max_alternative_languages: usize,
    pub opus_sample_rate_hertz: u32,
}

impl UploadConfig {
    /// Whether `mime` is an accepted upload type. Parameters such as
    /// `;codecs=opus` are ignored.
    pub fn accepts_mime(&self, mime: &str) -> bool {
        let essence = mime.split(';').next().unwrap_or("").trim();
        self.supported_mime_types
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(essence))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            upload: UploadConfig {
                dir: "uploads".to_string(),
                max_file_size: 10 * 1024 * 1024, // 10 MiB
                supported_mime_types: DEFAULT_SUPPORTED_MIME_TYPES
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            languages: LanguagesConfig {
                supported: DEFAULT_SUPPORTED_LANGUAGES
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                default_target: "en".to_string(),
                detection_fallback: "en".to_string(),
            },
            google: GoogleConfig {
                api_key: String::new(),
                speech_endpoint: "https://speech.googleapis.com".to_string(),
                translate_endpoint: "https://translation.googleapis.com".to_string(),
                request_timeout_secs: 30,
                max_alternative_languages: 0,
                opus_sample_rate_hertz: 48000,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Configuration Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Override with values from config.toml (if it exists)
    /// 3. Override with environment variables prefixed with APP_
    /// 4. Handle the platform variables HOST, PORT, UPLOAD_DIR and GOOGLE_API_KEY
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER__PORT=3000`: Override server port
    /// - `APP_UPLOAD__MAX_FILE_SIZE=5242880`: Override upload limit
    /// - `APP_LANGUAGES__SUPPORTED=en,es,ja`: Comma-separated catalog
    /// - `PORT=3000`: Special case for deployment platforms
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            // Double underscore separates nesting so field names keep their
            // own underscores: APP_UPLOAD__MAX_FILE_SIZE -> upload.max_file_size
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("upload.supported_mime_types")
                    .with_list_parse_key("languages.supported"),
            );

        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        if let Ok(dir) = env::var("UPLOAD_DIR") {
            settings = settings.set_override("upload.dir", dir)?;
        }

        if let Ok(key) = env::var("GOOGLE_API_KEY") {
            settings = settings.set_override("google.api_key", key)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// ## What this checks:
    /// - Server port is not 0
    /// - Upload limit and MIME list are usable
    /// - The language catalog is non-empty and contains the default target and fallback
    /// - Provider timeout is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.upload.dir.trim().is_empty() {
            return Err(anyhow::anyhow!("Upload directory must not be empty"));
        }

        if self.upload.max_file_size == 0 {
            return Err(anyhow::anyhow!("Max file size must be greater than 0"));
        }

        if self.upload.supported_mime_types.is_empty() {
            return Err(anyhow::anyhow!("At least one supported MIME type is required"));
        }

        if self.languages.supported.is_empty() {
            return Err(anyhow::anyhow!("At least one supported language is required"));
        }

        if !self.supports_language(&self.languages.default_target) {
            return Err(anyhow::anyhow!(
                "Default target language '{}' is not in the supported language list",
                self.languages.default_target
            ));
        }

        if !self.supports_language(&self.languages.detection_fallback) {
            return Err(anyhow::anyhow!(
                "Detection fallback language '{}' is not in the supported language list",
                self.languages.detection_fallback
            ));
        }

        if self.google.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Provider request timeout must be greater than 0"));
        }

        Ok(())
    }

    /// Whether `code` is part of the configured language catalog (exact match).
    pub fn supports_language(&self, code: &str) -> bool {
        self.languages.supported.iter().any(|lang| lang == code)
    }

    pub fn has_api_key(&self) -> bool {
        !self.google.api_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.upload.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.languages.supported.len(), 25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.upload.max_file_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.languages.default_target = "xx".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.languages.supported.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mime_matching_ignores_parameters_and_case() {
        let upload = AppConfig::default().upload;
        assert!(upload.accepts_mime("audio/webm"));
        assert!(upload.accepts_mime("audio/webm;codecs=opus"));
        assert!(upload.accepts_mime("Audio/WAV"));
        assert!(!upload.accepts_mime("application/pdf"));
        assert!(!upload.accepts_mime(""));
    }

    #[test]
    fn test_language_lookup_is_exact() {
        let config = AppConfig::default();
        assert!(config.supports_language("en"));
        assert!(config.supports_language("fil-PH"));
        assert!(!config.supports_language("EN"));
        assert!(!config.supports_language("xx-unknown"));
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let mut config = AppConfig::default();
        config.google.api_key = "secret-key".to_string();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-key"));
        assert!(config.has_api_key());
    }
}
