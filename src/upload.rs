//! # Upload Receiver
//!
//! Reads the multipart form of a transcription request, validates the audio
//! part and stores it under the upload directory.
//!
//! ## Ownership of the stored file
//! The stored file is represented by [`UploadedFile`], which deletes the file
//! when it is dropped. The handler owns the value for the duration of the
//! request, so the file disappears on every exit path (success, provider
//! failure, or a validation failure after the file was stored) without any
//! explicit cleanup call.
//!
//! ## Validation (all failures are `AppError::ValidationError`, HTTP 400):
//! - the part's declared MIME type must be in `upload.supported_mime_types`
//! - its size must not exceed `upload.max_file_size` (checked while streaming)
//! - it must not be empty, and only one audio part is allowed
//!
//! Nothing touches the disk until the part has passed every check.

use crate::config::UploadConfig;
use crate::error::AppError;
use actix_multipart::{Field, Multipart};
use futures_util::stream::StreamExt;
use std::path::{Path, PathBuf};

/// Form field names accepted for the audio part. `file` is kept for clients
/// of the older endpoint.
const AUDIO_FIELDS: &[&str] = &["audio", "file"];

const TARGET_LANGUAGE_FIELD: &str = "targetLanguage";

/// An accepted audio upload stored on disk. Removing the file is tied to the
/// lifetime of this value.
#[derive(Debug)]
pub struct UploadedFile {
    path: PathBuf,
    original_name: String,
    mime_type: String,
    size: usize,
}

impl UploadedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Read the stored bytes back.
    pub async fn read(&self) -> Result<Vec<u8>, AppError> {
        Ok(tokio::fs::read(self.path()).await?)
    }
}

impl Drop for UploadedFile {
    fn drop(&mut self) {
        // Blocking unlink on the worker: the file must be gone before the
        // handler's response is sent, which a spawned task can't promise.
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed uploaded file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove uploaded file"
            ),
        }
    }
}

/// Everything a transcription request carries in its form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub audio: Option<UploadedFile>,
    pub target_language: Option<String>,
}

/// Consume the multipart payload, storing the audio part and collecting the
/// `targetLanguage` field. Unknown fields are drained and ignored.
pub async fn receive_upload(mut payload: Multipart, settings: &UploadConfig) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::ValidationError(format!("Multipart error: {}", e)))?;
        let name = field.name().unwrap_or_default().to_string();

        if AUDIO_FIELDS.contains(&name.as_str()) {
            if form.audio.is_some() {
                return Err(AppError::ValidationError(
                    "Only one audio file may be uploaded per request".to_string(),
                ));
            }
            form.audio = Some(store_audio_field(&mut field, settings).await?);
        } else if name == TARGET_LANGUAGE_FIELD {
            let value = read_text_field(&mut field).await?;
            let value = value.trim();
            if !value.is_empty() {
                form.target_language = Some(value.to_string());
            }
        } else {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| AppError::ValidationError(format!("Chunk error: {}", e)))?;
            }
        }
    }

    Ok(form)
}

/// Text fields are tiny; anything past this is not a language code.
const MAX_TEXT_FIELD_BYTES: usize = 256;

async fn read_text_field(field: &mut Field) -> Result<String, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::ValidationError(format!("Chunk error: {}", e)))?;
        bytes.extend_from_slice(&chunk);
        if bytes.len() > MAX_TEXT_FIELD_BYTES {
            return Err(AppError::ValidationError("Form field too large".to_string()));
        }
    }

    String::from_utf8(bytes)
        .map_err(|_| AppError::ValidationError("Form field is not valid UTF-8".to_string()))
}

async fn store_audio_field(field: &mut Field, settings: &UploadConfig) -> Result<UploadedFile, AppError> {
    let mime_type = field
        .content_type()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    if !settings.accepts_mime(&mime_type) {
        return Err(AppError::ValidationError(format!(
            "Unsupported file type: {}. Supported types: {}",
            mime_type,
            settings.supported_mime_types.join(", ")
        )));
    }

    let original_name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .unwrap_or("audio")
        .to_string();

    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::ValidationError(format!("Chunk error: {}", e)))?;
        if bytes.len() + chunk.len() > settings.max_file_size {
            return Err(AppError::ValidationError(format!(
                "File too large (max: {} bytes)",
                settings.max_file_size
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    if bytes.is_empty() {
        return Err(AppError::ValidationError("Uploaded file is empty".to_string()));
    }

    tokio::fs::create_dir_all(&settings.dir).await?;
    let path = Path::new(&settings.dir).join(stored_file_name(&original_name, &mime_type));
    tokio::fs::write(&path, &bytes).await?;

    tracing::info!(
        path = %path.display(),
        original_name = %original_name,
        mime_type = %mime_type,
        size = bytes.len(),
        "Stored uploaded audio"
    );

    Ok(UploadedFile {
        path,
        original_name,
        mime_type,
        size: bytes.len(),
    })
}

/// `<unix-millis>-<uuid><ext>`, keeping the client's extension when it has one.
fn stored_file_name(original_name: &str, mime_type: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .or_else(|| extension_for_mime(mime_type).map(str::to_string));

    let stem = format!(
        "{}-{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    );

    match extension {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "audio/webm" => Some("webm"),
        "audio/mp3" | "audio/mpeg" => Some("mp3"),
        "audio/wav" | "audio/x-wav" | "audio/wave" => Some("wav"),
        "audio/ogg" => Some("ogg"),
        _ => None,
    }
}
