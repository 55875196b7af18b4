use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// `GET /health`: configuration snapshot for load balancers and clients.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let config = &state.config;

    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "supportedLanguages": config.languages.supported,
        "supportedMimeTypes": config.upload.supported_mime_types,
        "maxFileSize": config.upload.max_file_size,
        "service": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
        "uptimeSeconds": state.uptime_seconds(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// `GET /`: short banner, handy for checking the server is up from a browser.
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}
