//! # Speech Translate Backend - Main Application Entry Point
//!
//! HTTP service that accepts an uploaded audio clip, transcribes it with a
//! speech recognition provider, and translates the transcript into the
//! requested target language.
//!
//! ## Key Rust Concepts Used:
//! - **async/await**: Every request handler and provider call is asynchronous
//! - **modules**: Code is organized into separate modules (mod statements)
//! - **Result<T, E>**: Error handling using Rust's Result type
//! - **Arc<dyn Trait>**: Provider clients are shared behind traits so tests can swap them
//!
//! ## Application Architecture:
//! - **config**: Application configuration (TOML file + environment variables)
//! - **state**: Shared, read-only state handed to every handler
//! - **upload**: Multipart receiving, validation and temporary file storage
//! - **providers**: Speech recognition and translation clients (Google REST APIs)
//! - **language**: Language detection and translation policy
//! - **handlers**: The speech-to-text request handler
//! - **health**: Health check endpoints
//! - **middleware**: Request logging
//! - **routes**: Route table and catch-all JSON error responders
//! - **error**: Custom error types and HTTP error responses

mod config;      // Configuration management (config.rs)
mod error;       // Error handling types (error.rs)
mod handlers;    // HTTP request handlers (handlers/ directory)
mod health;      // Health check endpoints (health.rs)
mod language;    // Detection/translation policy (language.rs)
mod middleware;  // Custom middleware (middleware/ directory)
mod providers;   // Provider clients (providers/ directory)
mod routes;      // Route table (routes.rs)
mod state;       // Application state (state.rs)
mod upload;      // Upload receiving (upload.rs)

use actix_cors::Cors;
use actix_web::middleware::ErrorHandlers;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use config::AppConfig;
use providers::{GoogleSpeechClient, GoogleTranslateClient};
use state::AppState;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// The main application entry point.
///
/// ## What this function does:
/// 1. **Loads configuration** from files and environment variables
/// 2. **Sets up logging** for debugging and monitoring
/// 3. **Builds the provider clients** once; every request shares them
/// 4. **Configures the HTTP server** with middleware and routes
/// 5. **Handles graceful shutdown** when receiving system signals
///
/// ## Error Handling:
/// If any step fails (config loading, client construction, binding), the
/// function returns the error and the process exits with a message.
#[actix_web::main]
async fn main() -> Result<()> {
    // It's fine if there's no .env file
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting speech-translate-backend v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {}:{}", config.server.host, config.server.port);
    info!(
        languages = config.languages.supported.len(),
        max_file_size = config.upload.max_file_size,
        upload_dir = %config.upload.dir,
        "Service limits"
    );

    if !config.has_api_key() {
        // Startup continues so /health stays reachable; transcription
        // requests will fail with a provider error until a key is set.
        warn!("GOOGLE_API_KEY is not set; speech and translation requests will fail");
    }

    let speech = Arc::new(GoogleSpeechClient::new(&config.google)?);
    let translator = Arc::new(GoogleTranslateClient::new(&config.google)?);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let app_state = AppState::new(config, speech, translator);

    info!("Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            // Middleware runs in reverse registration order for responses
            .wrap(ErrorHandlers::new().default_handler_server(routes::render_internal_error))
            .wrap(middleware::RequestLogging)
            .wrap(TracingLogger::default())
            .wrap(cors)
            .configure(routes::configure)
            .default_service(web::to(routes::not_found))
    })
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    // Whichever finishes first wins: the server (usually an error) or a signal
    tokio::select! {
        result = server_task => {
            match result {
                Ok(Err(e)) => error!("Server error: {}", e),
                Err(e) => error!("Server task error: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Initialize the tracing (logging) system for the application.
///
/// ## Environment Variables:
/// - `RUST_LOG`: Controls what gets logged (e.g., "debug", "speech_translate_backend=trace")
/// - If not set, defaults to "speech_translate_backend=debug,actix_web=info"
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "speech_translate_backend=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

/// Resolves on Ctrl+C, or on SIGTERM where the platform has it.
///
/// If a handler cannot be installed the failure is logged and that signal is
/// simply never observed; the other one still works.
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
