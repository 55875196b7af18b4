//! Route table and the catch-all responders.
//!
//! Kept separate from `main.rs` so tests can mount exactly the routes the
//! server runs with.

use crate::error::{AppError, AppResult};
use crate::{handlers, health};
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health::index))
        .route("/health", web::get().to(health::health_check))
        .route("/speech-to-text", web::post().to(handlers::speech_to_text))
        .route("/google-speech-to-text", web::post().to(handlers::speech_to_text))
        .service(web::scope("/api/v1").route("/health", web::get().to(health::health_check)));
}

/// Default service for unknown routes.
pub async fn not_found(req: HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::NotFound(format!("{} {}", req.method(), req.path())))
}

/// Last line of defence for 5xx responses that did not come from
/// `AppError` (framework errors, payload failures): replace the body with the
/// generic JSON error so clients never see a plain-text fault.
pub fn render_internal_error<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let is_json = res
        .response()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false);

    if is_json {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    tracing::error!(
        status = %res.status(),
        path = %res.request().path(),
        "Unhandled server error"
    );

    let (req, _) = res.into_parts();
    let response = HttpResponse::InternalServerError().json(json!({
        "success": false,
        "error": "Internal server error",
        "code": "internal_error",
    }));

    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, response).map_into_right_body::<B>(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::middleware::ErrorHandlers;
    use actix_web::{test, App};

    async fn plain_failure() -> HttpResponse {
        HttpResponse::InternalServerError().body("worker exploded")
    }

    #[actix_web::test]
    async fn test_unknown_route_returns_json_404() {
        let app = test::init_service(
            App::new()
                .configure(configure)
                .default_service(web::to(not_found)),
        )
        .await;

        let req = test::TestRequest::get().uri("/does-not-exist").to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "not_found");
    }

    #[actix_web::test]
    async fn test_plain_server_error_is_rewritten_as_json() {
        let app = test::init_service(
            App::new()
                .wrap(ErrorHandlers::new().default_handler_server(render_internal_error))
                .route("/boom", web::get().to(plain_failure)),
        )
        .await;

        let req = test::TestRequest::get().uri("/boom").to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Internal server error");
    }

    #[actix_web::test]
    async fn test_json_server_error_passes_through() {
        async fn provider_failure() -> AppResult<HttpResponse> {
            Err(AppError::Provider("upstream 503".to_string()))
        }

        let app = test::init_service(
            App::new()
                .wrap(ErrorHandlers::new().default_handler_server(render_internal_error))
                .route("/provider", web::get().to(provider_failure)),
        )
        .await;

        let req = test::TestRequest::get().uri("/provider").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["code"], "provider_error");
    }
}
