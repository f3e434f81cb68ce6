//! Route modules for Label Lens Server

pub mod analyze;
pub mod health;
pub mod safety;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config().server.allowed_origins);
    let body_limit = state.config().server.max_upload_bytes;

    Router::new()
        .route("/", get(health::root_status).post(analyze::analyze_image))
        .route("/health", get(health::health_check))
        .route("/analyze-image", post(analyze::analyze_image))
        .route("/analyze_image/", post(analyze::analyze_image))
        .route("/safety-check", post(safety::safety_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fixed origin allow-list with mirrored methods and headers
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}


#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use super::test_support::app;
    use crate::state::ClientHandle;

    #[tokio::test]
    async fn test_cors_allows_listed_origin() {
        let app = app(ClientHandle::absent("none"), ClientHandle::absent("none"));

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/analyze-image")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }

    #[tokio::test]
    async fn test_cors_rejects_unlisted_origin() {
        let app = app(ClientHandle::absent("none"), ClientHandle::absent("none"));

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/analyze-image")
            .header(header::ORIGIN, "https://evil.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
