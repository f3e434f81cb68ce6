//! Label analysis endpoints
//!
//! Endpoints:
//! - POST /analyze-image
//! - POST /analyze_image/
//! - POST /

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use tracing::Instrument;
use uuid::Uuid;

use super::upload::read_image;
use crate::analysis::LabelReport;
use crate::error::Result;
use crate::state::AppState;

/// Run OCR and label detection on the uploaded image, then summarize.
pub async fn analyze_image(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<LabelReport>> {
    let request_id = Uuid::new_v4();
    let image = read_image(multipart, state.config().server.max_upload_bytes).await?;

    tracing::info!(
        %request_id,
        filename = %image.filename,
        bytes = image.data.len(),
        "Analyzing label image"
    );

    let report = state
        .analyzer()
        .analyze(&image)
        .instrument(tracing::info_span!("analyze", %request_id))
        .await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::routes::test_support::{app, app_with_config, json_body, multipart_request};
    use crate::state::ClientHandle;
    use crate::summary::{MockCompletion, NO_ANALYSIS_DIAGNOSTIC, NOT_CONFIGURED_DIAGNOSTIC};
    use crate::vision::{EntityAnnotation, ImageAnnotations, MockAnnotator, NO_TEXT_SENTINEL};

    const JPEG: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF\x00fake-jpeg-body";

    fn ingredients() -> ImageAnnotations {
        ImageAnnotations {
            text_annotations: vec![EntityAnnotation::new("INGREDIENTS: SUGAR, SALT, WATER", 0.0)],
            label_annotations: vec![
                EntityAnnotation::new("Food", 0.95),
                EntityAnnotation::new("Packaging", 0.81),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_end_to_end_label_analysis() {
        let app = app(
            ClientHandle::Ready(Arc::new(MockAnnotator::returning(ingredients()))),
            ClientHandle::Ready(Arc::new(MockCompletion::replying("Mostly sugar and salt."))),
        );

        let response = app
            .oneshot(multipart_request("/analyze-image", "image_file", "label.jpg", JPEG))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["raw_text_detected"], "INGREDIENTS: SUGAR, SALT, WATER");
        assert_eq!(
            body["detected_labels"],
            serde_json::json!(["Food (Score: 0.95)", "Packaging (Score: 0.81)"])
        );
        assert_eq!(body["summary"], "Mostly sugar and salt.");
    }

    #[tokio::test]
    async fn test_all_analyze_paths_are_routed() {
        for uri in ["/analyze-image", "/analyze_image/", "/"] {
            let app = app(
                ClientHandle::Ready(Arc::new(MockAnnotator::returning(ingredients()))),
                ClientHandle::Ready(Arc::new(MockCompletion::replying("ok"))),
            );

            let response = app
                .oneshot(multipart_request(uri, "image_file", "label.jpg", JPEG))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK, "path {}", uri);
        }
    }

    #[tokio::test]
    async fn test_no_text_uses_sentinel_and_caps_labels() {
        let annotations = ImageAnnotations {
            label_annotations: (0..8)
                .map(|i| EntityAnnotation::new(&format!("L{}", i), 0.9 - i as f64 * 0.05))
                .collect(),
            ..Default::default()
        };
        let app = app(
            ClientHandle::Ready(Arc::new(MockAnnotator::returning(annotations))),
            ClientHandle::Ready(Arc::new(MockCompletion::replying("ok"))),
        );

        let response = app
            .oneshot(multipart_request("/analyze-image", "image_file", "blank.png", JPEG))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["raw_text_detected"], NO_TEXT_SENTINEL);
        let labels = body["detected_labels"].as_array().unwrap();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels[0], "L0 (Score: 0.90)");
        assert_eq!(labels[4], "L4 (Score: 0.70)");
    }

    #[tokio::test]
    async fn test_missing_completion_key_degrades_but_returns_ocr() {
        let annotator = Arc::new(MockAnnotator::returning(ingredients()));
        let app = app(
            ClientHandle::Ready(annotator.clone()),
            ClientHandle::absent("OPENAI_API_KEY not set"),
        );

        let response = app
            .oneshot(multipart_request("/analyze-image", "image_file", "label.jpg", JPEG))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(annotator.call_count(), 1);
        let body = json_body(response).await;
        assert_eq!(body["summary"], NOT_CONFIGURED_DIAGNOSTIC);
        assert_eq!(body["raw_text_detected"], "INGREDIENTS: SUGAR, SALT, WATER");
    }

    #[tokio::test]
    async fn test_empty_completion_gives_diagnostic() {
        let app = app(
            ClientHandle::Ready(Arc::new(MockAnnotator::returning(ingredients()))),
            ClientHandle::Ready(Arc::new(MockCompletion::replying(""))),
        );

        let response = app
            .oneshot(multipart_request("/analyze-image", "image_file", "label.jpg", JPEG))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["summary"], NO_ANALYSIS_DIAGNOSTIC);
    }

    #[tokio::test]
    async fn test_completion_failure_still_returns_200() {
        let app = app(
            ClientHandle::Ready(Arc::new(MockAnnotator::returning(ingredients()))),
            ClientHandle::Ready(Arc::new(MockCompletion::failing("service overloaded"))),
        );

        let response = app
            .oneshot(multipart_request("/analyze-image", "image_file", "label.jpg", JPEG))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["summary"].as_str().unwrap().contains("service overloaded"));
        assert_eq!(body["raw_text_detected"], "INGREDIENTS: SUGAR, SALT, WATER");
    }

    #[tokio::test]
    async fn test_vision_failure_returns_500_with_detail() {
        let app = app(
            ClientHandle::Ready(Arc::new(MockAnnotator::failing("PERMISSION_DENIED: billing disabled"))),
            ClientHandle::Ready(Arc::new(MockCompletion::replying("unused"))),
        );

        let response = app
            .oneshot(multipart_request("/analyze-image", "image_file", "label.jpg", JPEG))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .contains("PERMISSION_DENIED: billing disabled"));
        assert!(body.get("summary").is_none());
    }

    #[tokio::test]
    async fn test_uninitialized_vision_returns_500() {
        let app = app(
            ClientHandle::absent("no credentials"),
            ClientHandle::Ready(Arc::new(MockCompletion::replying("unused"))),
        );

        let response = app
            .oneshot(multipart_request("/analyze-image", "image_file", "label.jpg", JPEG))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(body["detail"].as_str().unwrap().contains("not initialized"));
    }

    #[tokio::test]
    async fn test_empty_upload_is_bad_request() {
        let annotator = Arc::new(MockAnnotator::returning(ingredients()));
        let app = app(ClientHandle::Ready(annotator.clone()), ClientHandle::absent("no key"));

        let response = app
            .oneshot(multipart_request("/analyze-image", "image_file", "empty.jpg", b""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["detail"].as_str().unwrap().contains("Failed to read uploaded image"));
        assert_eq!(annotator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_payload_too_large() {
        let annotator = Arc::new(MockAnnotator::returning(ingredients()));
        let mut config = Config::default();
        config.server.max_upload_bytes = 1024;
        let app = app_with_config(
            config,
            ClientHandle::Ready(annotator.clone()),
            ClientHandle::absent("no key"),
        );

        let response = app
            .oneshot(multipart_request("/analyze-image", "image_file", "big.jpg", &[0xab; 4096]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = json_body(response).await;
        assert!(body["detail"].as_str().unwrap().contains("1024 byte upload limit"));
        assert_eq!(annotator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_field_name_is_bad_request() {
        let app = app(
            ClientHandle::Ready(Arc::new(MockAnnotator::returning(ingredients()))),
            ClientHandle::absent("no key"),
        );

        let response = app
            .oneshot(multipart_request("/analyze-image", "file", "label.jpg", JPEG))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["detail"].as_str().unwrap().contains("image_file"));
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_bad_request() {
        let app = app(
            ClientHandle::Ready(Arc::new(MockAnnotator::returning(ingredients()))),
            ClientHandle::absent("no key"),
        );

        let request = Request::post("/analyze-image")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["detail"].as_str().unwrap().starts_with("Failed to read uploaded image"));
    }

    #[tokio::test]
    async fn test_repeated_uploads_are_idempotent() {
        let annotator = Arc::new(MockAnnotator::returning(ingredients()));
        let completion = Arc::new(MockCompletion::replying("same"));
        let mut bodies = Vec::new();

        for _ in 0..2 {
            let app = app(
                ClientHandle::Ready(annotator.clone()),
                ClientHandle::Ready(completion.clone()),
            );
            let response = app
                .oneshot(multipart_request("/analyze-image", "image_file", "label.jpg", JPEG))
                .await
                .unwrap();
            bodies.push(json_body(response).await);
        }

        assert_eq!(bodies[0]["raw_text_detected"], bodies[1]["raw_text_detected"]);
        assert_eq!(bodies[0]["detected_labels"], bodies[1]["detected_labels"]);
    }
}
