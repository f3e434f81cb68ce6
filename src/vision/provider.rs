//! Vision Providers
//!
//! Defines the annotator trait and the Cloud Vision REST implementation.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use base64::Engine;
use gcp_auth::TokenProvider;

use super::types::{
    AnnotateImageRequest, AnnotateRequest, AnnotateResponse, Feature, ImageAnnotations,
    ImageContent, VisionError,
};
use crate::config::VisionConfig;

const VISION_SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-vision"];

/// Image annotation backend
#[async_trait]
pub trait ImageAnnotator: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Annotate one image with the requested features
    async fn annotate(
        &self,
        image_data: &[u8],
        features: &[Feature],
    ) -> Result<ImageAnnotations, VisionError>;
}

/// How requests to Cloud Vision are authorized
#[derive(Clone)]
pub enum VisionAuth {
    /// OAuth bearer tokens from a service account or the default chain
    Token(Arc<dyn TokenProvider>),
    /// `?key=` query parameter
    ApiKey(String),
}

impl std::fmt::Debug for VisionAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("VisionAuth::Token"),
            Self::ApiKey(_) => f.write_str("VisionAuth::ApiKey(<redacted>)"),
        }
    }
}

/// Google Cloud Vision client
pub struct GoogleVisionClient {
    http: reqwest::Client,
    endpoint: String,
    auth: VisionAuth,
}

impl GoogleVisionClient {
    pub fn new(config: &VisionConfig, auth: VisionAuth) -> Result<Self, VisionError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VisionError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn annotate_url(&self) -> String {
        format!("{}/v1/images:annotate", self.endpoint)
    }
}

#[async_trait]
impl ImageAnnotator for GoogleVisionClient {
    fn name(&self) -> &str {
        "google-cloud-vision"
    }

    async fn annotate(
        &self,
        image_data: &[u8],
        features: &[Feature],
    ) -> Result<ImageAnnotations, VisionError> {
        let request = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(image_data),
                },
                features: features.to_vec(),
            }],
        };

        let builder = self.http.post(self.annotate_url()).json(&request);
        let builder = match &self.auth {
            VisionAuth::Token(provider) => {
                let token = provider
                    .token(VISION_SCOPES)
                    .await
                    .map_err(|e| VisionError::Auth(e.to_string()))?;
                builder.bearer_auth(token.as_str())
            }
            VisionAuth::ApiKey(key) => builder.query(&[("key", key)]),
        };

        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| VisionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Api {
                status: status.as_u16(),
                message: remote_error_message(&body),
            });
        }

        let parsed: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| VisionError::InvalidResponse(e.to_string()))?;

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Vision response received"
        );

        let annotations = parsed.responses.into_iter().next().unwrap_or_default();
        if let Some(error) = &annotations.error {
            return Err(VisionError::Remote {
                code: error.code,
                message: error.message.clone(),
            });
        }

        Ok(annotations)
    }
}

/// Pull `error.message` out of a Google API error body, or return it raw
fn remote_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Mock annotator for testing
#[cfg(test)]
pub struct MockAnnotator {
    pub response: Result<ImageAnnotations, String>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockAnnotator {
    pub fn returning(annotations: ImageAnnotations) -> Self {
        Self {
            response: Ok(annotations),
            calls: Default::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: Default::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl ImageAnnotator for MockAnnotator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn annotate(
        &self,
        _image_data: &[u8],
        _features: &[Feature],
    ) -> Result<ImageAnnotations, VisionError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.response.clone().map_err(|message| VisionError::Api {
            status: 403,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::vision::types::FeatureKind;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GoogleVisionClient {
        let mut config = Config::default().vision;
        config.endpoint = server.uri();
        config.timeout = Duration::from_secs(5);
        GoogleVisionClient::new(&config, VisionAuth::ApiKey("test-key".to_string())).unwrap()
    }

    fn features() -> Vec<Feature> {
        vec![
            Feature::new(FeatureKind::TextDetection),
            Feature::with_max_results(FeatureKind::LabelDetection, 5),
        ]
    }

    #[tokio::test]
    async fn test_annotate_sends_base64_image_and_features() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images:annotate"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "requests": [{
                    "image": {"content": "aGVsbG8="},
                    "features": [
                        {"type": "TEXT_DETECTION"},
                        {"type": "LABEL_DETECTION", "maxResults": 5}
                    ]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responses": [{
                    "textAnnotations": [{"description": "SUGAR"}],
                    "labelAnnotations": [{"description": "Food", "score": 0.95}]
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let annotations = client_for(&server).annotate(b"hello", &features()).await.unwrap();

        assert_eq!(annotations.text_annotations[0].description, "SUGAR");
        assert_eq!(annotations.label_annotations[0].description, "Food");
    }

    #[tokio::test]
    async fn test_http_error_carries_remote_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": 403, "message": "Cloud Vision API has not been used", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).annotate(b"img", &features()).await.unwrap_err();

        match err {
            VisionError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Cloud Vision API has not been used");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_per_image_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responses": [{"error": {"code": 3, "message": "Bad image data."}}]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).annotate(b"not-an-image", &features()).await.unwrap_err();

        assert!(matches!(err, VisionError::Remote { code: 3, .. }));
        assert!(err.to_string().contains("Bad image data."));
    }

    #[tokio::test]
    async fn test_empty_response_list_yields_empty_annotations() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"responses": [{}]})))
            .mount(&server)
            .await;

        let annotations = client_for(&server).annotate(b"img", &features()).await.unwrap();

        assert!(annotations.text_annotations.is_empty());
        assert!(annotations.label_annotations.is_empty());
    }

    #[test]
    fn test_remote_error_message_falls_back_to_body() {
        assert_eq!(remote_error_message("  upstream timeout \n"), "upstream timeout");
    }
}
