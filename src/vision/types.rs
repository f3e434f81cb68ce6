//! Vision Types
//!
//! Wire types for the Cloud Vision `images:annotate` REST call and the
//! normalized detection results handed to the rest of the server.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Substituted for the OCR text when the image has no text annotations
pub const NO_TEXT_SENTINEL: &str = "No text detected";

/// Maximum number of labels kept from a detection
pub const MAX_LABELS: usize = 5;

/// Annotation feature requested from the vision service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureKind {
    TextDetection,
    LabelDetection,
    SafeSearchDetection,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

impl Feature {
    pub fn new(kind: FeatureKind) -> Self {
        Self { kind, max_results: None }
    }

    pub fn with_max_results(kind: FeatureKind, max_results: u32) -> Self {
        Self {
            kind,
            max_results: Some(max_results),
        }
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct AnnotateRequest {
    pub requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnnotateImageRequest {
    pub image: ImageContent,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageContent {
    /// Base64-encoded image bytes
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnnotateResponse {
    #[serde(default)]
    pub responses: Vec<ImageAnnotations>,
}

/// Annotations returned for a single image
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageAnnotations {
    pub text_annotations: Vec<EntityAnnotation>,
    pub label_annotations: Vec<EntityAnnotation>,
    pub safe_search_annotation: Option<SafeSearchAnnotation>,
    /// Per-image failure reported inside an otherwise successful response
    pub error: Option<RemoteStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EntityAnnotation {
    pub description: String,
    /// Label annotations are always scored, but the REST encoding drops
    /// zero-valued fields, so a missing score means 0.0. Text annotations
    /// carry none.
    pub score: f64,
}

impl EntityAnnotation {
    pub fn new(description: &str, score: f64) -> Self {
        Self {
            description: description.to_string(),
            score,
        }
    }
}

/// Safe-search likelihoods (`VERY_UNLIKELY` .. `VERY_LIKELY`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeSearchAnnotation {
    pub adult: String,
    pub spoof: String,
    pub medical: String,
    pub violence: String,
    pub racy: String,
}

impl Default for SafeSearchAnnotation {
    fn default() -> Self {
        let unknown = || "UNKNOWN".to_string();
        Self {
            adult: unknown(),
            spoof: unknown(),
            medical: unknown(),
            violence: unknown(),
            racy: unknown(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteStatus {
    pub code: i32,
    pub message: String,
}

// ============================================================================
// Normalized results
// ============================================================================

/// A label with its confidence rounded to two decimals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedLabel {
    pub description: String,
    pub score: f64,
}

impl DetectedLabel {
    fn from_annotation(annotation: &EntityAnnotation) -> Self {
        Self {
            description: annotation.description.clone(),
            score: round_score(annotation.score),
        }
    }
}

impl fmt::Display for DetectedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Score: {:.2})", self.description, self.score)
    }
}

/// OCR text plus the top labels for one image
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    /// Full-document text, never empty
    pub text: String,
    pub labels: Vec<DetectedLabel>,
}

impl DetectionResult {
    /// Normalize raw annotations.
    ///
    /// The first text annotation holds the whole-document text. Label order
    /// is kept as returned, which the service already sorts by confidence.
    pub fn from_annotations(annotations: &ImageAnnotations) -> Self {
        let text = annotations
            .text_annotations
            .first()
            .map(|a| a.description.as_str())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(NO_TEXT_SENTINEL)
            .to_string();

        Self {
            text,
            labels: top_labels(&annotations.label_annotations),
        }
    }

    /// Labels rendered as `"description (Score: 0.95)"`
    pub fn formatted_labels(&self) -> Vec<String> {
        self.labels.iter().map(ToString::to_string).collect()
    }
}

/// Labels and safe-search verdict for the safety triage endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyTriage {
    pub labels: Vec<DetectedLabel>,
    pub safe_search: SafeSearchAnnotation,
}

impl SafetyTriage {
    pub fn from_annotations(annotations: &ImageAnnotations) -> Self {
        Self {
            labels: top_labels(&annotations.label_annotations),
            safe_search: annotations.safe_search_annotation.clone().unwrap_or_default(),
        }
    }
}

fn top_labels(annotations: &[EntityAnnotation]) -> Vec<DetectedLabel> {
    annotations
        .iter()
        .take(MAX_LABELS)
        .map(DetectedLabel::from_annotation)
        .collect()
}

fn round_score(score: f64) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }
    (score.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// Vision error types
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("failed to obtain access token: {0}")]
    Auth(String),

    #[error("request to vision service failed: {0}")]
    Transport(String),

    #[error("vision service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("vision service rejected the image (code {code}): {message}")]
    Remote { code: i32, message: String },

    #[error("failed to parse vision response: {0}")]
    InvalidResponse(String),
}
