//! Analysis Types

use axum::body::Bytes;
use serde::Serialize;

use crate::vision::{DetectedLabel, SafeSearchAnnotation, VisionError};

/// An uploaded image, alive for one request
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Body returned by the analyze endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelReport {
    pub summary: String,
    pub raw_text_detected: String,
    pub detected_labels: Vec<String>,
}

/// Body returned by the safety-check endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SafetyReport {
    pub status: &'static str,
    pub analysis_results: SafetyResults,
}

#[derive(Debug, Clone, Serialize)]
pub struct SafetyResults {
    pub filename: String,
    pub content_type: String,
    pub labels: Vec<DetectedLabel>,
    pub safe_search_attributes: SafeSearchAnnotation,
}

/// Failures that abort an analysis request
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Google Cloud Vision client is not initialized. Check GOOGLE_APPLICATION_CREDENTIALS.")]
    VisionUnavailable,

    #[error("Image processing failed with Google Cloud Vision: {0}")]
    Vision(#[from] VisionError),
}
