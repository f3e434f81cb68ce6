//! Label Analysis
//!
//! Sequences the vision call and the summary call for one uploaded image.
//! A vision failure ends the request; a summary failure only degrades the
//! summary text.

mod types;

use std::sync::Arc;
use std::time::Instant;

pub use types::{AnalysisError, LabelReport, SafetyReport, SafetyResults, UploadedImage};

use crate::state::ClientHandle;
use crate::summary::{self, CompletionProvider, SummaryOutcome};
use crate::vision::{self, DetectionResult, ImageAnnotator, SafetyTriage};

/// Orchestrates detection and summarization with injected clients
#[derive(Clone)]
pub struct LabelAnalyzer {
    vision: ClientHandle<Arc<dyn ImageAnnotator>>,
    completion: ClientHandle<Arc<dyn CompletionProvider>>,
}

impl LabelAnalyzer {
    pub fn new(
        vision: ClientHandle<Arc<dyn ImageAnnotator>>,
        completion: ClientHandle<Arc<dyn CompletionProvider>>,
    ) -> Self {
        Self { vision, completion }
    }

    pub fn vision_ready(&self) -> bool {
        self.vision.is_ready()
    }

    pub fn completion_ready(&self) -> bool {
        self.completion.is_ready()
    }

    fn annotator(&self) -> Result<&Arc<dyn ImageAnnotator>, AnalysisError> {
        self.vision.get().ok_or(AnalysisError::VisionUnavailable)
    }

    /// Run text and label detection on raw image bytes
    pub async fn detect(&self, image_data: &[u8]) -> Result<DetectionResult, AnalysisError> {
        let annotator = self.annotator()?;
        let annotations = annotator
            .annotate(image_data, &vision::analysis_features())
            .await?;
        Ok(DetectionResult::from_annotations(&annotations))
    }

    /// Summarize a detection; never fails
    pub async fn summarize(&self, detection: &DetectionResult) -> SummaryOutcome {
        summary::summarize(&self.completion, &detection.text, &detection.formatted_labels()).await
    }

    /// Full pipeline: detect, then summarize
    pub async fn analyze(&self, image: &UploadedImage) -> Result<LabelReport, AnalysisError> {
        let start = Instant::now();

        let detection = self.detect(&image.data).await.map_err(|e| {
            tracing::error!(filename = %image.filename, "Vision API/Processing Error: {}", e);
            e
        })?;

        tracing::debug!(
            filename = %image.filename,
            labels = detection.labels.len(),
            text_chars = detection.text.len(),
            "Detection complete"
        );

        let outcome = self.summarize(&detection).await;

        tracing::info!(
            filename = %image.filename,
            degraded = outcome.is_degraded(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Label analysis complete"
        );

        let detected_labels = detection.formatted_labels();
        Ok(LabelReport {
            summary: outcome.into_text(),
            raw_text_detected: detection.text,
            detected_labels,
        })
    }

    /// Labels plus safe-search verdict
    pub async fn triage(&self, image: &UploadedImage) -> Result<SafetyReport, AnalysisError> {
        let annotator = self.annotator()?;
        let annotations = annotator
            .annotate(&image.data, &vision::triage_features())
            .await
            .map_err(|e| {
                tracing::error!(filename = %image.filename, "Safety triage failed: {}", e);
                AnalysisError::from(e)
            })?;
        let triage = SafetyTriage::from_annotations(&annotations);

        Ok(SafetyReport {
            status: "success",
            analysis_results: SafetyResults {
                filename: image.filename.clone(),
                content_type: image.content_type.clone(),
                labels: triage.labels,
                safe_search_attributes: triage.safe_search,
            },
        })
    }
}
