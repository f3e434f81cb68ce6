//! Vision Module
//!
//! Text and label detection through Google Cloud Vision.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use label_lens_server::vision;
//!
//! let handle = vision::connect(&config.vision).await;
//! if let Some(annotator) = handle.get() {
//!     let annotations = annotator.annotate(&bytes, &vision::analysis_features()).await?;
//!     let detection = DetectionResult::from_annotations(&annotations);
//! }
//! ```

mod credentials;
mod provider;
mod types;

use std::sync::Arc;

pub use credentials::{
    decode_inline_payload, resolve, CredentialError, CredentialSource, ResolvedCredentials,
};
pub use provider::{GoogleVisionClient, ImageAnnotator, VisionAuth};
pub use types::{
    DetectedLabel, DetectionResult, EntityAnnotation, Feature, FeatureKind, ImageAnnotations,
    RemoteStatus, SafeSearchAnnotation, SafetyTriage, VisionError, MAX_LABELS, NO_TEXT_SENTINEL,
};

#[cfg(test)]
pub use provider::MockAnnotator;

use crate::config::VisionConfig;
use crate::state::ClientHandle;

/// Features requested for label analysis
pub fn analysis_features() -> Vec<Feature> {
    vec![
        Feature::new(FeatureKind::TextDetection),
        Feature::with_max_results(FeatureKind::LabelDetection, MAX_LABELS as u32),
    ]
}

/// Features requested for safety triage
pub fn triage_features() -> Vec<Feature> {
    vec![
        Feature::with_max_results(FeatureKind::LabelDetection, MAX_LABELS as u32),
        Feature::new(FeatureKind::SafeSearchDetection),
    ]
}

/// Build the process-wide vision handle.
///
/// Never fails: any credential or client construction problem is logged and
/// yields an absent handle.
pub async fn connect(config: &VisionConfig) -> ClientHandle<Arc<dyn ImageAnnotator>> {
    into_handle(config, resolve(config).await)
}

fn into_handle(
    config: &VisionConfig,
    resolved: Result<ResolvedCredentials, CredentialError>,
) -> ClientHandle<Arc<dyn ImageAnnotator>> {
    let resolved = match resolved {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!("Error initializing Google Vision client: {}", e);
            return ClientHandle::absent(e.to_string());
        }
    };

    match GoogleVisionClient::new(config, resolved.auth) {
        Ok(client) => {
            tracing::info!("Google Vision client initialized from {}", resolved.source);
            ClientHandle::Ready(Arc::new(client))
        }
        Err(e) => {
            tracing::error!("Error initializing Google Vision client: {}", e);
            ClientHandle::absent(e.to_string())
        }
    }
}
