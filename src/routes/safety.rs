//! Safety triage endpoint
//!
//! POST /safety-check returns labels and the safe-search verdict without
//! running a summary.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};

use super::upload::read_image;
use crate::analysis::SafetyReport;
use crate::error::Result;
use crate::state::AppState;

pub async fn safety_check(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<SafetyReport>> {
    let image = read_image(multipart, state.config().server.max_upload_bytes).await?;
    let report = state.analyzer().triage(&image).await?;

    tracing::info!(
        filename = %image.filename,
        labels = report.analysis_results.labels.len(),
        adult = %report.analysis_results.safe_search_attributes.adult,
        "Safety triage complete"
    );

    Ok(Json(report))
}
