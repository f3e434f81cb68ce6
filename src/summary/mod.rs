//! Summary Module
//!
//! Turns OCR text and detected labels into a nutrition summary using a chat
//! completion service. Failures here never fail a request: they degrade to a
//! diagnostic string so the caller still receives the OCR results.

mod extract;
mod prompt;
mod provider;

use std::sync::Arc;

pub use extract::{extract_completion_text, CompletionShape};
pub use prompt::{render_user_content, SYSTEM_PROMPT};
pub use provider::{CompletionError, CompletionProvider, OpenAiClient};

#[cfg(test)]
pub use provider::MockCompletion;

use crate::config::CompletionConfig;
use crate::state::ClientHandle;

/// Returned when no completion credential was configured
pub const NOT_CONFIGURED_DIAGNOSTIC: &str =
    "Analysis unavailable: the completion service is not configured. Set OPENAI_API_KEY.";

/// Returned when the completion service answered without usable text
pub const NO_ANALYSIS_DIAGNOSTIC: &str = "The AI could not generate an analysis for this label.";

/// Result of a summary attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Generated(String),
    Degraded(String),
}

impl SummaryOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) | Self::Degraded(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) | Self::Degraded(text) => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// Summarize OCR text and formatted labels
pub async fn summarize(
    handle: &ClientHandle<Arc<dyn CompletionProvider>>,
    ocr_text: &str,
    labels: &[String],
) -> SummaryOutcome {
    let Some(provider) = handle.get() else {
        tracing::warn!("Completion client not initialized, skipping summary");
        return SummaryOutcome::Degraded(NOT_CONFIGURED_DIAGNOSTIC.to_string());
    };

    let user_content = render_user_content(ocr_text, labels);
    let body = match provider.complete(SYSTEM_PROMPT, &user_content).await {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(provider = provider.name(), "Completion call failed: {}", e);
            return SummaryOutcome::Degraded(format!(
                "The AI could not generate an analysis: {}",
                e
            ));
        }
    };

    match extract_completion_text(&body) {
        Some((shape, text)) => {
            tracing::debug!(?shape, chars = text.len(), "Summary generated");
            SummaryOutcome::Generated(text)
        }
        None => {
            tracing::warn!(provider = provider.name(), "Completion response contained no text");
            SummaryOutcome::Degraded(NO_ANALYSIS_DIAGNOSTIC.to_string())
        }
    }
}

/// Build the process-wide completion handle
pub fn connect(config: &CompletionConfig) -> ClientHandle<Arc<dyn CompletionProvider>> {
    let Some(api_key) = config.api_key.as_deref() else {
        tracing::warn!("OPENAI_API_KEY not set, summaries are disabled");
        return ClientHandle::absent("OPENAI_API_KEY not set");
    };

    match OpenAiClient::new(config, api_key) {
        Ok(client) => {
            tracing::info!(model = client.model(), "OpenAI client initialized");
            ClientHandle::Ready(Arc::new(client))
        }
        Err(e) => {
            tracing::error!("Error initializing OpenAI client: {}", e);
            ClientHandle::absent(e.to_string())
        }
    }
}
