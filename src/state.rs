//! Application state management

use std::sync::Arc;

use crate::analysis::LabelAnalyzer;
use crate::config::Config;

/// A remote client built once at startup.
///
/// An absent handle stays absent for the life of the process; requests that
/// need it fail fast instead of retrying construction.
#[derive(Clone)]
pub enum ClientHandle<T> {
    Ready(T),
    Absent { reason: String },
}

impl<T> ClientHandle<T> {
    pub fn absent(reason: impl Into<String>) -> Self {
        Self::Absent {
            reason: reason.into(),
        }
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Ready(client) => Some(client),
            Self::Absent { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl<T> std::fmt::Debug for ClientHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Ready"),
            Self::Absent { reason } => f.debug_struct("Absent").field("reason", reason).finish(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    analyzer: LabelAnalyzer,
}

impl AppState {
    pub fn new(config: Config, analyzer: LabelAnalyzer) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, analyzer }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the label analyzer
    pub fn analyzer(&self) -> &LabelAnalyzer {
        &self.inner.analyzer
    }
}
