//! Application state.

use std::sync::Arc;

use grabtube_extractor::{VideoResolver, YtDlpResolver};

use crate::config::ApiConfig;

/// Shared application state.
///
/// Holds no per-video cache: every request re-resolves through the
/// extractor, including between a menu listing and a later download of the
/// same video.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub resolver: Arc<dyn VideoResolver>,
}

impl AppState {
    /// Create application state with the production extractor.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let resolver = YtDlpResolver::from_env().await?;
        Ok(Self::with_resolver(config, Arc::new(resolver)))
    }

    /// Create application state with an explicit resolver (test seam).
    pub fn with_resolver(config: ApiConfig, resolver: Arc<dyn VideoResolver>) -> Self {
        Self { config, resolver }
    }
}
