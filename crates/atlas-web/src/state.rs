//! Shared application state for the web server.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use atlas_common::{AtlasConfig, Result};
use atlas_data::DataLoader;

/// Shared state injected into every Axum handler.
///
/// Holds the single process-wide [`DataLoader`]; every request goes through
/// its cache.
#[derive(Debug, Clone)]
pub struct AppState {
    pub loader: Arc<DataLoader>,
    pub config: AtlasConfig,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(loader: Arc<DataLoader>, config: AtlasConfig) -> Self {
        Self { loader, config, started_at: Utc::now() }
    }

    pub fn from_config(config: AtlasConfig) -> Result<Self> {
        let loader = DataLoader::from_config(&config.data)?;
        Ok(Self::new(Arc::new(loader), config))
    }
}

pub type SharedState = Arc<AppState>;
