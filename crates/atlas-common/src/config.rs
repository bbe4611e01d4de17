//! Configuration loading for SAE Atlas.
//! Reads atlas.toml from the current directory or the path in the ATLAS_CONFIG env var.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::MAX_LAYERS;
use crate::error::{AtlasError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtlasConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where artifacts are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Http,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub source: SourceKind,
    /// Base URL the dataset keys are joined onto (http source)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Artifact directory (local source, and static serving)
    #[serde(default = "default_local_dir")]
    pub local_dir: String,
    #[serde(default = "default_n_layers")]
    pub n_layers: u32,
    /// Layer that causal patching and perturbation results were computed on
    #[serde(default = "default_causal_layer")]
    pub causal_layer: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url()     -> String { "http://127.0.0.1:3000/data/".to_string() }
fn default_local_dir()    -> String { "public/data".to_string() }
fn default_n_layers()     -> u32    { 18 }
fn default_causal_layer() -> u32    { 11 }
fn default_user_agent()   -> String { format!("sae-atlas/{}", env!("CARGO_PKG_VERSION")) }

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            base_url: default_base_url(),
            local_dir: default_local_dir(),
            n_layers: default_n_layers(),
            causal_layer: default_causal_layer(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Serve `data.local_dir` under `/data`
    #[serde(default = "bool_true")]
    pub serve_data_dir: bool,
}

fn default_bind() -> String { "127.0.0.1:3000".to_string() }
fn bool_true()    -> bool   { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind(), serve_data_dir: bool_true() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String { "atlas=debug,info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_filter() }
    }
}

impl AtlasConfig {
    /// Load configuration from atlas.toml.
    /// Checks ATLAS_CONFIG first, then the current directory. A missing file
    /// yields the defaults. `ATLAS_BIND` overrides `server.bind`.
    pub fn load() -> Result<Self> {
        let path = std::env::var("ATLAS_CONFIG").unwrap_or_else(|_| "atlas.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            info!("Config file {} not found, using defaults", path);
            Self::default()
        };

        if let Ok(bind) = std::env::var("ATLAS_BIND") {
            config.server.bind = bind;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AtlasError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let data = &self.data;
        if data.n_layers == 0 || data.n_layers > MAX_LAYERS {
            return Err(AtlasError::Config(format!(
                "data.n_layers must be between 1 and {MAX_LAYERS}, got {}",
                data.n_layers
            )));
        }
        if data.causal_layer >= data.n_layers {
            return Err(AtlasError::Config(format!(
                "data.causal_layer {} is not below data.n_layers {}",
                data.causal_layer, data.n_layers
            )));
        }
        if data.source == SourceKind::Http {
            reqwest::Url::parse(&data.base_url).map_err(|e| {
                AtlasError::Config(format!("data.base_url {:?}: {e}", data.base_url))
            })?;
        }
        Ok(())
    }
}
