//! atlas-common — Shared artifact types, dataset keys, errors and configuration
//! used across all SAE Atlas crates.

pub mod artifacts;
pub mod config;
pub mod dataset;
pub mod error;

// Re-export commonly used types
pub use config::AtlasConfig;
pub use dataset::{Dataset, DatasetKey};
pub use error::{AtlasError, FailureReason, FetchFailure, Result};
