//! Data access layer for the SAE Atlas explorer.
//!
//! Resolves a [`Dataset`](atlas_common::Dataset) to its route, fetches it,
//! decodes the JSON and memoizes the decoded value for the rest of the
//! process. Views consume it either directly through [`DataLoader`] or
//! through a [`Subscription`], which tracks a `{data, loading, error}` state
//! and drops results that arrive after the view moved on.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use atlas_data::{DataLoader, HttpSource, Subscription};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let source = HttpSource::new("http://127.0.0.1:3000/data/")?;
//!     let loader = Arc::new(DataLoader::new(Arc::new(source), 18));
//!
//!     // Direct load; the second call is served from the cache
//!     let summary = loader.global_summary().await?;
//!     println!("{} features", summary.total_features);
//!
//!     // View-style subscription keyed on the selected layer
//!     let features = Subscription::new();
//!     let l = Arc::clone(&loader);
//!     features.use_dataset(3u32, move || async move { l.layer_features(3).await });
//!     let state = features.settled().await;
//!     println!("loading={} error={:?}", state.loading, state.error);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod loader;
pub mod source;
pub mod subscription;

pub use cache::{CacheEntryInfo, CacheStats, DatasetCache};
pub use loader::DataLoader;
pub use source::{DatasetSource, HttpSource, LocalDirSource};
pub use subscription::{DatasetState, Subscription};
