//! atlas-web — HTTP surface of the SAE Atlas explorer.
//! Provides:
//!   - An HTML landing page with the per-layer summary table
//!   - A JSON API for every explorer view (layers, features, modules, search,
//!     causal and perturbation rankings, cross-layer dependencies, baseline)
//!   - Optional static serving of the artifact directory under `/data`

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
