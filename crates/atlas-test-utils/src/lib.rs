//! Shared testing utilities for the SAE Atlas workspace.
//!
//! - [`ScriptedSource`]: in-memory dataset source with per-key responses,
//!   failure injection, call counting and gates that hold a response back
//! - [`fixtures`]: small artifact documents shaped like the real ones
//! - [`server`]: an HTTP file server on an ephemeral port that logs every GET

pub mod fixtures;
pub mod server;
pub mod source;

pub use pretty_assertions;
pub use source::{Gate, ScriptedSource};
