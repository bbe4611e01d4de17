//! HTTP handlers for all web routes.

pub mod dashboard;
pub mod explore;
pub mod layers;
pub mod system;
