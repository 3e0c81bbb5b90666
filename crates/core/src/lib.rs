//! sdg-core
//!
//! Core library for statement-level program slicing.
//!
//! This crate defines the program model, call graph and points-to analysis,
//! the system dependence graph builder, the slicer and graph pruner, the
//! presentation helpers, and the project database.
//!
//! All substantive logic lives here so it is fully testable and reusable
//! from multiple frontends.

pub mod callgraph;
pub mod cancel;
pub mod db;
pub mod model;
pub mod pointsto;
pub mod present;
pub mod prune;
pub mod sdg;
pub mod services;
pub mod slicer;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
