//! # biblio shared
//!
//! Common types used across all biblio crates: errors, the configuration
//! file, the catalogue of supported APIs and helpers for the JSON the
//! APIs return.

pub mod api;
pub mod config;
pub mod error;
pub mod ids;
pub mod integrity;
pub mod parse;

// Re-exports
pub use api::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use integrity::*;

/// Crate version reported in the `User-Agent` header
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How to cite the underlying methodology
pub const CITATION: &str = "Rose, Michael E. and John R. Kitchin: \"pybliometrics: \
Scriptable bibliometrics using a Python interface to Scopus\", SoftwareX 10 (2019) 100263.";
