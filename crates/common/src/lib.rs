//! Photo Align Common Utilities
//!
//! Shared infrastructure for all Photo Align crates:
//! - Error types and result aliases
//! - Capture clock for export file naming
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
