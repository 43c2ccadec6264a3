//! Ambience Analyzer Library
//!
//! Measures ambient-sound assets once and caches their playback profiles.
//!
//! This library exposes the core components for testing purposes.

pub mod config;
pub mod error;
pub mod service;

// Re-export commonly used types for convenience
pub use config::AnalyzerConfig;
pub use error::{AnalyzerError, Result};
pub use service::{asset_id, ProfileService, ProfileSource};
