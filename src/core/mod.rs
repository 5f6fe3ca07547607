//! Core types shared by the whole pipeline.
//!
//! This module contains:
//! - Configuration and its TOML loading
//! - Error types
//! - Image loading and normalization
//! - The `Plane` sample buffer and `FeatureMap`
//! - Statistical reductions

pub mod config;
pub mod error;
pub mod loader;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{ConfigError, DatasetError, ExtractionError, FeatureError, OutputError};
pub use types::{FeatureMap, Plane};
