//! Execution module.
//!
//! This module runs the extractors over a dataset and drives the full
//! scan, extract and write pipeline.

pub mod engine;
pub mod pipeline;
pub mod progress;

pub use engine::{ExtractionEngine, ExtractionOptions, ExtractionOutput, ExtractionStats};
pub use pipeline::{run_pipeline, PipelineReport};
pub use progress::{ProgressCallback, ProgressTracker, ProgressUpdate};
