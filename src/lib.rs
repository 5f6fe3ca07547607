//! # malimg-features - texture features for malware images
//!
//! Turns a folder of grayscale malware images (one sub-folder per family)
//! into feature tables for machine-learning workbenches. Every image yields
//! a few hundred texture descriptors; the full table is then sliced into
//! many subsets and written as both CSV and ARFF.
//!
//! ## Features
//!
//! - **Texture descriptors**: global statistics, multi-distance/angle GLCM,
//!   Haar wavelet sub-bands, a Gabor bank, uniform LBP and a gradient summary
//! - **Deterministic tables**: rows in class then file order, columns sorted
//! - **Parallel extraction**: images of a class are processed with rayon
//! - **Subset fan-out**: family sets plus per-distance/angle/property GLCM
//!   files, selected by column naming convention
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use malimg_features::prelude::*;
//!
//! let mut config = PipelineConfig::default();
//! config.dataset.root = "data_prepared".into();
//! config.output.root = "out".into();
//!
//! let report = run_pipeline(&config, None)?;
//! println!("{} images, {} columns", report.stats.images_processed, report.columns);
//! ```
//!
//! Extractors can also be used on their own:
//!
//! ```rust,ignore
//! use malimg_features::prelude::*;
//!
//! let image = image::open("sample.png")?.to_luma8();
//! let features = GlcmExtractor::default().extract(&image)?;
//! println!("{}", features["glcm_contrast_dist_mean"]);
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: configuration, errors, image loading and numeric helpers
//! - [`extractors`]: the [`FeatureExtractor`](extractors::FeatureExtractor)
//!   trait, the built-in extractors and their registry
//! - [`dataset`]: class-folder discovery and the feature table
//! - [`execution`]: the extraction engine, progress reporting and the
//!   end-to-end pipeline
//! - [`output`]: CSV/ARFF writers and the subset generator

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod dataset;
pub mod execution;
pub mod extractors;
pub mod output;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use malimg_features::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::config::{
        DatasetConfig, ExecutionConfig, ExtractorsConfig, GaborConfig, GlcmConfig, ImageConfig,
        LbpConfig, OutputConfig, PipelineConfig, ResizeFilter,
    };
    pub use crate::core::loader::{load_normalized, normalize};
    pub use crate::core::types::{FeatureMap, Plane};

    // Errors
    pub use crate::core::error::{
        ConfigError, DatasetError, ExtractionError, FeatureError, FeatureResult, OutputError,
    };

    // Extractors
    pub use crate::extractors::{
        ExtractorMetadata, ExtractorRegistry, FeatureExtractor, FeatureFamily, GaborExtractor,
        GlcmExtractor, GlobalExtractor, HogExtractor, LbpExtractor, WaveletExtractor,
    };

    // Dataset
    pub use crate::dataset::{DatasetIndex, FeatureRecord, FeatureTable, LABEL_COLUMN};

    // Execution
    pub use crate::execution::{
        run_pipeline, ExtractionEngine, ExtractionOptions, ExtractionOutput, ExtractionStats,
        PipelineReport, ProgressCallback, ProgressTracker, ProgressUpdate,
    };

    // Output
    pub use crate::output::{ArffHeader, OutputLayout, SubsetGroup, SubsetWriter, WriteSummary};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "malimg-features");
    }

    #[test]
    fn test_registry_with_builtins() {
        let registry = ExtractorRegistry::with_builtins();
        for id in ["global", "glcm", "wavelet", "gabor", "lbp", "hog"] {
            assert!(registry.contains(id), "{}", id);
        }
    }

    #[test]
    fn test_extract_all_columns_are_announced() {
        let registry = ExtractorRegistry::with_builtins();
        let img = GrayImage::from_fn(16, 16, |x, y| Luma([((x * y) % 256) as u8]));
        let features = registry.extract_all(&img).unwrap();

        assert_eq!(features.len(), registry.enabled_column_count());
        for (id, _) in registry.entries() {
            for column in registry.column_names(id).unwrap() {
                assert!(features.contains_key(&column), "{} missing {}", id, column);
                assert!(features[&column].is_finite(), "{} is not finite", column);
            }
        }
    }
}
