//! Error types for malimg-features.
//!
//! Uses thiserror for structured errors with context. Errors are designed to:
//! - Say which image, extractor or file caused them
//! - Tell recoverable per-image failures apart from fatal ones
//! - Support error chaining through `#[from]` conversions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type.
///
/// This enum encompasses all error categories and enables automatic
/// conversion between specific error types.
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Extraction cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// Errors in the pipeline configuration.
///
/// These are caught before any image is touched.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("'{field}' must not be empty")]
    EmptyList { field: String },

    #[error("Unknown extractor '{id}'")]
    UnknownExtractor { id: String },

    #[error("Invalid file pattern '{pattern}': {error}")]
    InvalidPattern { pattern: String, error: String },

    #[error("No extractors enabled")]
    NoExtractorsEnabled,
}

/// Errors while turning one image into features.
#[derive(Error, Debug, Clone)]
pub enum ExtractionError {
    #[error("Failed to load {path}: {error}")]
    ImageLoad { path: PathBuf, error: String },

    #[error("Image is {width}x{height}, extractor '{extractor}' needs at least {min}x{min}")]
    ImageTooSmall {
        extractor: String,
        width: u32,
        height: u32,
        min: u32,
    },

    #[error("Extractor '{extractor}' failed: {error}")]
    Computation { extractor: String, error: String },
}

/// Errors while discovering or assembling the dataset.
#[derive(Error, Debug, Clone)]
pub enum DatasetError {
    #[error("Dataset folder not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("No class folders found in {path}")]
    NoClassFolders { path: PathBuf },

    #[error("Failed to read {path}: {error}")]
    ReadDir { path: PathBuf, error: String },

    #[error("No image could be processed ({skipped} skipped)")]
    NoImagesExtracted { skipped: usize },

    #[error("Column '{0}' not found in feature table")]
    ColumnNotFound(String),
}

/// Errors while writing tables to disk.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// Error Utilities
// ============================================================================

impl ConfigError {
    /// Get suggestion for fixing this error.
    pub fn suggested_fix(&self) -> Option<String> {
        match self {
            ConfigError::UnknownExtractor { .. } => Some(
                "Use one of: global, glcm, wavelet, gabor, lbp, hog".to_string(),
            ),
            ConfigError::EmptyList { field } => {
                Some(format!("Give '{}' at least one entry", field))
            }
            ConfigError::InvalidPattern { .. } => {
                Some("Use a glob such as '*.png' or 'sample_*'".to_string())
            }
            ConfigError::NoExtractorsEnabled => {
                Some("List at least one extractor under [extractors] enabled".to_string())
            }
            ConfigError::InvalidValue { .. } => None,
        }
    }
}

impl ExtractionError {
    /// Check if this error only affects the current image.
    ///
    /// Recoverable errors skip the image; the rest abort the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ExtractionError::ImageLoad { .. } | ExtractionError::ImageTooSmall { .. }
        )
    }

    /// Name of the extractor that failed, if any.
    pub fn extractor(&self) -> Option<&str> {
        match self {
            ExtractionError::ImageTooSmall { extractor, .. }
            | ExtractionError::Computation { extractor, .. } => Some(extractor),
            ExtractionError::ImageLoad { .. } => None,
        }
    }
}

impl DatasetError {
    /// Get suggestion for fixing this error.
    pub fn suggested_fix(&self) -> Option<String> {
        match self {
            DatasetError::RootNotFound { path } => Some(format!(
                "Check that '{}' exists or pass --dataset",
                path.display()
            )),
            DatasetError::NoClassFolders { .. } => {
                Some("Put each class's images in its own sub-folder".to_string())
            }
            _ => None,
        }
    }
}

/// Result type alias for pipeline operations.
pub type FeatureResult<T> = Result<T, FeatureError>;

/// Result type alias for extraction operations.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Result type alias for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Result type alias for output operations.
pub type OutputResult<T> = Result<T, OutputError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_errors_are_recoverable() {
        let error = ExtractionError::ImageLoad {
            path: PathBuf::from("broken.png"),
            error: "bad header".to_string(),
        };
        assert!(error.is_recoverable());
        assert!(error.extractor().is_none());

        let error = ExtractionError::Computation {
            extractor: "glcm".to_string(),
            error: "produced 3 values, expected 312".to_string(),
        };
        assert!(!error.is_recoverable());
        assert_eq!(error.extractor(), Some("glcm"));
    }

    #[test]
    fn test_config_error_suggestions() {
        let error = ConfigError::EmptyList {
            field: "glcm.distances".to_string(),
        };
        assert!(error.suggested_fix().unwrap().contains("glcm.distances"));
        assert!(ConfigError::InvalidValue {
            field: "image.width".to_string(),
            reason: "zero".to_string(),
        }
        .suggested_fix()
        .is_none());
    }

    #[test]
    fn test_conversion_into_feature_error() {
        let error: FeatureError = DatasetError::NoImagesExtracted { skipped: 3 }.into();
        assert!(matches!(error, FeatureError::Dataset(_)));
        assert!(error.to_string().contains("3 skipped"));
    }
}
