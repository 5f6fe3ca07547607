//! Feature extractors.
//!
//! Each extractor maps one normalized grayscale image to a flat
//! [`FeatureMap`]. Extractors use a two-phase design: parameter validation
//! (once, before any image is read) and extraction (once per image).

pub mod edges;
pub mod gabor;
pub mod glcm;
pub mod global;
pub mod hog;
pub mod lbp;
pub mod registry;
pub mod wavelet;

use crate::core::error::{ConfigError, ExtractionError};
use crate::core::types::FeatureMap;
use image::GrayImage;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use gabor::GaborExtractor;
pub use glcm::GlcmExtractor;
pub use global::GlobalExtractor;
pub use hog::HogExtractor;
pub use lbp::LbpExtractor;
pub use registry::{ExtractorRegistry, RegistryEntry};
pub use wavelet::WaveletExtractor;

/// Feature family, used to group columns into subset files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFamily {
    /// Whole-image intensity statistics, edge density and Laplacian variance
    Global,
    /// Gray-level co-occurrence statistics
    Glcm,
    /// Haar wavelet sub-band summaries
    Wavelet,
    /// Gabor filter bank responses
    Gabor,
    /// Local binary pattern histogram summaries
    Lbp,
    /// Gradient-magnitude summaries
    Hog,
}

impl FeatureFamily {
    /// Get the display name for this family.
    pub fn display_name(&self) -> &'static str {
        match self {
            FeatureFamily::Global => "Global",
            FeatureFamily::Glcm => "GLCM",
            FeatureFamily::Wavelet => "Wavelet",
            FeatureFamily::Gabor => "Gabor",
            FeatureFamily::Lbp => "LBP",
            FeatureFamily::Hog => "HOG",
        }
    }

    /// Get all families in display order.
    pub fn all() -> &'static [FeatureFamily] {
        &[
            FeatureFamily::Global,
            FeatureFamily::Glcm,
            FeatureFamily::Wavelet,
            FeatureFamily::Gabor,
            FeatureFamily::Lbp,
            FeatureFamily::Hog,
        ]
    }

    /// Whether a column name belongs to this family.
    ///
    /// Families are recognized purely by naming convention.
    pub fn owns_column(&self, column: &str) -> bool {
        match self {
            FeatureFamily::Global => {
                column.starts_with("global_")
                    || column == global::EDGE_DENSITY
                    || column == global::LAPLACIAN_VAR
            }
            FeatureFamily::Glcm => column.starts_with("glcm_"),
            FeatureFamily::Wavelet => column.starts_with("wav_"),
            FeatureFamily::Gabor => column.starts_with("gabor_"),
            FeatureFamily::Lbp => column.starts_with("lbp_"),
            FeatureFamily::Hog => column.starts_with("hog_"),
        }
    }
}

/// Metadata describing an extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorMetadata {
    /// Unique identifier (e.g. "glcm")
    pub id: String,
    /// Human-readable name (e.g. "GLCM Texture")
    pub name: String,
    /// Family of the produced columns
    pub family: FeatureFamily,
    /// Detailed description
    pub description: String,
    /// Parameter values, rendered for display
    pub parameters: IndexMap<String, String>,
    /// Number of columns produced per image
    pub column_count: usize,
}

impl ExtractorMetadata {
    /// Create a new metadata builder.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> ExtractorMetadataBuilder {
        ExtractorMetadataBuilder::new(id, name)
    }
}

/// Builder for ExtractorMetadata.
pub struct ExtractorMetadataBuilder {
    id: String,
    name: String,
    family: FeatureFamily,
    description: String,
    parameters: IndexMap<String, String>,
    column_count: usize,
}

impl ExtractorMetadataBuilder {
    /// Create a new builder with required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            family: FeatureFamily::Global,
            description: String::new(),
            parameters: IndexMap::new(),
            column_count: 0,
        }
    }

    /// Set the family.
    pub fn family(mut self, family: FeatureFamily) -> Self {
        self.family = family;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Record a parameter value.
    pub fn parameter(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.parameters.insert(name.into(), value.to_string());
        self
    }

    /// Set the number of produced columns.
    pub fn column_count(mut self, count: usize) -> Self {
        self.column_count = count;
        self
    }

    /// Build the metadata.
    pub fn build(self) -> ExtractorMetadata {
        ExtractorMetadata {
            id: self.id,
            name: self.name,
            family: self.family,
            description: self.description,
            parameters: self.parameters,
            column_count: self.column_count,
        }
    }
}

/// Trait implemented by every feature extractor.
pub trait FeatureExtractor: Send + Sync {
    /// Describe this extractor.
    fn metadata(&self) -> ExtractorMetadata;

    /// Check the extractor's parameters before any image is processed.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Names of the columns `extract` produces, in production order.
    fn column_names(&self) -> Vec<String>;

    /// Compute features for one normalized image.
    fn extract(&self, image: &GrayImage) -> Result<FeatureMap, ExtractionError>;
}

/// Reject images smaller than `min` pixels on either side.
pub(crate) fn ensure_min_size(
    extractor: &str,
    image: &GrayImage,
    min: u32,
) -> Result<(), ExtractionError> {
    let (width, height) = image.dimensions();
    if width < min || height < min {
        return Err(ExtractionError::ImageTooSmall {
            extractor: extractor.to_string(),
            width,
            height,
            min,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_column_ownership() {
        assert!(FeatureFamily::Global.owns_column("global_mean"));
        assert!(FeatureFamily::Global.owns_column("edge_density"));
        assert!(FeatureFamily::Global.owns_column("laplacian_var"));
        assert!(!FeatureFamily::Global.owns_column("glcm_ASM_dist_mean"));
        assert!(FeatureFamily::Glcm.owns_column("glcm_d1_contrast_a0"));
        assert!(FeatureFamily::Wavelet.owns_column("wav_LL_mean"));
        assert!(FeatureFamily::Gabor.owns_column("gabor_3_std"));
        assert!(FeatureFamily::Lbp.owns_column("lbp_peak"));
        assert!(FeatureFamily::Hog.owns_column("hog_max_grad"));
        assert!(!FeatureFamily::Hog.owns_column("class"));
    }

    #[test]
    fn test_metadata_builder() {
        let metadata = ExtractorMetadata::builder("demo", "Demo")
            .family(FeatureFamily::Hog)
            .description("demo extractor")
            .parameter("radius", 2)
            .column_count(4)
            .build();

        assert_eq!(metadata.id, "demo");
        assert_eq!(metadata.family, FeatureFamily::Hog);
        assert_eq!(metadata.parameters["radius"], "2");
        assert_eq!(metadata.column_count, 4);
    }

    #[test]
    fn test_ensure_min_size() {
        let img = GrayImage::new(2, 8);
        assert!(ensure_min_size("x", &img, 2).is_ok());
        let err = ensure_min_size("x", &img, 3).unwrap_err();
        assert!(err.is_recoverable());
    }
}
