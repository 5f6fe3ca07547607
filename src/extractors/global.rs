//! Whole-image statistics: intensity moments, histogram entropy, edge
//! density and Laplacian variance.

use crate::core::error::ExtractionError;
use crate::core::stats;
use crate::core::types::FeatureMap;
use crate::extractors::edges;
use crate::extractors::{ensure_min_size, ExtractorMetadata, FeatureExtractor, FeatureFamily};
use image::GrayImage;

/// Column holding the fraction of Canny edge pixels.
pub const EDGE_DENSITY: &str = "edge_density";
/// Column holding the variance of the Laplacian response.
pub const LAPLACIAN_VAR: &str = "laplacian_var";

const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

const COLUMNS: [&str; 10] = [
    "global_mean",
    "global_std",
    "global_min",
    "global_max",
    "global_skew",
    "global_kurt",
    "global_entropy",
    "global_uniformity",
    EDGE_DENSITY,
    LAPLACIAN_VAR,
];

/// Global intensity statistics.
#[derive(Debug, Clone, Default)]
pub struct GlobalExtractor;

impl GlobalExtractor {
    /// Create the extractor.
    pub fn new() -> Self {
        Self
    }
}

impl FeatureExtractor for GlobalExtractor {
    fn metadata(&self) -> ExtractorMetadata {
        ExtractorMetadata::builder("global", "Global Statistics")
            .description("Intensity moments, histogram entropy/uniformity, Canny edge density and Laplacian variance")
            .family(FeatureFamily::Global)
            .parameter("canny_low", CANNY_LOW)
            .parameter("canny_high", CANNY_HIGH)
            .column_count(COLUMNS.len())
            .build()
    }

    fn column_names(&self) -> Vec<String> {
        COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn extract(&self, image: &GrayImage) -> Result<FeatureMap, ExtractionError> {
        ensure_min_size("global", image, 1)?;

        let values: Vec<f64> = image.as_raw().iter().map(|&v| v as f64).collect();
        let (skew, kurt) = stats::skew_kurtosis(&values);
        let p = stats::normalized_histogram(&stats::byte_histogram(image.as_raw()));

        let mut feat = FeatureMap::new();
        feat.insert("global_mean".into(), stats::mean(&values));
        feat.insert("global_std".into(), stats::std_dev(&values));
        feat.insert("global_min".into(), stats::min(&values));
        feat.insert("global_max".into(), stats::max(&values));
        feat.insert("global_skew".into(), skew);
        feat.insert("global_kurt".into(), kurt);
        feat.insert("global_entropy".into(), stats::safe_entropy(&p));
        feat.insert(
            "global_uniformity".into(),
            p.iter().map(|v| v * v).sum(),
        );
        feat.insert(EDGE_DENSITY.into(), edge_density(image));
        feat.insert(LAPLACIAN_VAR.into(), laplacian_variance(image));
        Ok(feat)
    }
}

/// Fraction of pixels marked as edges by the Canny detector.
fn edge_density(image: &GrayImage) -> f64 {
    let map = edges::canny(image, CANNY_LOW, CANNY_HIGH);
    let total = map.as_raw().len();
    if total == 0 {
        return 0.0;
    }
    let marked = map.as_raw().iter().filter(|&&v| v > 0).count();
    marked as f64 / total as f64
}

/// Variance of the 4-neighbour Laplacian response.
fn laplacian_variance(image: &GrayImage) -> f64 {
    let lap = imageproc::filter::laplacian_filter(image);
    let values: Vec<f64> = lap.as_raw().iter().map(|&v| v as f64).collect();
    stats::variance(&values)
}
