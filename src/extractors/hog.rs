//! Gradient-magnitude summaries (a cheap stand-in for a full HOG descriptor).

use crate::core::error::ExtractionError;
use crate::core::stats;
use crate::core::types::FeatureMap;
use crate::extractors::{ensure_min_size, ExtractorMetadata, FeatureExtractor, FeatureFamily};
use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

const COLUMNS: [&str; 4] = [
    "hog_mean_grad",
    "hog_std_grad",
    "hog_max_grad",
    "hog_energy_grad",
];

/// Per-pixel Sobel gradient magnitude, row-major.
pub fn gradient_magnitude(image: &GrayImage) -> Vec<f64> {
    let gx = horizontal_sobel(image);
    let gy = vertical_sobel(image);
    gx.as_raw()
        .iter()
        .zip(gy.as_raw())
        .map(|(&x, &y)| {
            let (x, y) = (x as f64, y as f64);
            (x * x + y * y).sqrt()
        })
        .collect()
}

/// Sobel gradient-magnitude extractor.
#[derive(Debug, Clone, Default)]
pub struct HogExtractor;

impl HogExtractor {
    /// Create the extractor.
    pub fn new() -> Self {
        Self
    }
}

impl FeatureExtractor for HogExtractor {
    fn metadata(&self) -> ExtractorMetadata {
        ExtractorMetadata::builder("hog", "Gradient Summary")
            .description("Mean, std, max and energy of the 3x3 Sobel gradient magnitude")
            .family(FeatureFamily::Hog)
            .parameter("kernel", "sobel3x3")
            .column_count(COLUMNS.len())
            .build()
    }

    fn column_names(&self) -> Vec<String> {
        COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn extract(&self, image: &GrayImage) -> Result<FeatureMap, ExtractionError> {
        ensure_min_size("hog", image, 1)?;

        let mag = gradient_magnitude(image);
        let mut feat = FeatureMap::new();
        feat.insert("hog_mean_grad".into(), stats::mean(&mag));
        feat.insert("hog_std_grad".into(), stats::std_dev(&mag));
        feat.insert("hog_max_grad".into(), stats::max(&mag));
        feat.insert("hog_energy_grad".into(), stats::energy(&mag));
        Ok(feat)
    }
}
