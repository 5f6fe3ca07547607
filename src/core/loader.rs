//! Image loading and normalization.
//!
//! Every extractor sees the same input: an 8-bit grayscale image of the
//! configured size.

use crate::core::config::ImageConfig;
use crate::core::error::{ExtractionError, ExtractionResult};
use image::{DynamicImage, GrayImage, ImageReader};
use std::path::Path;

/// Load an image from disk and normalize it.
///
/// The format is detected from the file contents, so files without an
/// extension (or with a wrong one) still load.
pub fn load_normalized(path: &Path, config: &ImageConfig) -> ExtractionResult<GrayImage> {
    let load_error = |error: String| ExtractionError::ImageLoad {
        path: path.to_path_buf(),
        error,
    };
    let img = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| load_error(e.to_string()))?
        .decode()
        .map_err(|e| load_error(e.to_string()))?;
    Ok(normalize(&img, config))
}

/// Convert to 8-bit luma and resize to the configured dimensions.
///
/// Higher bit depths are rescaled to 0..=255 by the conversion.
pub fn normalize(img: &DynamicImage, config: &ImageConfig) -> GrayImage {
    let gray = img.to_luma8();
    if gray.dimensions() == (config.width, config.height) {
        return gray;
    }
    image::imageops::resize(
        &gray,
        config.width,
        config.height,
        config.resize_filter.into(),
    )
}
