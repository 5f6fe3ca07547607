//! Core value types shared by the extractors.
//!
//! Extractors read an 8-bit [`GrayImage`] and produce a [`FeatureMap`].
//! Intermediate responses (wavelet bands, filter outputs, gradients) are
//! held in a [`Plane`] of `f64` samples.

use image::GrayImage;
use indexmap::IndexMap;

/// Named feature values produced for one image.
///
/// Insertion order is kept so an extractor's output reads in the order it
/// was computed; the feature table sorts columns on its own.
pub type FeatureMap = IndexMap<String, f64>;

/// Row-major 2-D buffer of `f64` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Plane {
    /// Create a zero-filled plane.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Wrap existing row-major samples.
    ///
    /// Returns `None` if `data` does not hold exactly `width * height` samples.
    pub fn from_vec(width: usize, height: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self { width, height, data })
    }

    /// Convert an 8-bit image, multiplying every sample by `scale`.
    pub fn from_gray(image: &GrayImage, scale: f64) -> Self {
        let (width, height) = image.dimensions();
        let data = image.as_raw().iter().map(|&v| v as f64 * scale).collect();
        Self {
            width: width as usize,
            height: height as usize,
            data,
        }
    }

    /// Width in samples.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in samples.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the plane holds no samples.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    /// Set the sample at column `x`, row `y`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        self.data[y * self.width + x] = value;
    }

    /// One row of samples.
    pub fn row(&self, y: usize) -> &[f64] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// All samples in row-major order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to all samples in row-major order.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}
