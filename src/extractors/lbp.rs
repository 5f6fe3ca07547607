//! Uniform local binary pattern histogram summaries.

use crate::core::config::LbpConfig;
use crate::core::error::{ConfigError, ExtractionError};
use crate::core::stats;
use crate::core::types::FeatureMap;
use crate::extractors::{ensure_min_size, ExtractorMetadata, FeatureExtractor, FeatureFamily};
use image::GrayImage;
use std::f64::consts::PI;

const COLUMNS: [&str; 4] = ["lbp_entropy", "lbp_peak", "lbp_var", "lbp_uniform_ratio"];

/// Uniform LBP extractor.
#[derive(Debug, Clone)]
pub struct LbpExtractor {
    radius: f64,
    points: u32,
}

impl LbpExtractor {
    /// Create an extractor with `points` samples on a circle of `radius`.
    pub fn new(radius: f64, points: u32) -> Self {
        Self { radius, points }
    }

    /// Create an extractor from configuration.
    pub fn from_config(config: &LbpConfig) -> Self {
        Self::new(config.radius, config.points)
    }

    /// Number of histogram bins: `P + 1` uniform codes plus one non-uniform.
    pub fn bins(&self) -> usize {
        self.points as usize + 2
    }

    /// Circle sample offsets as `(row, col)`, rounded to 5 decimals.
    fn offsets(&self) -> Vec<(f64, f64)> {
        let p = self.points as f64;
        (0..self.points)
            .map(|i| {
                let angle = 2.0 * PI * i as f64 / p;
                (round5(-self.radius * angle.sin()), round5(self.radius * angle.cos()))
            })
            .collect()
    }

    /// Per-pixel uniform LBP codes in `0..=P+1`, row-major.
    pub fn codes(&self, image: &GrayImage) -> Vec<u32> {
        let (w, h) = image.dimensions();
        let offsets = self.offsets();
        let p = self.points as usize;
        let mut bits = vec![false; p];
        let mut codes = Vec::with_capacity((w * h) as usize);

        for r in 0..h as i64 {
            for c in 0..w as i64 {
                let center = image.get_pixel(c as u32, r as u32)[0] as f64;
                for (bit, (dr, dc)) in bits.iter_mut().zip(&offsets) {
                    *bit = bilinear(image, r as f64 + dr, c as f64 + dc) - center >= 0.0;
                }

                let changes = bits.windows(2).filter(|pair| pair[0] != pair[1]).count();
                let code = if changes <= 2 {
                    bits.iter().filter(|&&b| b).count() as u32
                } else {
                    self.points + 1
                };
                codes.push(code);
            }
        }
        codes
    }

    /// Density-normalized histogram of the codes.
    pub fn histogram(&self, image: &GrayImage) -> Vec<f64> {
        let mut counts = vec![0.0; self.bins()];
        for code in self.codes(image) {
            counts[code as usize] += 1.0;
        }
        stats::normalized_histogram(&counts)
    }
}

impl Default for LbpExtractor {
    fn default() -> Self {
        Self::from_config(&LbpConfig::default())
    }
}

fn round5(v: f64) -> f64 {
    (v * 1e5).round() / 1e5
}

/// Bilinear sample at fractional `(r, c)`; corners outside the image read 0.
fn bilinear(image: &GrayImage, r: f64, c: f64) -> f64 {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let pixel = |r: i64, c: i64| -> f64 {
        if r < 0 || c < 0 || r >= h || c >= w {
            0.0
        } else {
            image.get_pixel(c as u32, r as u32)[0] as f64
        }
    };

    let (r0, c0) = (r.floor(), c.floor());
    let (r1, c1) = (r.ceil(), c.ceil());
    let (dr, dc) = (r - r0, c - c0);
    let (r0, c0, r1, c1) = (r0 as i64, c0 as i64, r1 as i64, c1 as i64);

    let top = (1.0 - dc) * pixel(r0, c0) + dc * pixel(r0, c1);
    let bottom = (1.0 - dc) * pixel(r1, c0) + dc * pixel(r1, c1);
    (1.0 - dr) * top + dr * bottom
}

impl FeatureExtractor for LbpExtractor {
    fn metadata(&self) -> ExtractorMetadata {
        ExtractorMetadata::builder("lbp", "Local Binary Pattern")
            .description("Entropy, peak, variance and uniform ratio of the uniform LBP histogram")
            .family(FeatureFamily::Lbp)
            .parameter("radius", self.radius)
            .parameter("points", self.points)
            .column_count(COLUMNS.len())
            .build()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.radius > 0.0 && self.radius.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "lbp.radius".to_string(),
                reason: format!("radius must be positive, got {}", self.radius),
            });
        }
        if self.points == 0 {
            return Err(ConfigError::InvalidValue {
                field: "lbp.points".to_string(),
                reason: "at least one sampling point is required".to_string(),
            });
        }
        Ok(())
    }

    fn column_names(&self) -> Vec<String> {
        COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn extract(&self, image: &GrayImage) -> Result<FeatureMap, ExtractionError> {
        ensure_min_size("lbp", image, 1)?;

        let hist = self.histogram(image);
        let non_uniform = hist.last().copied().unwrap_or(0.0);

        let mut feat = FeatureMap::new();
        feat.insert("lbp_entropy".into(), stats::safe_entropy(&hist));
        feat.insert("lbp_peak".into(), stats::max(&hist));
        feat.insert("lbp_var".into(), stats::variance(&hist));
        feat.insert("lbp_uniform_ratio".into(), 1.0 - non_uniform);
        Ok(feat)
    }
}
