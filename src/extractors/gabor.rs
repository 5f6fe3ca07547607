//! Gabor filter bank responses.
//!
//! Each filter is a complex Gabor kernel; the image (scaled to [0, 1]) is
//! convolved with its real and imaginary parts and the response magnitude
//! is summarized by mean and standard deviation.

use crate::core::config::GaborConfig;
use crate::core::error::{ConfigError, ExtractionError};
use crate::core::stats;
use crate::core::types::{FeatureMap, Plane};
use crate::extractors::{ensure_min_size, ExtractorMetadata, FeatureExtractor, FeatureFamily};
use image::GrayImage;
use rayon::prelude::*;
use std::f64::consts::PI;

/// A sampled complex Gabor kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct GaborKernel {
    width: usize,
    height: usize,
    real: Vec<f64>,
    imag: Vec<f64>,
}

impl GaborKernel {
    /// Build an isotropic kernel for `frequency` (cycles/pixel) and
    /// orientation `theta` (radians).
    ///
    /// σ follows from the bandwidth in octaves; the kernel spans `n_stds`
    /// standard deviations (at least one pixel) on each side.
    pub fn new(frequency: f64, theta: f64, bandwidth: f64, n_stds: f64) -> Self {
        let sigma = sigma_prefactor(bandwidth) / frequency;
        let (ct, st) = (theta.cos(), theta.sin());

        let x0 = (n_stds * sigma * ct)
            .abs()
            .max((n_stds * sigma * st).abs())
            .max(1.0)
            .ceil() as isize;
        let y0 = x0;

        let width = (2 * x0 + 1) as usize;
        let height = (2 * y0 + 1) as usize;
        let norm = 2.0 * PI * sigma * sigma;

        let mut real = Vec::with_capacity(width * height);
        let mut imag = Vec::with_capacity(width * height);
        for y in -y0..=y0 {
            for x in -x0..=x0 {
                let (x, y) = (x as f64, y as f64);
                let rotx = x * ct + y * st;
                let roty = -x * st + y * ct;
                let envelope =
                    (-0.5 * (rotx * rotx + roty * roty) / (sigma * sigma)).exp() / norm;
                let phase = 2.0 * PI * frequency * rotx;
                real.push(envelope * phase.cos());
                imag.push(envelope * phase.sin());
            }
        }

        Self {
            width,
            height,
            real,
            imag,
        }
    }

    /// Kernel width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Kernel height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Sum of the real part.
    pub fn real_sum(&self) -> f64 {
        self.real.iter().sum()
    }

    /// Convolve `plane` with the kernel and return the response magnitude.
    ///
    /// Borders are extended by half-sample symmetric reflection. Rows are
    /// processed in parallel.
    pub fn magnitude(&self, plane: &Plane) -> Plane {
        let (w, h) = (plane.width(), plane.height());
        let (cx, cy) = ((self.width / 2) as isize, (self.height / 2) as isize);

        // col_index[x * kw + kx] is the source column for output x, tap kx
        let col_index: Vec<usize> = (0..w)
            .flat_map(|x| {
                (0..self.width).map(move |kx| reflect(x as isize + cx - kx as isize, w))
            })
            .collect();

        let mut out = Plane::new(w, h);
        out.as_mut_slice()
            .par_chunks_mut(w.max(1))
            .enumerate()
            .for_each(|(y, out_row)| {
                for (x, out_px) in out_row.iter_mut().enumerate() {
                    let cols = &col_index[x * self.width..(x + 1) * self.width];
                    let (mut re, mut im) = (0.0, 0.0);
                    for ky in 0..self.height {
                        let src = plane.row(reflect(y as isize + cy - ky as isize, h));
                        let k_re = &self.real[ky * self.width..(ky + 1) * self.width];
                        let k_im = &self.imag[ky * self.width..(ky + 1) * self.width];
                        for kx in 0..self.width {
                            let v = src[cols[kx]];
                            re += k_re[kx] * v;
                            im += k_im[kx] * v;
                        }
                    }
                    *out_px = (re * re + im * im).sqrt();
                }
            });
        out
    }
}

/// σ·f for a bandwidth `b` in octaves.
fn sigma_prefactor(bandwidth: f64) -> f64 {
    let b = 2f64.powf(bandwidth);
    (2f64.ln() / 2.0).sqrt() / PI * (b + 1.0) / (b - 1.0)
}

/// Map an index into `0..n` by half-sample symmetric reflection
/// (`d c b a | a b c d | d c b a`).
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    let m = i.rem_euclid(2 * n);
    (if m < n { m } else { 2 * n - 1 - m }) as usize
}

/// Gabor filter bank extractor.
#[derive(Debug, Clone)]
pub struct GaborExtractor {
    frequencies: Vec<f64>,
    thetas_deg: Vec<f64>,
    bandwidth: f64,
    n_stds: f64,
}

impl GaborExtractor {
    /// Create an extractor from configuration.
    pub fn from_config(config: &GaborConfig) -> Self {
        Self {
            frequencies: config.frequencies.clone(),
            thetas_deg: config.thetas_deg.clone(),
            bandwidth: config.bandwidth,
            n_stds: config.n_stds,
        }
    }

    /// Kernels in bank order: frequencies outer, orientations inner.
    pub fn kernels(&self) -> Vec<GaborKernel> {
        self.frequencies
            .iter()
            .flat_map(|&f| {
                self.thetas_deg
                    .iter()
                    .map(move |&t| GaborKernel::new(f, t.to_radians(), self.bandwidth, self.n_stds))
            })
            .collect()
    }

    fn bank_size(&self) -> usize {
        self.frequencies.len() * self.thetas_deg.len()
    }
}

impl Default for GaborExtractor {
    fn default() -> Self {
        Self::from_config(&GaborConfig::default())
    }
}

impl FeatureExtractor for GaborExtractor {
    fn metadata(&self) -> ExtractorMetadata {
        ExtractorMetadata::builder("gabor", "Gabor Bank")
            .description("Mean and std of complex Gabor response magnitudes over a frequency x orientation bank")
            .family(FeatureFamily::Gabor)
            .parameter("frequencies", format!("{:?}", self.frequencies))
            .parameter("thetas_deg", format!("{:?}", self.thetas_deg))
            .parameter("bandwidth", self.bandwidth)
            .parameter("n_stds", self.n_stds)
            .column_count(self.bank_size() * 2)
            .build()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.frequencies.is_empty() {
            return Err(ConfigError::EmptyList {
                field: "gabor.frequencies".to_string(),
            });
        }
        if self.thetas_deg.is_empty() {
            return Err(ConfigError::EmptyList {
                field: "gabor.thetas_deg".to_string(),
            });
        }
        if let Some(f) = self.frequencies.iter().find(|f| !(**f > 0.0 && f.is_finite())) {
            return Err(ConfigError::InvalidValue {
                field: "gabor.frequencies".to_string(),
                reason: format!("frequency must be positive, got {}", f),
            });
        }
        if !(self.bandwidth > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "gabor.bandwidth".to_string(),
                reason: format!("bandwidth must be positive, got {}", self.bandwidth),
            });
        }
        if !(self.n_stds > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "gabor.n_stds".to_string(),
                reason: format!("n_stds must be positive, got {}", self.n_stds),
            });
        }
        Ok(())
    }

    fn column_names(&self) -> Vec<String> {
        (0..self.bank_size())
            .flat_map(|idx| [format!("gabor_{}_mean", idx), format!("gabor_{}_std", idx)])
            .collect()
    }

    fn extract(&self, image: &GrayImage) -> Result<FeatureMap, ExtractionError> {
        ensure_min_size("gabor", image, 1)?;

        let plane = Plane::from_gray(image, 1.0 / 255.0);
        let mut feat = FeatureMap::new();
        for (idx, kernel) in self.kernels().iter().enumerate() {
            let mag = kernel.magnitude(&plane);
            feat.insert(format!("gabor_{}_mean", idx), stats::mean(mag.as_slice()));
            feat.insert(format!("gabor_{}_std", idx), stats::std_dev(mag.as_slice()));
        }
        Ok(feat)
    }
}
