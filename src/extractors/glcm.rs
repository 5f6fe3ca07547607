//! Gray-Level Co-occurrence Matrix (GLCM) texture features
//!
//! Builds one symmetric, normalized 256-level GLCM per (distance, angle)
//! pair over the whole image and derives Haralick-style properties from it.
//! Values are then summarized across angles (per distance) and across
//! distances (from the per-distance angle means).
//!
//! Column layout for a property `p`:
//! - `glcm_d{d}_{p}_a{angle}`: raw value
//! - `glcm_d{d}_{p}_ang_mean` / `glcm_d{d}_{p}_ang_std`: across angles
//! - `glcm_{p}_dist_mean` / `glcm_{p}_dist_std`: across distances

use crate::core::config::GlcmConfig;
use crate::core::error::{ConfigError, ExtractionError};
use crate::core::stats;
use crate::core::types::FeatureMap;
use crate::extractors::{ensure_min_size, ExtractorMetadata, FeatureExtractor, FeatureFamily};
use image::GrayImage;
use indexmap::IndexMap;

/// Gray levels of an 8-bit image.
pub const LEVELS: usize = 256;

/// Standard deviations below this make correlation undefined; it is reported as 1.
const CORRELATION_EPS: f64 = 1e-15;

/// Properties derived from a normalized GLCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlcmProperty {
    /// Σ P(i-j)²
    Contrast,
    /// Σ P|i-j|
    Dissimilarity,
    /// Σ P / (1 + (i-j)²)
    Homogeneity,
    /// √ASM
    Energy,
    /// Linear dependency of gray levels
    Correlation,
    /// Angular second moment, Σ P²
    Asm,
    /// -Σ P log2 P
    Entropy,
    /// Largest entry
    MaxProbability,
    /// Mean of the row marginal
    MeanI,
    /// Mean of the column marginal
    MeanJ,
    /// Variance of the row marginal
    VarI,
    /// Variance of the column marginal
    VarJ,
}

impl GlcmProperty {
    /// The six classic Haralick properties.
    pub const BASE: [GlcmProperty; 6] = [
        GlcmProperty::Contrast,
        GlcmProperty::Dissimilarity,
        GlcmProperty::Homogeneity,
        GlcmProperty::Energy,
        GlcmProperty::Correlation,
        GlcmProperty::Asm,
    ];

    /// Derived properties computed from the matrix and its marginals.
    pub const EXTRA: [GlcmProperty; 6] = [
        GlcmProperty::Entropy,
        GlcmProperty::MaxProbability,
        GlcmProperty::MeanI,
        GlcmProperty::MeanJ,
        GlcmProperty::VarI,
        GlcmProperty::VarJ,
    ];

    /// Base properties followed by the extras.
    pub const ALL: [GlcmProperty; 12] = [
        GlcmProperty::Contrast,
        GlcmProperty::Dissimilarity,
        GlcmProperty::Homogeneity,
        GlcmProperty::Energy,
        GlcmProperty::Correlation,
        GlcmProperty::Asm,
        GlcmProperty::Entropy,
        GlcmProperty::MaxProbability,
        GlcmProperty::MeanI,
        GlcmProperty::MeanJ,
        GlcmProperty::VarI,
        GlcmProperty::VarJ,
    ];

    /// Name used in column names.
    pub fn name(&self) -> &'static str {
        match self {
            GlcmProperty::Contrast => "contrast",
            GlcmProperty::Dissimilarity => "dissimilarity",
            GlcmProperty::Homogeneity => "homogeneity",
            GlcmProperty::Energy => "energy",
            GlcmProperty::Correlation => "correlation",
            GlcmProperty::Asm => "ASM",
            GlcmProperty::Entropy => "entropy",
            GlcmProperty::MaxProbability => "max_probability",
            GlcmProperty::MeanI => "mean_i",
            GlcmProperty::MeanJ => "mean_j",
            GlcmProperty::VarI => "var_i",
            GlcmProperty::VarJ => "var_j",
        }
    }
}

/// `glcm_d{d}_{p}_a{angle}`
pub fn raw_column(distance: u32, prop: GlcmProperty, angle_deg: u32) -> String {
    format!("glcm_d{}_{}_a{}", distance, prop.name(), angle_deg)
}

/// `glcm_d{d}_{p}_ang_mean`
pub fn angle_mean_column(distance: u32, prop: GlcmProperty) -> String {
    format!("glcm_d{}_{}_ang_mean", distance, prop.name())
}

/// `glcm_d{d}_{p}_ang_std`
pub fn angle_std_column(distance: u32, prop: GlcmProperty) -> String {
    format!("glcm_d{}_{}_ang_std", distance, prop.name())
}

/// `glcm_{p}_dist_mean`
pub fn dist_mean_column(prop: GlcmProperty) -> String {
    format!("glcm_{}_dist_mean", prop.name())
}

/// `glcm_{p}_dist_std`
pub fn dist_std_column(prop: GlcmProperty) -> String {
    format!("glcm_{}_dist_std", prop.name())
}

/// A square, normalized co-occurrence matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CoMatrix {
    levels: usize,
    data: Vec<f64>,
}

impl CoMatrix {
    /// Count symmetric pixel pairs at `distance` along `angle` (radians).
    ///
    /// The pair offset is `(round(sin θ·d), round(cos θ·d))` in (row, col),
    /// so 90° pairs each pixel with the one below it. Pixel values must be
    /// below `levels`. The result is normalized to sum to 1 unless no pair
    /// fits inside the image, in which case it stays all zero.
    pub fn symmetric(image: &GrayImage, distance: u32, angle: f64, levels: usize) -> Self {
        let (width, height) = image.dimensions();
        let (rows, cols) = (height as isize, width as isize);
        let d = distance as f64;
        let dr = (angle.sin() * d).round() as isize;
        let dc = (angle.cos() * d).round() as isize;

        let mut counts = vec![0u32; levels * levels];
        let raw = image.as_raw();
        let row_range = 0isize.max(-dr)..rows.min(rows - dr);
        let col_range = 0isize.max(-dc)..cols.min(cols - dc);

        for r in row_range {
            for c in col_range.clone() {
                let i = raw[(r * cols + c) as usize] as usize;
                let j = raw[((r + dr) * cols + (c + dc)) as usize] as usize;
                counts[i * levels + j] += 1;
            }
        }

        let mut data = vec![0.0; levels * levels];
        for i in 0..levels {
            for j in 0..levels {
                data[i * levels + j] = (counts[i * levels + j] + counts[j * levels + i]) as f64;
            }
        }

        let total: f64 = data.iter().sum();
        if total > 0.0 {
            for v in &mut data {
                *v /= total;
            }
        }

        Self { levels, data }
    }

    /// Number of gray levels.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Entry `P[i, j]`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.levels + j]
    }

    /// Sum of all entries.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// All twelve properties, in [`GlcmProperty::ALL`] order.
    pub fn properties(&self) -> [f64; 12] {
        let n = self.levels;

        let mut pi = vec![0.0; n];
        let mut pj = vec![0.0; n];
        for i in 0..n {
            for j in 0..n {
                let p = self.data[i * n + j];
                pi[i] += p;
                pj[j] += p;
            }
        }
        let mean_i: f64 = pi.iter().enumerate().map(|(i, p)| i as f64 * p).sum();
        let mean_j: f64 = pj.iter().enumerate().map(|(j, p)| j as f64 * p).sum();
        let var_i: f64 = pi
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64 - mean_i).powi(2) * p)
            .sum();
        let var_j: f64 = pj
            .iter()
            .enumerate()
            .map(|(j, p)| (j as f64 - mean_j).powi(2) * p)
            .sum();

        let mut contrast = 0.0;
        let mut dissimilarity = 0.0;
        let mut homogeneity = 0.0;
        let mut asm = 0.0;
        let mut covariance = 0.0;
        let mut entropy = 0.0;
        let mut max_probability: f64 = 0.0;

        for i in 0..n {
            let di = i as f64 - mean_i;
            for j in 0..n {
                let p = self.data[i * n + j];
                if p == 0.0 {
                    continue;
                }
                let diff = i as f64 - j as f64;
                let diff2 = diff * diff;
                contrast += p * diff2;
                dissimilarity += p * diff.abs();
                homogeneity += p / (1.0 + diff2);
                asm += p * p;
                covariance += p * di * (j as f64 - mean_j);
                entropy -= p * p.log2();
                max_probability = max_probability.max(p);
            }
        }

        let (std_i, std_j) = (var_i.sqrt(), var_j.sqrt());
        let correlation = if std_i < CORRELATION_EPS || std_j < CORRELATION_EPS {
            1.0
        } else {
            covariance / (std_i * std_j)
        };

        [
            contrast,
            dissimilarity,
            homogeneity,
            asm.sqrt(),
            correlation,
            asm,
            entropy + 0.0,
            max_probability,
            mean_i,
            mean_j,
            var_i,
            var_j,
        ]
    }
}

/// Multi-distance, multi-angle GLCM extractor.
#[derive(Debug, Clone)]
pub struct GlcmExtractor {
    distances: Vec<u32>,
    angles_deg: Vec<u32>,
}

impl GlcmExtractor {
    /// Create an extractor for the given distances and angles (degrees).
    pub fn new(distances: Vec<u32>, angles_deg: Vec<u32>) -> Self {
        Self {
            distances,
            angles_deg,
        }
    }

    /// Create an extractor from configuration.
    pub fn from_config(config: &GlcmConfig) -> Self {
        Self::new(config.distances.clone(), config.angles_deg.clone())
    }

    /// Configured distances.
    pub fn distances(&self) -> &[u32] {
        &self.distances
    }

    /// Configured angles in degrees.
    pub fn angles_deg(&self) -> &[u32] {
        &self.angles_deg
    }
}

impl Default for GlcmExtractor {
    fn default() -> Self {
        Self::from_config(&GlcmConfig::default())
    }
}

impl FeatureExtractor for GlcmExtractor {
    fn metadata(&self) -> ExtractorMetadata {
        ExtractorMetadata::builder("glcm", "GLCM Texture")
            .description("Haralick properties of symmetric normalized co-occurrence matrices, summarized over angles and distances")
            .family(FeatureFamily::Glcm)
            .parameter("distances", format!("{:?}", self.distances))
            .parameter("angles_deg", format!("{:?}", self.angles_deg))
            .parameter("levels", LEVELS)
            .column_count(self.column_names().len())
            .build()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.distances.is_empty() {
            return Err(ConfigError::EmptyList {
                field: "glcm.distances".to_string(),
            });
        }
        if self.angles_deg.is_empty() {
            return Err(ConfigError::EmptyList {
                field: "glcm.angles_deg".to_string(),
            });
        }
        if self.distances.contains(&0) {
            return Err(ConfigError::InvalidValue {
                field: "glcm.distances".to_string(),
                reason: "distances must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn column_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for &d in &self.distances {
            for prop in GlcmProperty::ALL {
                for &a in &self.angles_deg {
                    names.push(raw_column(d, prop, a));
                }
                names.push(angle_mean_column(d, prop));
                names.push(angle_std_column(d, prop));
            }
        }
        for prop in GlcmProperty::ALL {
            names.push(dist_mean_column(prop));
            names.push(dist_std_column(prop));
        }
        names
    }

    fn extract(&self, image: &GrayImage) -> Result<FeatureMap, ExtractionError> {
        ensure_min_size("glcm", image, 1)?;

        let mut feat = FeatureMap::new();
        let mut dist_angle_means: IndexMap<GlcmProperty, Vec<f64>> = IndexMap::new();

        for &d in &self.distances {
            // per_angle[a][k] is property k at angle a
            let per_angle: Vec<[f64; 12]> = self
                .angles_deg
                .iter()
                .map(|&a| {
                    CoMatrix::symmetric(image, d, (a as f64).to_radians(), LEVELS).properties()
                })
                .collect();

            for (k, prop) in GlcmProperty::ALL.into_iter().enumerate() {
                let values: Vec<f64> = per_angle.iter().map(|props| props[k]).collect();
                for (&a, &v) in self.angles_deg.iter().zip(&values) {
                    feat.insert(raw_column(d, prop, a), v);
                }
                let angle_mean = stats::mean(&values);
                feat.insert(angle_mean_column(d, prop), angle_mean);
                feat.insert(angle_std_column(d, prop), stats::std_dev(&values));
                dist_angle_means.entry(prop).or_default().push(angle_mean);
            }
        }

        for (prop, means) in &dist_angle_means {
            feat.insert(dist_mean_column(*prop), stats::mean(means));
            feat.insert(dist_std_column(*prop), stats::std_dev(means));
        }

        Ok(feat)
    }
}
