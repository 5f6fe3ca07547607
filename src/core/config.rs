//! Pipeline configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all) is a
//! valid configuration. Sections:
//!
//! ```toml
//! [dataset]
//! root = "data_prepared"
//! pattern = "*.png"
//!
//! [output]
//! root = "."
//! write_subsets = true
//!
//! [image]
//! width = 256
//! height = 256
//! resize_filter = "triangle"
//!
//! [glcm]
//! distances = [1, 2, 3, 4]
//! angles_deg = [0, 45, 90, 135]
//!
//! [lbp]
//! radius = 2.0
//! points = 16
//!
//! [gabor]
//! frequencies = [0.1, 0.2]
//! thetas_deg = [0.0, 45.0, 90.0, 135.0]
//!
//! [extractors]
//! enabled = ["global", "glcm", "wavelet", "gabor", "lbp", "hog"]
//!
//! [execution]
//! parallel = true
//! threads = 0
//! ```

use crate::core::error::{ConfigError, FeatureResult};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Ids of the built-in extractors, in registration order.
pub const BUILTIN_EXTRACTORS: [&str; 6] = ["global", "glcm", "wavelet", "gabor", "lbp", "hog"];

/// Complete configuration of one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Where the class folders live.
    pub dataset: DatasetConfig,
    /// Where and what to write.
    pub output: OutputConfig,
    /// Image normalization.
    pub image: ImageConfig,
    /// Co-occurrence matrix parameters.
    pub glcm: GlcmConfig,
    /// Local binary pattern parameters.
    pub lbp: LbpConfig,
    /// Gabor filter bank parameters.
    pub gabor: GaborConfig,
    /// Which extractors run.
    pub extractors: ExtractorsConfig,
    /// Parallelism settings.
    pub execution: ExecutionConfig,
}

/// Dataset location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Folder holding one sub-folder per class.
    pub root: PathBuf,
    /// Optional glob on file names (e.g. `*.png`).
    pub pattern: Option<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data_prepared"),
            pattern: None,
        }
    }
}

/// Output location and ARFF header text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Folder that receives `features/` and `arff/`.
    pub root: PathBuf,
    /// Whether to write the set and atomic subset files.
    pub write_subsets: bool,
    /// ARFF `@RELATION` name.
    pub relation: String,
    /// ARFF leading comment.
    pub description: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            write_subsets: true,
            relation: "malimg".to_string(),
            description: "Malimg Malware Classification".to_string(),
        }
    }
}

/// Resampling filter used when resizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    /// Nearest neighbour.
    Nearest,
    /// Bilinear.
    #[default]
    Triangle,
    /// Catmull-Rom cubic.
    CatmullRom,
    /// Gaussian.
    Gaussian,
    /// Lanczos with window 3.
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Image normalization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Resampling filter.
    pub resize_filter: ResizeFilter,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            resize_filter: ResizeFilter::Triangle,
        }
    }
}

/// Co-occurrence matrix settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlcmConfig {
    /// Pixel pair distances.
    pub distances: Vec<u32>,
    /// Pair directions in degrees; also used verbatim in column names.
    pub angles_deg: Vec<u32>,
}

impl Default for GlcmConfig {
    fn default() -> Self {
        Self {
            distances: vec![1, 2, 3, 4],
            angles_deg: vec![0, 45, 90, 135],
        }
    }
}

/// Local binary pattern settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LbpConfig {
    /// Sampling circle radius in pixels.
    pub radius: f64,
    /// Number of samples on the circle.
    pub points: u32,
}

impl Default for LbpConfig {
    fn default() -> Self {
        Self {
            radius: 2.0,
            points: 16,
        }
    }
}

/// Gabor filter bank settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaborConfig {
    /// Spatial frequencies in cycles per pixel (outer loop of the bank).
    pub frequencies: Vec<f64>,
    /// Orientations in degrees (inner loop of the bank).
    pub thetas_deg: Vec<f64>,
    /// Bandwidth in octaves.
    pub bandwidth: f64,
    /// Kernel half-extent in standard deviations.
    pub n_stds: f64,
}

impl Default for GaborConfig {
    fn default() -> Self {
        Self {
            frequencies: vec![0.1, 0.2],
            thetas_deg: vec![0.0, 45.0, 90.0, 135.0],
            bandwidth: 1.0,
            n_stds: 3.0,
        }
    }
}

/// Extractor selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorsConfig {
    /// Ids of the extractors to run.
    pub enabled: Vec<String>,
}

impl Default for ExtractorsConfig {
    fn default() -> Self {
        Self {
            enabled: BUILTIN_EXTRACTORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Parallelism settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Extract images in parallel.
    pub parallel: bool,
    /// Worker threads (0 = rayon's default).
    pub threads: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: 0,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> FeatureResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> FeatureResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Check the configuration for values no run could use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image.width == 0 || self.image.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "image".to_string(),
                reason: format!(
                    "size must be positive, got {}x{}",
                    self.image.width, self.image.height
                ),
            });
        }

        if let Some(pattern) = &self.dataset.pattern {
            glob::Pattern::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                error: e.to_string(),
            })?;
        }

        if self.extractors.enabled.is_empty() {
            return Err(ConfigError::NoExtractorsEnabled);
        }
        for id in &self.extractors.enabled {
            if !BUILTIN_EXTRACTORS.contains(&id.as_str()) {
                return Err(ConfigError::UnknownExtractor { id: id.clone() });
            }
        }

        if self.execution.threads > 1024 {
            return Err(ConfigError::InvalidValue {
                field: "execution.threads".to_string(),
                reason: format!("{} threads is not a sensible pool size", self.execution.threads),
            });
        }

        Ok(())
    }

    /// Whether the extractor with this id is enabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.extractors.enabled.iter().any(|e| e == id)
    }
}
