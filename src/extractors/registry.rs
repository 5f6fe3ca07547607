//! Extractor registry for managing the enabled extractors.

use crate::core::config::PipelineConfig;
use crate::core::error::{ConfigError, ExtractionError};
use crate::core::types::FeatureMap;
use crate::extractors::{
    ExtractorMetadata, FeatureExtractor, FeatureFamily, GaborExtractor, GlcmExtractor,
    GlobalExtractor, HogExtractor, LbpExtractor, WaveletExtractor,
};
use image::GrayImage;
use indexmap::IndexMap;
use std::sync::Arc;

/// Registry entry containing metadata and the shared extractor instance.
#[derive(Clone)]
pub struct RegistryEntry {
    /// Cached metadata.
    pub metadata: ExtractorMetadata,
    /// Instance used by `extract_all`.
    instance: Arc<dyn FeatureExtractor>,
    /// Whether this extractor runs.
    pub enabled: bool,
}

/// Registry of the extractors available to a run.
///
/// Extractors run in registration order; disabled ones stay registered so
/// their metadata can still be listed.
pub struct ExtractorRegistry {
    /// Extractors indexed by their unique ID.
    extractors: IndexMap<String, RegistryEntry>,
    /// Extractor IDs grouped by family.
    families: IndexMap<FeatureFamily, Vec<String>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            extractors: IndexMap::new(),
            families: IndexMap::new(),
        }
    }

    /// Create a registry of the built-in extractors with default parameters.
    pub fn with_builtins() -> Self {
        Self::from_config(&PipelineConfig::default())
    }

    /// Create the built-in extractors parameterized by `config`.
    ///
    /// Extractors not listed in `extractors.enabled` are registered disabled.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut registry = Self::new();

        registry.register(GlobalExtractor::new());
        registry.register(GlcmExtractor::from_config(&config.glcm));
        registry.register(WaveletExtractor::new());
        registry.register(GaborExtractor::from_config(&config.gabor));
        registry.register(LbpExtractor::from_config(&config.lbp));
        registry.register(HogExtractor::new());

        let ids: Vec<String> = registry.extractors.keys().cloned().collect();
        for id in ids {
            let enabled = config.is_enabled(&id);
            registry.set_enabled(&id, enabled);
        }

        registry
    }

    /// Register an extractor, enabled. An extractor with the same id is
    /// replaced in place.
    pub fn register<E>(&mut self, extractor: E)
    where
        E: FeatureExtractor + 'static,
    {
        let metadata = extractor.metadata();
        let id = metadata.id.clone();
        let family = metadata.family;

        let entry = RegistryEntry {
            metadata,
            instance: Arc::new(extractor),
            enabled: true,
        };

        if self.extractors.insert(id.clone(), entry).is_none() {
            self.families.entry(family).or_default().push(id);
        }
    }

    /// Get metadata for an extractor without creating an instance.
    pub fn get_metadata(&self, id: &str) -> Option<&ExtractorMetadata> {
        self.extractors.get(id).map(|e| &e.metadata)
    }

    /// Column names an extractor produces.
    pub fn column_names(&self, id: &str) -> Option<Vec<String>> {
        self.extractors.get(id).map(|e| e.instance.column_names())
    }

    /// Check if an extractor is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.extractors.contains_key(id)
    }

    /// Check if an extractor is registered and enabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.extractors.get(id).is_some_and(|e| e.enabled)
    }

    /// Enable or disable an extractor.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        if let Some(entry) = self.extractors.get_mut(id) {
            entry.enabled = enabled;
            true
        } else {
            false
        }
    }

    /// Get all registered extractors.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &RegistryEntry)> {
        self.extractors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// IDs of the enabled extractors in run order.
    pub fn enabled_ids(&self) -> Vec<&str> {
        self.extractors
            .iter()
            .filter(|(_, e)| e.enabled)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Get extractor IDs by family.
    pub fn extractors_by_family(&self, family: &FeatureFamily) -> Vec<&str> {
        self.families
            .get(family)
            .map(|ids| ids.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    /// Get the total number of registered extractors.
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Get count of enabled extractors.
    pub fn enabled_count(&self) -> usize {
        self.extractors.values().filter(|e| e.enabled).count()
    }

    /// Total columns produced per image by the enabled extractors.
    pub fn enabled_column_count(&self) -> usize {
        self.extractors
            .values()
            .filter(|e| e.enabled)
            .map(|e| e.metadata.column_count)
            .sum()
    }

    /// Validate the parameters of every enabled extractor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled_count() == 0 {
            return Err(ConfigError::NoExtractorsEnabled);
        }
        for entry in self.extractors.values().filter(|e| e.enabled) {
            entry.instance.validate()?;
        }
        Ok(())
    }

    /// Run every enabled extractor on one image and merge the results.
    ///
    /// An extractor that returns a different number of values than its
    /// metadata announces fails with [`ExtractionError::Computation`].
    pub fn extract_all(&self, image: &GrayImage) -> Result<FeatureMap, ExtractionError> {
        let mut features = FeatureMap::new();
        for entry in self.extractors.values().filter(|e| e.enabled) {
            let produced = entry.instance.extract(image)?;
            if produced.len() != entry.metadata.column_count {
                return Err(ExtractionError::Computation {
                    extractor: entry.metadata.id.clone(),
                    error: format!(
                        "produced {} values, expected {}",
                        produced.len(),
                        entry.metadata.column_count
                    ),
                });
            }
            features.extend(produced);
        }
        Ok(features)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_builtins_registered_in_order() {
        let registry = ExtractorRegistry::with_builtins();
        let ids: Vec<&str> = registry.entries().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["global", "glcm", "wavelet", "gabor", "lbp", "hog"]);
        assert_eq!(registry.enabled_count(), 6);
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_default_column_count() {
        let registry = ExtractorRegistry::with_builtins();
        // 10 global + 312 glcm + 16 wavelet + 16 gabor + 4 lbp + 4 hog
        assert_eq!(registry.enabled_column_count(), 362);
        assert_eq!(registry.get_metadata("glcm").unwrap().column_count, 312);
    }

    #[test]
    fn test_from_config_disables_unlisted() {
        let mut config = PipelineConfig::default();
        config.extractors.enabled = vec!["hog".to_string(), "lbp".to_string()];
        let registry = ExtractorRegistry::from_config(&config);

        assert_eq!(registry.len(), 6);
        assert_eq!(registry.enabled_ids(), vec!["lbp", "hog"]);
        assert!(!registry.is_enabled("glcm"));
        assert!(registry.get_metadata("glcm").is_some());
    }

    #[test]
    fn test_extract_all_merges_enabled() {
        let mut config = PipelineConfig::default();
        config.extractors.enabled = vec!["global".to_string(), "hog".to_string()];
        let registry = ExtractorRegistry::from_config(&config);

        let img = GrayImage::from_pixel(16, 16, Luma([40]));
        let features = registry.extract_all(&img).unwrap();
        assert_eq!(features.len(), 14);
        assert_eq!(features["global_mean"], 40.0);
        assert_eq!(features["hog_max_grad"], 0.0);
    }

    #[test]
    fn test_family_lookup_and_toggle() {
        let mut registry = ExtractorRegistry::with_builtins();
        assert_eq!(registry.extractors_by_family(&FeatureFamily::Gabor), vec!["gabor"]);

        assert!(registry.set_enabled("gabor", false));
        assert!(!registry.is_enabled("gabor"));
        assert!(!registry.set_enabled("missing", false));

        for id in ["global", "glcm", "wavelet", "lbp", "hog"] {
            registry.set_enabled(id, false);
        }
        assert_eq!(registry.validate(), Err(ConfigError::NoExtractorsEnabled));
    }

    /// Announces two columns but only ever produces one.
    struct ShortExtractor;

    impl FeatureExtractor for ShortExtractor {
        fn metadata(&self) -> ExtractorMetadata {
            ExtractorMetadata::builder("short", "Short")
                .family(FeatureFamily::Hog)
                .column_count(2)
                .build()
        }

        fn column_names(&self) -> Vec<String> {
            vec!["hog_a".to_string(), "hog_b".to_string()]
        }

        fn extract(&self, _image: &GrayImage) -> Result<FeatureMap, ExtractionError> {
            Ok([("hog_a".to_string(), 1.0)].into_iter().collect())
        }
    }

    #[test]
    fn test_column_count_mismatch_is_computation_error() {
        let mut registry = ExtractorRegistry::new();
        registry.register(ShortExtractor);

        let err = registry.extract_all(&GrayImage::new(4, 4)).unwrap_err();
        assert!(matches!(err, ExtractionError::Computation { ref extractor, .. } if extractor == "short"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = ExtractorRegistry::new();
        registry.register(LbpExtractor::new(1.0, 8));
        registry.register(LbpExtractor::new(2.0, 16));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_metadata("lbp").unwrap().parameters["points"], "16");
        assert_eq!(registry.extractors_by_family(&FeatureFamily::Lbp), vec!["lbp"]);
    }

    #[test]
    fn test_column_names_match_metadata() {
        let registry = ExtractorRegistry::with_builtins();
        for (id, entry) in registry.entries() {
            let names = registry.column_names(id).unwrap();
            assert_eq!(names.len(), entry.metadata.column_count, "{}", id);
        }
    }
}
