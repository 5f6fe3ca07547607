//! Extraction engine implementation.
//!
//! The engine turns a scanned dataset into a feature table: every image is
//! loaded, normalized and passed through the enabled extractors.

use crate::core::config::{ImageConfig, PipelineConfig};
use crate::core::error::{ExtractionError, FeatureError, FeatureResult};
use crate::core::loader;
use crate::core::types::FeatureMap;
use crate::dataset::scan::DatasetIndex;
use crate::dataset::table::{FeatureRecord, FeatureTable};
use crate::execution::progress::{ProgressCallback, ProgressTracker, ProgressUpdate};
use crate::extractors::ExtractorRegistry;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Extraction options.
#[derive(Clone)]
pub struct ExtractionOptions {
    /// Whether to process the images of a class in parallel.
    pub parallel: bool,
    /// Maximum number of worker threads (0 = rayon's global pool).
    pub max_threads: usize,
    /// Progress callback.
    pub progress_callback: Option<Arc<ProgressCallback>>,
    /// Flag checked between images; setting it stops the run.
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for ExtractionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionOptions")
            .field("parallel", &self.parallel)
            .field("max_threads", &self.max_threads)
            .field("progress_callback", &self.progress_callback.as_ref().map(|_| "<callback>"))
            .field("cancel_flag", &self.cancel_flag)
            .finish()
    }
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_threads: 0,
            progress_callback: None,
            cancel_flag: None,
        }
    }
}

impl ExtractionOptions {
    /// Create a new options builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options taken from the `[execution]` section.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new()
            .with_parallel(config.execution.parallel)
            .with_max_threads(config.execution.threads)
    }

    /// Enable/disable parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set maximum threads.
    pub fn with_max_threads(mut self, max: usize) -> Self {
        self.max_threads = max;
        self
    }

    /// Set progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Stop the run once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }
}

/// Result of extracting a dataset.
#[derive(Debug)]
pub struct ExtractionOutput {
    /// One row per processed image.
    pub table: FeatureTable,
    /// Run statistics.
    pub stats: ExtractionStats,
    /// Images that were skipped and why.
    pub skipped: Vec<(PathBuf, ExtractionError)>,
}

/// Extraction statistics.
#[derive(Debug, Clone, Default)]
pub struct ExtractionStats {
    /// Total run time.
    pub total_duration: Duration,
    /// Number of images turned into rows.
    pub images_processed: usize,
    /// Number of images skipped.
    pub images_skipped: usize,
    /// Number of class folders.
    pub classes: usize,
}

/// The extraction engine.
pub struct ExtractionEngine {
    /// Extractors applied to every image.
    registry: Arc<ExtractorRegistry>,
    /// Normalization applied before extraction.
    image: ImageConfig,
    /// Default extraction options.
    default_options: ExtractionOptions,
}

impl ExtractionEngine {
    /// Create an engine over a registry.
    pub fn new(registry: ExtractorRegistry, image: ImageConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            image,
            default_options: ExtractionOptions::default(),
        }
    }

    /// Create an engine from a full configuration.
    ///
    /// Validates the configuration and every enabled extractor first.
    pub fn from_config(config: &PipelineConfig) -> FeatureResult<Self> {
        config.validate()?;
        let registry = ExtractorRegistry::from_config(config);
        registry.validate()?;
        Ok(Self::new(registry, config.image.clone())
            .with_default_options(ExtractionOptions::from_config(config)))
    }

    /// Set default options.
    pub fn with_default_options(mut self, options: ExtractionOptions) -> Self {
        self.default_options = options;
        self
    }

    /// Extractors used by this engine.
    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Load, normalize and extract one image.
    pub fn extract_file(&self, path: &Path) -> Result<FeatureMap, ExtractionError> {
        let image = loader::load_normalized(path, &self.image)?;
        self.registry.extract_all(&image)
    }

    /// Extract every image of a dataset.
    ///
    /// Rows follow class order, then file order, whether or not the run is
    /// parallel. Unreadable images are skipped; any other extraction error
    /// aborts the run. Setting the options' cancel flag stops the run with
    /// [`FeatureError::Cancelled`].
    pub fn execute(
        &self,
        dataset: &DatasetIndex,
        options: Option<ExtractionOptions>,
    ) -> FeatureResult<ExtractionOutput> {
        let options = options.unwrap_or_else(|| self.default_options.clone());

        if options.parallel && options.max_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(options.max_threads)
                .build()
                .map_err(|e| FeatureError::Other(format!("Failed to build thread pool: {}", e)))?;
            pool.install(|| self.run(dataset, &options))
        } else {
            self.run(dataset, &options)
        }
    }

    fn run(
        &self,
        dataset: &DatasetIndex,
        options: &ExtractionOptions,
    ) -> FeatureResult<ExtractionOutput> {
        let start_time = Instant::now();

        let mut tracker = ProgressTracker::new(dataset.file_count());
        if let Some(callback) = &options.progress_callback {
            let callback = callback.clone();
            tracker = tracker.with_callback(Box::new(move |update| callback(update)));
        }
        if let Some(flag) = &options.cancel_flag {
            tracker = tracker.with_cancel_flag(flag.clone());
        }
        tracker.start(dataset.classes().len());

        let mut records = Vec::with_capacity(dataset.file_count());
        let mut skipped = Vec::new();
        let total_classes = dataset.classes().len();

        for (index, class) in dataset.classes().iter().enumerate() {
            if tracker.is_cancelled() {
                log::info!("Extraction cancelled before {}", class.name);
                tracker.report_cancelled();
                return Err(FeatureError::Cancelled);
            }

            log::info!("Extracting {} ({} files)", class.name, class.files.len());
            tracker.class_started(&class.name, class.files.len(), index, total_classes);

            let results: Vec<_> = if options.parallel {
                class
                    .files
                    .par_iter()
                    .map(|path| self.process(path, &tracker))
                    .collect()
            } else {
                class
                    .files
                    .iter()
                    .map(|path| self.process(path, &tracker))
                    .collect()
            };

            if tracker.is_cancelled() {
                log::info!("Extraction cancelled during {}", class.name);
                tracker.report_cancelled();
                return Err(FeatureError::Cancelled);
            }

            for (path, result) in class.files.iter().zip(results) {
                let Some(result) = result else {
                    continue;
                };
                match result {
                    Ok(features) => records.push(FeatureRecord::new(class.name.clone(), features)),
                    Err(error) if error.is_recoverable() => {
                        log::warn!("Skipping {}: {}", path.display(), error);
                        skipped.push((path.clone(), error));
                    }
                    Err(error) => {
                        tracker.complete();
                        return Err(error.into());
                    }
                }
            }
        }

        tracker.complete();

        let stats = ExtractionStats {
            total_duration: start_time.elapsed(),
            images_processed: records.len(),
            images_skipped: skipped.len(),
            classes: total_classes,
        };
        let table = FeatureTable::from_records(records, dataset.class_names());

        Ok(ExtractionOutput {
            table,
            stats,
            skipped,
        })
    }

    /// `None` when the run was cancelled before this image started.
    fn process(
        &self,
        path: &Path,
        tracker: &ProgressTracker,
    ) -> Option<Result<FeatureMap, ExtractionError>> {
        if tracker.is_cancelled() {
            return None;
        }
        let started = Instant::now();
        let result = self.extract_file(path);
        match &result {
            Ok(_) => tracker.image_completed(path.to_path_buf(), started.elapsed().as_millis() as u64),
            Err(e) if e.is_recoverable() => tracker.image_skipped(path.to_path_buf(), e.to_string()),
            Err(_) => {}
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{
        ExtractorMetadata, FeatureExtractor, FeatureFamily, GlobalExtractor,
    };
    use image::{GrayImage, Luma};
    use parking_lot::Mutex;
    use std::fs;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    /// Announces one column and produces none.
    struct EmptyExtractor;

    impl FeatureExtractor for EmptyExtractor {
        fn metadata(&self) -> ExtractorMetadata {
            ExtractorMetadata::builder("empty", "Empty")
                .family(FeatureFamily::Hog)
                .column_count(1)
                .build()
        }

        fn column_names(&self) -> Vec<String> {
            vec!["hog_empty".to_string()]
        }

        fn extract(&self, _image: &GrayImage) -> Result<FeatureMap, ExtractionError> {
            Ok(FeatureMap::new())
        }
    }

    fn event_tag(update: &ProgressUpdate) -> Option<&'static str> {
        match update {
            ProgressUpdate::Started { .. } => Some("started"),
            ProgressUpdate::ClassStarted { .. } => Some("class"),
            ProgressUpdate::ImageCompleted { .. } => Some("image"),
            ProgressUpdate::ImageSkipped { .. } => Some("skipped"),
            ProgressUpdate::Completed { .. } => Some("completed"),
            ProgressUpdate::Cancelled => Some("cancelled"),
            ProgressUpdate::Progress { .. } => None,
        }
    }

    fn small_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.image.width = 16;
        config.image.height = 16;
        config.extractors.enabled = vec!["global".into(), "hog".into()];
        config
    }

    fn write_dataset() -> TempDir {
        let dir = TempDir::new().unwrap();
        for (class, shades) in [("Beta", vec![10u8, 20]), ("Alpha", vec![200u8])] {
            let folder = dir.path().join(class);
            fs::create_dir(&folder).unwrap();
            for (i, shade) in shades.iter().enumerate() {
                GrayImage::from_pixel(24, 24, Luma([*shade]))
                    .save(folder.join(format!("img{}.png", i)))
                    .unwrap();
            }
        }
        fs::write(dir.path().join("Beta/broken.png"), b"not an image").unwrap();
        dir
    }

    #[test]
    fn test_execute_orders_rows_and_skips_broken() {
        let dir = write_dataset();
        let engine = ExtractionEngine::from_config(&small_config()).unwrap();
        let dataset = DatasetIndex::scan(dir.path(), None).unwrap();

        let output = engine.execute(&dataset, None).unwrap();
        let classes: Vec<&str> = output.table.rows().iter().map(|r| r.class.as_str()).collect();
        assert_eq!(classes, vec!["Alpha", "Beta", "Beta"]);
        assert_eq!(output.table.value(0, "global_mean"), Some(200.0));
        assert_eq!(output.table.value(2, "global_mean"), Some(20.0));

        assert_eq!(output.stats.images_processed, 3);
        assert_eq!(output.stats.images_skipped, 1);
        assert!(output.skipped[0].0.ends_with("broken.png"));
        assert_eq!(output.table.columns().len(), 14);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let dir = write_dataset();
        let engine = ExtractionEngine::from_config(&small_config()).unwrap();
        let dataset = DatasetIndex::scan(dir.path(), None).unwrap();

        let parallel = engine.execute(&dataset, None).unwrap();
        let sequential = engine
            .execute(&dataset, Some(ExtractionOptions::new().with_parallel(false)))
            .unwrap();
        assert_eq!(parallel.table, sequential.table);

        let pooled = engine
            .execute(&dataset, Some(ExtractionOptions::new().with_max_threads(2)))
            .unwrap();
        assert_eq!(parallel.table, pooled.table);
    }

    #[test]
    fn test_progress_events() {
        let dir = write_dataset();
        let engine = ExtractionEngine::from_config(&small_config()).unwrap();
        let dataset = DatasetIndex::scan(dir.path(), None).unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let options = ExtractionOptions::new().with_progress(move |update| {
            if let Some(tag) = event_tag(&update) {
                sink.lock().push(tag);
            }
        });
        engine.execute(&dataset, Some(options)).unwrap();

        let events = events.lock();
        assert_eq!(events.first(), Some(&"started"));
        assert_eq!(events.last(), Some(&"completed"));
        assert_eq!(events.iter().filter(|e| **e == "class").count(), 2);
        assert_eq!(events.iter().filter(|e| **e == "image").count(), 3);
        assert_eq!(events.iter().filter(|e| **e == "skipped").count(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = small_config();
        config.glcm.distances.clear();
        config.extractors.enabled.push("glcm".into());
        assert!(matches!(
            ExtractionEngine::from_config(&config),
            Err(FeatureError::Config(_))
        ));
    }

    #[test]
    fn test_computation_error_aborts_without_skip_events() {
        let dir = write_dataset();
        let mut registry = ExtractorRegistry::new();
        registry.register(GlobalExtractor::new());
        registry.register(EmptyExtractor);
        let engine = ExtractionEngine::new(registry, small_config().image);
        let dataset = DatasetIndex::scan(dir.path(), None).unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let options = ExtractionOptions::new()
            .with_parallel(false)
            .with_progress(move |update| {
                if let Some(tag) = event_tag(&update) {
                    sink.lock().push(tag);
                }
            });

        let result = engine.execute(&dataset, Some(options));
        assert!(matches!(
            result,
            Err(FeatureError::Extraction(ExtractionError::Computation { ref extractor, .. }))
                if extractor == "empty"
        ));

        let events = events.lock();
        assert!(!events.contains(&"skipped"));
        assert!(!events.contains(&"image"));
        assert_eq!(events.last(), Some(&"completed"));
    }

    #[test]
    fn test_cancel_flag_stops_run() {
        let dir = write_dataset();
        let engine = ExtractionEngine::from_config(&small_config()).unwrap();
        let dataset = DatasetIndex::scan(dir.path(), None).unwrap();

        let flag = Arc::new(AtomicBool::new(false));
        let trigger = flag.clone();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let options = ExtractionOptions::new()
            .with_cancel_flag(flag.clone())
            .with_progress(move |update| {
                if matches!(update, ProgressUpdate::ClassStarted { .. }) {
                    trigger.store(true, Ordering::Relaxed);
                }
                if let Some(tag) = event_tag(&update) {
                    sink.lock().push(tag);
                }
            });

        let result = engine.execute(&dataset, Some(options));
        assert!(matches!(result, Err(FeatureError::Cancelled)));

        let events = events.lock();
        assert_eq!(*events, vec!["started", "class", "cancelled"]);
        assert!(flag.load(Ordering::Relaxed));
    }
}
