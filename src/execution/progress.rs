//! Progress tracking for extraction runs.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A progress update event.
#[derive(Debug, Clone)]
pub enum ProgressUpdate {
    /// The run has started.
    Started {
        total_images: usize,
        total_classes: usize,
    },
    /// A class folder is about to be processed.
    ClassStarted {
        class: String,
        images: usize,
        index: usize,
        total: usize,
    },
    /// An image has been turned into features.
    ImageCompleted {
        path: PathBuf,
        duration_ms: u64,
        index: usize,
        total: usize,
    },
    /// An image could not be processed.
    ImageSkipped { path: PathBuf, reason: String },
    /// Overall progress percentage.
    Progress {
        percent: f32,
        elapsed_ms: u64,
        estimated_remaining_ms: Option<u64>,
    },
    /// The run has finished.
    Completed {
        total_duration_ms: u64,
        images_processed: usize,
        images_skipped: usize,
    },
    /// The run was cancelled.
    Cancelled,
}

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Tracks extraction progress and observes a cancel flag.
///
/// Shared by reference across rayon workers; counters are atomic.
pub struct ProgressTracker {
    /// Total number of images to process.
    total_images: usize,
    /// Number of images completed.
    completed: AtomicU64,
    /// Number of images skipped.
    skipped: AtomicU64,
    /// Cancel flag, possibly shared with the caller.
    cancelled: Arc<AtomicBool>,
    /// Start time.
    start_time: Option<Instant>,
    /// Progress callback.
    callback: Option<ProgressCallback>,
    /// Per-image times for estimation.
    image_times: parking_lot::Mutex<Vec<u64>>,
}

impl ProgressTracker {
    /// Create a new progress tracker.
    pub fn new(total_images: usize) -> Self {
        Self {
            total_images,
            completed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            cancelled: Arc::new(AtomicBool::new(false)),
            start_time: None,
            callback: None,
            image_times: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Set a callback for progress updates.
    pub fn with_callback(mut self, callback: ProgressCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Observe `flag` for cancellation instead of a private flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = flag;
        self
    }

    /// Start tracking.
    pub fn start(&mut self, total_classes: usize) {
        self.start_time = Some(Instant::now());
        self.send_update(ProgressUpdate::Started {
            total_images: self.total_images,
            total_classes,
        });
    }

    /// Report that a class folder is starting.
    pub fn class_started(&self, class: &str, images: usize, index: usize, total: usize) {
        self.send_update(ProgressUpdate::ClassStarted {
            class: class.to_string(),
            images,
            index,
            total,
        });
    }

    /// Report that an image has been processed.
    pub fn image_completed(&self, path: PathBuf, duration_ms: u64) {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) as usize + 1;
        self.image_times.lock().push(duration_ms);

        self.send_update(ProgressUpdate::ImageCompleted {
            path,
            duration_ms,
            index: completed,
            total: self.total_images,
        });
        self.send_progress_update();
    }

    /// Report that an image was skipped.
    pub fn image_skipped(&self, path: PathBuf, reason: String) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        self.send_update(ProgressUpdate::ImageSkipped { path, reason });
        self.send_progress_update();
    }

    /// Check if the run should stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Report that the run stopped because of cancellation.
    pub fn report_cancelled(&self) {
        self.send_update(ProgressUpdate::Cancelled);
    }

    /// Number of images processed so far.
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::Relaxed) as usize
    }

    /// Number of images skipped so far.
    pub fn skipped_count(&self) -> usize {
        self.skipped.load(Ordering::Relaxed) as usize
    }

    /// Complete tracking.
    pub fn complete(&self) {
        let duration = self
            .start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        self.send_update(ProgressUpdate::Completed {
            total_duration_ms: duration,
            images_processed: self.completed_count(),
            images_skipped: self.skipped_count(),
        });
    }

    /// Get current progress percentage.
    pub fn progress_percent(&self) -> f32 {
        if self.total_images == 0 {
            return 100.0;
        }
        let done = self.completed.load(Ordering::Relaxed) + self.skipped.load(Ordering::Relaxed);
        (done as f32 / self.total_images as f32) * 100.0
    }

    /// Estimate remaining time in milliseconds.
    ///
    /// Assumes the remaining images cost the average so far.
    pub fn estimated_remaining_ms(&self) -> Option<u64> {
        let times = self.image_times.lock();
        if times.is_empty() {
            return None;
        }

        let avg_time: u64 = times.iter().sum::<u64>() / times.len() as u64;
        let done = self.completed_count() + self.skipped_count();
        let remaining = self.total_images.saturating_sub(done);

        Some(avg_time * remaining as u64)
    }

    fn send_update(&self, update: ProgressUpdate) {
        if let Some(ref callback) = self.callback {
            callback(update);
        }
    }

    fn send_progress_update(&self) {
        let elapsed = self
            .start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        self.send_update(ProgressUpdate::Progress {
            percent: self.progress_percent(),
            elapsed_ms: elapsed,
            estimated_remaining_ms: self.estimated_remaining_ms(),
        });
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(0)
    }
}
