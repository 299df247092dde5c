//! Progress reporting.
//!
//! This module provides [`ProgressCallback`] for monitoring an extraction run
//! or archive build, and [`ProgressInfo`] for detailed progress snapshots.
//! Human-readable status lines arrive through
//! [`ProgressCallback::on_status`] as [`RunStatus`] values.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use videobreaker::{
//!     ExtractOptions, ExtractionSession, NoOpSink, ProgressCallback, ProgressInfo, RunStatus,
//!     VideoBreakerError,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//!
//!     fn on_status(&self, status: &RunStatus) {
//!         println!("{status}");
//!     }
//! }
//!
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! let mut session = ExtractionSession::new();
//! session.run_file("input.mp4", &options, &mut NoOpSink)?;
//! # Ok::<(), VideoBreakerError>(())
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::status::RunStatus;

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Seeking, rasterizing and encoding frames.
    FrameExtraction,
    /// Writing extracted frames into a ZIP archive.
    Packaging,
}

/// A snapshot of progress.
///
/// Delivered to [`ProgressCallback::on_progress`] at a cadence controlled
/// by [`ExtractOptions::with_batch_size`](crate::ExtractOptions::with_batch_size).
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many items (sampled indices / archive entries) have been processed.
    pub current: u64,
    /// Total items expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Sequence index of the item just processed.
    pub current_index: Option<u64>,
    /// Requested timestamp of the frame just processed.
    pub current_timestamp: Option<Duration>,
}

/// Trait for receiving progress and status updates.
///
/// Implementations must be [`Send`] and [`Sync`] because the async
/// [`ExtractionStream`](crate::ExtractionStream) invokes them from a blocking
/// worker thread.
///
/// Callbacks are **infallible**: they observe but cannot halt the run.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals during an operation.
    fn on_progress(&self, info: &ProgressInfo);

    /// Called whenever the human-readable run status changes.
    fn on_status(&self, _status: &RunStatus) {}
}

/// A no-op implementation that discards all notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Internal helper that tracks progress timing and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one completed item and fire the callback if the batch
    /// threshold or the final item is reached.
    ///
    /// Returns `true` when a report was emitted.
    pub(crate) fn advance(&mut self, index: Option<u64>, timestamp: Option<Duration>) -> bool {
        self.current += 1;
        self.items_since_last_report += 1;

        let is_last = self.total.is_some_and(|total| self.current >= total);
        if self.items_since_last_report >= self.batch_size || is_last {
            self.report(index, timestamp);
            self.items_since_last_report = 0;
            return true;
        }
        false
    }

    fn report(&self, index: Option<u64>, timestamp: Option<Duration>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| (self.current as f32 / t as f32) * 100.0);

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                let per_item = elapsed / self.current as u32;
                per_item * remaining as u32
            })
        } else {
            None
        };

        let info = ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_index: index,
            current_timestamp: timestamp,
        };

        self.callback.on_progress(&info);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<u64>>);

    impl ProgressCallback for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            self.0.lock().unwrap().push(info.current);
        }
    }

    #[test]
    fn reports_every_batch_and_on_last_item() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), OperationType::FrameExtraction, Some(25), 10);

        let fired: Vec<bool> = (0..25).map(|i| tracker.advance(Some(i), None)).collect();

        assert_eq!(fired.iter().filter(|fired| **fired).count(), 3);
        assert_eq!(*recorder.0.lock().unwrap(), vec![10, 20, 25]);
    }

    #[test]
    fn unknown_total_only_reports_batches() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker = ProgressTracker::new(recorder.clone(), OperationType::Packaging, None, 2);
        for _ in 0..5 {
            tracker.advance(None, None);
        }
        assert_eq!(*recorder.0.lock().unwrap(), vec![2, 4]);
    }
}
