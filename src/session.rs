//! The frame extraction pipeline.
//!
//! An [`ExtractionSession`] owns at most one loaded [`VideoSource`] and the
//! [`ExtractionRun`] produced from it. [`ExtractionSession::run`] drives the
//! whole pipeline for one file:
//!
//! 1. reject a missing input without touching the previous run,
//! 2. release the presentation's handles, then the previous records and source,
//! 3. load the file and compute the [`FramePlan`],
//! 4. sample every planned timestamp in order, handing each record to a
//!    [`FrameSink`] as soon as it exists,
//! 5. report the outcome through [`RunStatus`] values.
//!
//! Failures after the input check never escape as `Err`; they end the run in
//! [`RunState::Failed`] with a status line and keep whatever was extracted.
//!
//! # Example
//!
//! ```no_run
//! use videobreaker::{ExtractOptions, ExtractionSession, NoOpSink, VideoBreakerError};
//!
//! let mut session = ExtractionSession::new();
//! let options = ExtractOptions::new().with_step(2.0).with_max_frames(60);
//! let run = session.run_file("input.mp4", &options, &mut NoOpSink)?;
//!
//! for frame in run.records() {
//!     println!("{} ({} bytes)", frame.filename(), frame.image().len());
//! }
//! # Ok::<(), VideoBreakerError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    archive::ArchivePackager,
    configuration::{ExtractOptions, coerce_step},
    error::VideoBreakerError,
    frame::ExtractedFrame,
    metadata::VideoMetadata,
    progress::{OperationType, ProgressTracker},
    sampler::FrameSampler,
    source::{FfmpegLoader, MediaLoader, VideoSource},
    status::RunStatus,
};

/// Which timestamps a run samples.
///
/// `planned_count` is every step boundary inside the video, including 0 and
/// the last boundary not past the end. `total` is that count capped by the
/// frame ceiling.
///
/// ```
/// use videobreaker::FramePlan;
///
/// let plan = FramePlan::compute(120.0, 1.0, 50).unwrap();
/// assert_eq!(plan.planned_count(), 121);
/// assert_eq!(plan.total(), 50);
/// assert!(plan.is_truncated());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    duration: f64,
    step_seconds: f64,
    planned_count: u64,
    total: u64,
}

impl FramePlan {
    /// Plan a run over `duration` seconds.
    ///
    /// The step is coerced like [`ExtractOptions::with_step`] and a zero
    /// ceiling is raised to 1.
    ///
    /// # Errors
    ///
    /// Returns [`VideoBreakerError::InvalidDuration`] when `duration` is zero,
    /// negative, infinite, or NaN.
    pub fn compute(
        duration: f64,
        step_seconds: f64,
        max_frames: u32,
    ) -> Result<Self, VideoBreakerError> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(VideoBreakerError::InvalidDuration(duration));
        }
        let step_seconds = coerce_step(step_seconds);
        let planned_count = ((duration / step_seconds).floor() as u64).saturating_add(1);
        let total = planned_count.min(u64::from(max_frames.max(1)));

        Ok(Self {
            duration,
            step_seconds,
            planned_count,
            total,
        })
    }

    /// Video duration the plan was computed for.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Sampling step in seconds.
    pub fn step_seconds(&self) -> f64 {
        self.step_seconds
    }

    /// Step boundaries inside the video, before the ceiling.
    pub fn planned_count(&self) -> u64 {
        self.planned_count
    }

    /// Indices that will actually be sampled.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Whether the ceiling cut the plan short.
    pub fn is_truncated(&self) -> bool {
        self.planned_count > self.total
    }

    /// Requested time of sequence index `index`.
    pub fn timestamp(&self, index: u64) -> f64 {
        index as f64 * self.step_seconds
    }

    /// All `(index, time)` pairs of the plan, in order.
    pub fn timestamps(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        (0..self.total).map(|index| (index, self.timestamp(index)))
    }
}

/// Why a run ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FailureKind {
    /// The file could not be opened or reported an unusable duration. The
    /// run holds no records.
    UnreadableMedia,
    /// Sampling stopped part way. Records produced before the error are kept.
    Extraction,
}

/// Lifecycle of an [`ExtractionRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// No run has been started (or the session was reset).
    #[default]
    NotStarted,
    /// Loading or sampling.
    InProgress,
    /// Every planned index was attempted.
    Complete,
    /// The run stopped on an error.
    Failed(FailureKind),
}

/// The outcome of one extraction run.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRun {
    records: Vec<ExtractedFrame>,
    plan: Option<FramePlan>,
    completed: u64,
    skipped: u64,
    state: RunState,
    status: Option<RunStatus>,
}

impl ExtractionRun {
    /// Extracted frames in ascending index order.
    pub fn records(&self) -> &[ExtractedFrame] {
        &self.records
    }

    /// Consume the run, keeping only its records.
    pub fn into_records(self) -> Vec<ExtractedFrame> {
        self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the run produced no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The plan, once the video has been loaded.
    pub fn plan(&self) -> Option<&FramePlan> {
        self.plan.as_ref()
    }

    /// Planned count before the ceiling, 0 before loading.
    pub fn planned_count(&self) -> u64 {
        self.plan.map_or(0, |plan| plan.planned_count())
    }

    /// Number of indices to sample, 0 before loading.
    pub fn total(&self) -> u64 {
        self.plan.map_or(0, |plan| plan.total())
    }

    /// Indices attempted so far, including skipped ones.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Indices that yielded no frame.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The latest status update.
    pub fn status(&self) -> Option<&RunStatus> {
        self.status.as_ref()
    }

    /// The latest status line, empty before any run.
    pub fn status_text(&self) -> String {
        self.status
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

/// Receives records as they are produced.
///
/// The presentation layer implements this to show previews while the run is
/// still going. `on_reset` is called before a new run discards the previous
/// records, so any handles derived from them can be released.
pub trait FrameSink {
    /// A new record was appended to the run.
    fn on_frame(&mut self, frame: &ExtractedFrame);

    /// The previous run is about to be discarded.
    fn on_reset(&mut self) {}
}

/// A sink that ignores every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSink;

impl FrameSink for NoOpSink {
    fn on_frame(&mut self, _frame: &ExtractedFrame) {}
}

impl FrameSink for Vec<ExtractedFrame> {
    fn on_frame(&mut self, frame: &ExtractedFrame) {
        self.push(frame.clone());
    }

    fn on_reset(&mut self) {
        self.clear();
    }
}

/// Owns the loaded video and the latest run.
///
/// Only one run exists at a time; starting another replaces it.
#[derive(Default)]
pub struct ExtractionSession {
    run: ExtractionRun,
    source: Option<Box<dyn VideoSource>>,
}

impl Debug for ExtractionSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractionSession")
            .field("run", &self.run)
            .field("metadata", &self.metadata())
            .finish()
    }
}

impl ExtractionSession {
    /// An empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest run.
    pub fn current_run(&self) -> &ExtractionRun {
        &self.run
    }

    /// Records of the latest run.
    pub fn records(&self) -> &[ExtractedFrame] {
        &self.run.records
    }

    /// Metadata of the loaded video, if one is bound.
    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.source.as_ref().map(|source| source.metadata())
    }

    /// Consume the session, keeping the latest run.
    pub fn into_run(self) -> ExtractionRun {
        self.run
    }

    /// Extract frames from `path` using the FFmpeg loader.
    ///
    /// See [`run`](ExtractionSession::run).
    ///
    /// # Errors
    ///
    /// Returns [`VideoBreakerError::NoInput`] if the path is empty or does
    /// not exist.
    pub fn run_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: &ExtractOptions,
        sink: &mut dyn FrameSink,
    ) -> Result<&ExtractionRun, VideoBreakerError> {
        self.run(&mut FfmpegLoader, path.as_ref(), options, sink)
    }

    /// Run the extraction pipeline over `path`.
    ///
    /// Every failure past the input check is folded into the returned run:
    /// check [`ExtractionRun::state`] and [`ExtractionRun::status`].
    ///
    /// # Errors
    ///
    /// Returns [`VideoBreakerError::NoInput`] if the path is empty or does
    /// not exist. The previous run is left untouched in that case.
    pub fn run(
        &mut self,
        loader: &mut dyn MediaLoader,
        path: &Path,
        options: &ExtractOptions,
        sink: &mut dyn FrameSink,
    ) -> Result<&ExtractionRun, VideoBreakerError> {
        if path.as_os_str().is_empty() || !path.exists() {
            log::warn!("No video file at {:?}", path);
            options.progress().on_status(&RunStatus::SelectVideo);
            return Err(VideoBreakerError::NoInput);
        }

        self.reset(sink);
        self.run.state = RunState::InProgress;
        report(&mut self.run, options, RunStatus::Loading);

        if let Err(error) = self.extract(loader, path, options, sink) {
            let (kind, status) = match error {
                VideoBreakerError::InvalidDuration(duration) => {
                    log::warn!("Unusable duration {duration} for {}", path.display());
                    (FailureKind::UnreadableMedia, RunStatus::UnreadableDuration)
                }
                other => {
                    let kind = if other.is_unreadable_media() {
                        FailureKind::UnreadableMedia
                    } else {
                        FailureKind::Extraction
                    };
                    let message = other.to_string();
                    (kind, RunStatus::Failed { message })
                }
            };
            self.run.state = RunState::Failed(kind);
            report(&mut self.run, options, status);
        }

        Ok(&self.run)
    }

    /// Release presentation handles, then the records and the loaded video.
    ///
    /// Safe to call repeatedly.
    pub fn reset(&mut self, sink: &mut dyn FrameSink) {
        sink.on_reset();
        self.run = ExtractionRun::default();
        self.source = None;
    }

    /// Build an archive from the current records.
    ///
    /// Emits "Building ZIP..." and then either the success or the
    /// "ZIP error: ..." status. Records and run state are never changed, so a
    /// failed build can be retried.
    ///
    /// # Errors
    ///
    /// Returns [`VideoBreakerError::NothingToPackage`] when there are no
    /// records, or the packager's error.
    pub fn package(
        &mut self,
        packager: &ArchivePackager,
        options: &ExtractOptions,
    ) -> Result<Vec<u8>, VideoBreakerError> {
        report(&mut self.run, options, RunStatus::Packaging);
        match packager.package(&self.run.records) {
            Ok(bytes) => {
                let entries = self.run.records.len();
                report(&mut self.run, options, RunStatus::Packaged { entries });
                Ok(bytes)
            }
            Err(error) => {
                let message = error.to_string();
                report(&mut self.run, options, RunStatus::PackagingFailed { message });
                Err(error)
            }
        }
    }

    /// Build an archive and write it to `path`.
    ///
    /// # Errors
    ///
    /// Same as [`package`](ExtractionSession::package), plus
    /// [`VideoBreakerError::IoError`] if the file cannot be written.
    pub fn save_archive<P: AsRef<Path>>(
        &mut self,
        packager: &ArchivePackager,
        path: P,
        options: &ExtractOptions,
    ) -> Result<PathBuf, VideoBreakerError> {
        let bytes = self.package(packager, options)?;
        let path = path.as_ref().to_path_buf();
        if let Err(error) = fs::write(&path, bytes) {
            let error = VideoBreakerError::from(error);
            let message = error.to_string();
            report(&mut self.run, options, RunStatus::PackagingFailed { message });
            return Err(error);
        }
        report(
            &mut self.run,
            options,
            RunStatus::ArchiveSaved { path: path.clone() },
        );
        Ok(path)
    }

    fn extract(
        &mut self,
        loader: &mut dyn MediaLoader,
        path: &Path,
        options: &ExtractOptions,
        sink: &mut dyn FrameSink,
    ) -> Result<(), VideoBreakerError> {
        let source = self.source.insert(loader.load(path)?);
        let metadata = source.metadata().clone();

        let plan = FramePlan::compute(
            metadata.duration,
            options.step_seconds(),
            options.max_frames(),
        )?;
        self.run.plan = Some(plan);

        log::info!(
            "Planned {} frames at {}s steps over {:.2}s, sampling {}",
            plan.planned_count(),
            plan.step_seconds(),
            plan.duration(),
            plan.total(),
        );

        let status = if plan.is_truncated() {
            RunStatus::Truncated {
                step_seconds: plan.step_seconds(),
                max_frames: options.max_frames(),
            }
        } else {
            RunStatus::Extracting {
                total: plan.total(),
            }
        };
        report(&mut self.run, options, status);

        let mut sampler = FrameSampler::new(&metadata, options);
        sampler.warm_up(&mut **source);

        let mut tracker = ProgressTracker::new(
            options.progress.clone(),
            OperationType::FrameExtraction,
            Some(plan.total()),
            options.batch_size(),
        );

        for (index, time) in plan.timestamps() {
            let sampled = sampler.sample_at(&mut **source, time)?;
            self.run.completed += 1;

            let recorded = match sampled {
                Some(image) => {
                    let frame = ExtractedFrame::new(index, time, image, sampler.encoding());
                    sink.on_frame(&frame);
                    self.run.records.push(frame);
                    true
                }
                None => {
                    log::debug!("Skipping frame {index} at {time:.2}s");
                    self.run.skipped += 1;
                    false
                }
            };

            // Numeric progress covers every index; the status line only
            // follows a frame that was actually recorded.
            let due = tracker.advance(Some(index), Duration::try_from_secs_f64(time).ok());
            if due && recorded {
                report(
                    &mut self.run,
                    options,
                    RunStatus::Progress {
                        processed: index + 1,
                        total: plan.total(),
                    },
                );
            }
        }

        if self.run.skipped > 0 {
            log::warn!(
                "{} of {} frames produced no image and were skipped",
                self.run.skipped,
                plan.total()
            );
        }

        self.run.state = RunState::Complete;
        let extracted = self.run.records.len();
        report(&mut self.run, options, RunStatus::Done { extracted });
        Ok(())
    }
}

fn report(run: &mut ExtractionRun, options: &ExtractOptions, status: RunStatus) {
    match &status {
        RunStatus::Progress { .. } => log::debug!("{status}"),
        status if status.is_error() => log::warn!("{status}"),
        status => log::info!("{status}"),
    }
    options.progress().on_status(&status);
    run.status = Some(status);
}
