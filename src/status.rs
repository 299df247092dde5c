//! Human-readable run status.
//!
//! Every point at which a run or an archive build changes phase is described
//! by a [`RunStatus`]. Its [`Display`](std::fmt::Display) output is the text a
//! front end shows in its status line.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

/// A status update emitted by an [`ExtractionSession`](crate::ExtractionSession).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum RunStatus {
    /// No input was supplied; the run never started.
    SelectVideo,
    /// The loader is opening the file and reading its metadata.
    Loading,
    /// The duration is zero, infinite, or NaN; the run ends empty.
    UnreadableDuration,
    /// More frames were planned than the ceiling allows.
    Truncated {
        /// Sampling step in seconds.
        step_seconds: f64,
        /// The configured ceiling.
        max_frames: u32,
    },
    /// Extraction is starting with an uncapped plan.
    Extracting {
        /// Number of indices that will be sampled.
        total: u64,
    },
    /// Periodic progress.
    Progress {
        /// Indices sampled so far, including skipped ones.
        processed: u64,
        /// Number of indices that will be sampled.
        total: u64,
    },
    /// The run finished.
    Done {
        /// Records actually produced.
        extracted: usize,
    },
    /// The run stopped on an error after it started.
    Failed {
        /// Description of the error.
        message: String,
    },
    /// An archive build started.
    Packaging,
    /// An archive was built.
    Packaged {
        /// Number of frames written into the archive.
        entries: usize,
    },
    /// A built archive was written to disk.
    ArchiveSaved {
        /// Destination file.
        path: PathBuf,
    },
    /// An archive build failed. Extracted records are untouched.
    PackagingFailed {
        /// Description of the error.
        message: String,
    },
}

impl RunStatus {
    /// Returns `true` for statuses that describe a failure.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            RunStatus::SelectVideo
                | RunStatus::UnreadableDuration
                | RunStatus::Failed { .. }
                | RunStatus::PackagingFailed { .. }
        )
    }
}

impl Display for RunStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RunStatus::SelectVideo => write!(f, "Please select a video file."),
            RunStatus::Loading => write!(f, "Loading video..."),
            RunStatus::UnreadableDuration => write!(
                f,
                "Could not read video duration. Try a different video format."
            ),
            RunStatus::Truncated {
                step_seconds,
                max_frames,
            } => write!(
                f,
                "Video is long for {step_seconds}s steps. Limiting to {max_frames} frames (you can increase Max frames)."
            ),
            RunStatus::Extracting { total } => write!(f, "Extracting {total} frames..."),
            RunStatus::Progress { processed, total } => {
                write!(f, "Extracted {processed}/{total} frames...")
            }
            RunStatus::Done { extracted } => write!(f, "Done. Extracted {extracted} frames."),
            RunStatus::Failed { message } => write!(f, "Error: {message}"),
            RunStatus::Packaging => write!(f, "Building ZIP..."),
            RunStatus::Packaged { entries } => write!(f, "ZIP ready with {entries} frames."),
            RunStatus::ArchiveSaved { path } => write!(f, "ZIP saved to {}.", path.display()),
            RunStatus::PackagingFailed { message } => write!(f, "ZIP error: {message}"),
        }
    }
}
