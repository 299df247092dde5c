//! ZIP packaging of extracted frames.
//!
//! [`ArchivePackager`] writes every [`ExtractedFrame`] of a run into a single
//! in-memory ZIP archive, one entry per record, under a common folder.
//!
//! # Example
//!
//! ```no_run
//! use videobreaker::{
//!     ArchivePackager, ExtractOptions, ExtractionSession, NoOpSink, VideoBreakerError,
//! };
//!
//! let mut session = ExtractionSession::new();
//! session.run_file("input.mp4", &ExtractOptions::new(), &mut NoOpSink)?;
//!
//! let packager = ArchivePackager::new();
//! packager.save(session.records(), "videobreaker_frames.zip")?;
//! # Ok::<(), VideoBreakerError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    fs,
    io::{Cursor, Write},
    path::Path,
    sync::Arc,
    time::Duration,
};

use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{
    error::VideoBreakerError,
    frame::ExtractedFrame,
    progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker},
};

/// File name used when saving an archive without an explicit name.
pub const DEFAULT_ARCHIVE_NAME: &str = "videobreaker_frames.zip";

/// Folder inside the archive that holds the frames.
pub const DEFAULT_ARCHIVE_FOLDER: &str = "frames";

/// DEFLATE level used by default. Low levels keep memory use and build time
/// small on constrained devices.
pub const DEFAULT_COMPRESSION_LEVEL: i64 = 3;

/// Layout and compression settings for an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ArchiveOptions {
    /// Folder prefix for entries. `None` places frames at the archive root.
    pub folder: Option<String>,
    /// DEFLATE compression level (0–9).
    pub compression_level: i64,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            folder: Some(DEFAULT_ARCHIVE_FOLDER.to_string()),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ArchiveOptions {
    /// Set the folder prefix. An empty string places frames at the root.
    pub fn with_folder(mut self, folder: &str) -> Self {
        let folder = folder.trim_matches('/');
        self.folder = if folder.is_empty() {
            None
        } else {
            Some(folder.to_string())
        };
        self
    }

    /// Set the DEFLATE level, clamped into `0..=9`.
    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = level.clamp(0, 9);
        self
    }
}

/// Builds ZIP archives from extracted frames.
///
/// Each record's own filename is used for its entry; uniqueness is guaranteed
/// by the extraction pipeline and not re-checked here.
#[derive(Clone)]
pub struct ArchivePackager {
    options: ArchiveOptions,
    progress: Arc<dyn ProgressCallback>,
}

impl Debug for ArchivePackager {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ArchivePackager")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for ArchivePackager {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchivePackager {
    /// Packager with the default layout (`frames/` folder, DEFLATE level 3).
    pub fn new() -> Self {
        Self::with_options(ArchiveOptions::default())
    }

    /// Packager with custom layout and compression.
    pub fn with_options(options: ArchiveOptions) -> Self {
        Self {
            options,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Attach a callback that receives one progress report per entry.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// The packager's layout settings.
    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    /// Path of `frame` inside the archive.
    pub fn entry_name(&self, frame: &ExtractedFrame) -> String {
        match &self.options.folder {
            Some(folder) => format!("{folder}/{}", frame.filename()),
            None => frame.filename().to_string(),
        }
    }

    /// Build the archive in memory.
    ///
    /// The result holds exactly one entry per frame, in record order, each
    /// byte-identical to the frame's payload.
    ///
    /// # Errors
    ///
    /// Returns [`VideoBreakerError::NothingToPackage`] for an empty slice and
    /// [`VideoBreakerError::ArchiveError`] if compression fails.
    pub fn package(&self, frames: &[ExtractedFrame]) -> Result<Vec<u8>, VideoBreakerError> {
        if frames.is_empty() {
            return Err(VideoBreakerError::NothingToPackage);
        }

        log::debug!(
            "Packaging {} frames (level {})",
            frames.len(),
            self.options.compression_level
        );

        let file_options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.options.compression_level));

        let mut tracker = ProgressTracker::new(
            self.progress.clone(),
            OperationType::Packaging,
            Some(frames.len() as u64),
            1,
        );

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for frame in frames {
            writer.start_file(self.entry_name(frame), file_options)?;
            writer.write_all(frame.image())?;
            tracker.advance(
                Some(frame.index()),
                Duration::try_from_secs_f64(frame.time()).ok(),
            );
        }
        let cursor = writer.finish()?;
        let bytes = cursor.into_inner();

        log::info!("Built archive: {} entries, {} bytes", frames.len(), bytes.len());
        Ok(bytes)
    }

    /// Build the archive and write it to `path`.
    ///
    /// # Errors
    ///
    /// Same as [`package`](ArchivePackager::package), plus
    /// [`VideoBreakerError::IoError`] if the file cannot be written.
    pub fn save<P: AsRef<Path>>(
        &self,
        frames: &[ExtractedFrame],
        path: P,
    ) -> Result<(), VideoBreakerError> {
        let bytes = self.package(frames)?;
        fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::ImageEncoding;

    #[test]
    fn entry_names_follow_folder() {
        let frame = ExtractedFrame::new(2, 1.0, vec![1], ImageEncoding::Png);

        let packager = ArchivePackager::new();
        assert_eq!(packager.entry_name(&frame), "frames/frame_00002_1.00s.png");

        let flat = ArchivePackager::with_options(ArchiveOptions::default().with_folder(""));
        assert_eq!(flat.entry_name(&frame), "frame_00002_1.00s.png");

        let nested = ArchivePackager::with_options(ArchiveOptions::default().with_folder("/out/"));
        assert_eq!(nested.entry_name(&frame), "out/frame_00002_1.00s.png");
    }

    #[test]
    fn compression_level_is_clamped() {
        assert_eq!(ArchiveOptions::default().with_compression_level(42).compression_level, 9);
        assert_eq!(ArchiveOptions::default().with_compression_level(-1).compression_level, 0);
    }

    #[test]
    fn empty_input_is_rejected() {
        let error = ArchivePackager::new().package(&[]).unwrap_err();
        assert!(matches!(error, VideoBreakerError::NothingToPackage));
        assert!(error.is_packaging());
    }
}
