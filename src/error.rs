//! Error types for the `videobreaker` crate.
//!
//! This module defines [`VideoBreakerError`], the unified error type returned
//! by all fallible operations in the crate. Errors carry enough context (file
//! paths, timestamps, upstream messages) to be shown to a user as status text
//! without additional logging at the call site.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;
use zip::result::ZipError;

/// The unified error type for all `videobreaker` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VideoBreakerError {
    /// No video file was supplied, or the supplied path does not exist.
    #[error("No video file selected")]
    NoInput,

    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path handed to the loader.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The decoder reported a duration of zero, infinity, or NaN.
    #[error("Could not read video duration (reported {0} seconds)")]
    InvalidDuration(f64),

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// A seek did not present a frame before the configured deadline.
    #[error("Seek to {target:.2}s did not complete within {timeout:?}")]
    SeekTimeout {
        /// Requested (clamped) seek target in seconds.
        target: f64,
        /// The bound that was exceeded.
        timeout: Duration,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding or decoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The ZIP archive could not be built.
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// Packaging was requested before any frame was extracted.
    #[error("No extracted frames to package")]
    NothingToPackage,
}

impl VideoBreakerError {
    /// Returns `true` for failures that mean the selected file cannot be
    /// sampled at all. These end a run with zero records; picking another
    /// file is the only recovery.
    pub fn is_unreadable_media(&self) -> bool {
        matches!(
            self,
            VideoBreakerError::FileOpen { .. }
                | VideoBreakerError::NoVideoStream
                | VideoBreakerError::InvalidDuration(_)
        )
    }

    /// Returns `true` for errors raised while building an archive.
    pub fn is_packaging(&self) -> bool {
        matches!(
            self,
            VideoBreakerError::ArchiveError(_) | VideoBreakerError::NothingToPackage
        )
    }
}

impl From<FfmpegError> for VideoBreakerError {
    fn from(error: FfmpegError) -> Self {
        VideoBreakerError::FfmpegError(error.to_string())
    }
}

impl From<ZipError> for VideoBreakerError {
    fn from(error: ZipError) -> Self {
        VideoBreakerError::ArchiveError(error.to_string())
    }
}
