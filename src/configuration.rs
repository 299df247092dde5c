//! Extraction configuration.
//!
//! [`ExtractOptions`] is a builder that threads the sampling step, frame
//! ceiling, image encoding, progress callback, and other operational settings
//! through [`ExtractionSession::run`](crate::ExtractionSession::run) without
//! polluting every function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use videobreaker::{ExtractOptions, ImageEncoding, ProgressCallback, ProgressInfo, RunStatus};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {} done", info.operation, info.current);
//!     }
//!
//!     fn on_status(&self, status: &RunStatus) {
//!         println!("{status}");
//!     }
//! }
//!
//! let options = ExtractOptions::new()
//!     .with_step(0.5)
//!     .with_max_frames(120)
//!     .with_encoding(ImageEncoding::jpeg(85))
//!     .with_progress(Arc::new(LogProgress));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::progress::{NoOpProgress, ProgressCallback};

/// Sampling step used when none is configured, in seconds.
pub const DEFAULT_STEP_SECONDS: f64 = 1.0;

/// Smallest step an invalid (zero, negative, or non-finite) step is raised to.
pub const MIN_STEP_SECONDS: f64 = 0.01;

/// The step choices offered by front ends. Any positive step is accepted.
pub const STEP_PRESETS: [f64; 4] = [0.5, 1.0, 2.0, 5.0];

/// Frame ceiling used when none is configured or the input is not a number.
pub const DEFAULT_MAX_FRAMES: u32 = 300;

/// JPEG quality used by [`ImageEncoding::jpeg`] callers that have no preference.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Surface size substituted when the decoder cannot report frame dimensions.
pub const FALLBACK_DIMENSIONS: (u32, u32) = (1280, 720);

/// Still-image encoding applied to every sampled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageEncoding {
    /// Lossless PNG. This is the default.
    #[default]
    Png,
    /// Lossy JPEG with a quality between 1 and 100.
    Jpeg {
        /// Encoder quality, 1 (smallest) to 100 (best).
        quality: u8,
    },
}

impl ImageEncoding {
    /// JPEG encoding with `quality` clamped into `1..=100`.
    pub fn jpeg(quality: u8) -> Self {
        ImageEncoding::Jpeg {
            quality: quality.clamp(1, 100),
        }
    }

    /// File extension used in frame filenames.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageEncoding::Png => "png",
            ImageEncoding::Jpeg { .. } => "jpg",
        }
    }

    /// MIME type of the encoded payload.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageEncoding::Png => "image/png",
            ImageEncoding::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// Raise a step that is zero, negative, or not finite to [`MIN_STEP_SECONDS`].
///
/// Valid positive steps are returned unchanged.
pub fn coerce_step(step_seconds: f64) -> f64 {
    if step_seconds.is_finite() && step_seconds > 0.0 {
        step_seconds
    } else {
        MIN_STEP_SECONDS
    }
}

/// Parse a user-entered frame ceiling.
///
/// Missing, blank, or non-numeric text yields [`DEFAULT_MAX_FRAMES`]. Leading
/// digits are honoured (`"120 frames"` is 120) and values below 1 are raised
/// to 1.
///
/// ```
/// use videobreaker::configuration::parse_max_frames;
///
/// assert_eq!(parse_max_frames(None), 300);
/// assert_eq!(parse_max_frames(Some("abc")), 300);
/// assert_eq!(parse_max_frames(Some("0")), 1);
/// assert_eq!(parse_max_frames(Some("42")), 42);
/// ```
pub fn parse_max_frames(text: Option<&str>) -> u32 {
    let Some(text) = text.map(str::trim).filter(|text| !text.is_empty()) else {
        return DEFAULT_MAX_FRAMES;
    };

    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .find(|character: char| !character.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return DEFAULT_MAX_FRAMES;
    }
    if negative {
        return 1;
    }

    digits.parse::<u32>().unwrap_or(u32::MAX).max(1)
}

/// Configuration for an extraction run.
///
/// All fields have sensible defaults: a one-second step, a 300 frame
/// ceiling, PNG output, no progress callback, progress every 10 frames and no
/// seek deadline.
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) step_seconds: f64,
    pub(crate) max_frames: u32,
    pub(crate) encoding: ImageEncoding,
    /// Progress and status callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// How often to fire the progress callback (every N sampled indices).
    pub(crate) batch_size: u64,
    pub(crate) seek_timeout: Option<Duration>,
    pub(crate) fallback_dimensions: (u32, u32),
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("step_seconds", &self.step_seconds)
            .field("max_frames", &self.max_frames)
            .field("encoding", &self.encoding)
            .field("has_progress", &true)
            .field("batch_size", &self.batch_size)
            .field("seek_timeout", &self.seek_timeout)
            .field("fallback_dimensions", &self.fallback_dimensions)
            .finish()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self {
            step_seconds: DEFAULT_STEP_SECONDS,
            max_frames: DEFAULT_MAX_FRAMES,
            encoding: ImageEncoding::Png,
            progress: Arc::new(NoOpProgress),
            batch_size: 10,
            seek_timeout: None,
            fallback_dimensions: FALLBACK_DIMENSIONS,
        }
    }

    /// Set the sampling interval in seconds.
    ///
    /// Zero, negative, and non-finite values are raised to
    /// [`MIN_STEP_SECONDS`].
    #[must_use]
    pub fn with_step(mut self, step_seconds: f64) -> Self {
        self.step_seconds = coerce_step(step_seconds);
        self
    }

    /// Set the ceiling on extracted frames. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: u32) -> Self {
        self.max_frames = max_frames.max(1);
        self
    }

    /// Set the still-image encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: ImageEncoding) -> Self {
        self.encoding = match encoding {
            ImageEncoding::Jpeg { quality } => ImageEncoding::jpeg(quality),
            other => other,
        };
        self
    }

    /// Attach a progress and status callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires.
    ///
    /// A value of 1 means every sampled index; 10 means every 10th index.
    /// The final index always reports. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Bound how long a single seek may decode before giving up.
    ///
    /// Without a bound a decoder that never presents the target frame stalls
    /// the run. A zero duration is treated as no bound.
    #[must_use]
    pub fn with_seek_timeout(mut self, timeout: Duration) -> Self {
        self.seek_timeout = if timeout.is_zero() { None } else { Some(timeout) };
        self
    }

    /// Set the surface size used when the decoder reports no dimensions.
    #[must_use]
    pub fn with_fallback_dimensions(mut self, width: u32, height: u32) -> Self {
        self.fallback_dimensions = (width.max(1), height.max(1));
        self
    }

    /// The (coerced) sampling interval in seconds.
    pub fn step_seconds(&self) -> f64 {
        self.step_seconds
    }

    /// The (coerced) frame ceiling.
    pub fn max_frames(&self) -> u32 {
        self.max_frames
    }

    /// The configured image encoding.
    pub fn encoding(&self) -> ImageEncoding {
        self.encoding
    }

    /// Progress reporting cadence.
    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Per-seek deadline, if any.
    pub fn seek_timeout(&self) -> Option<Duration> {
        self.seek_timeout
    }

    /// Surface size used when the decoder reports no dimensions.
    pub fn fallback_dimensions(&self) -> (u32, u32) {
        self.fallback_dimensions
    }

    pub(crate) fn progress(&self) -> &dyn ProgressCallback {
        self.progress.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_steps_are_raised() {
        assert_eq!(coerce_step(0.0), MIN_STEP_SECONDS);
        assert_eq!(coerce_step(-2.0), MIN_STEP_SECONDS);
        assert_eq!(coerce_step(f64::NAN), MIN_STEP_SECONDS);
        assert_eq!(coerce_step(f64::INFINITY), MIN_STEP_SECONDS);
        assert_eq!(coerce_step(0.5), 0.5);
        assert_eq!(coerce_step(0.001), 0.001);
    }

    #[test]
    fn max_frames_parsing() {
        assert_eq!(parse_max_frames(Some("")), DEFAULT_MAX_FRAMES);
        assert_eq!(parse_max_frames(Some("   ")), DEFAULT_MAX_FRAMES);
        assert_eq!(parse_max_frames(Some("12abc")), 12);
        assert_eq!(parse_max_frames(Some("-5")), 1);
        assert_eq!(parse_max_frames(Some("+7")), 7);
        assert_eq!(parse_max_frames(Some("99999999999")), u32::MAX);
    }

    #[test]
    fn jpeg_quality_is_clamped() {
        assert_eq!(ImageEncoding::jpeg(0), ImageEncoding::Jpeg { quality: 1 });
        assert_eq!(ImageEncoding::jpeg(200), ImageEncoding::Jpeg { quality: 100 });
        let options = ExtractOptions::new().with_encoding(ImageEncoding::Jpeg { quality: 0 });
        assert_eq!(options.encoding(), ImageEncoding::Jpeg { quality: 1 });
    }

    #[test]
    fn zero_max_frames_is_raised() {
        assert_eq!(ExtractOptions::new().with_max_frames(0).max_frames(), 1);
    }
}
