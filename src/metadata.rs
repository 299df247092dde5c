//! Video metadata.
//!
//! [`VideoMetadata`] is read once when a [`VideoSource`](crate::VideoSource)
//! is loaded and cached for the lifetime of that source.

/// Metadata for the loaded video stream.
///
/// `duration` is kept as raw seconds so that a decoder that cannot determine
/// it can report NaN or infinity, which the pipeline treats as unreadable
/// media.
///
/// # Example
///
/// ```no_run
/// use videobreaker::{FfmpegSource, VideoSource};
///
/// let source = FfmpegSource::open("input.mp4").unwrap();
/// let metadata = source.metadata();
/// println!("Duration: {:.2}s", metadata.duration);
/// println!("Size: {}x{}", metadata.width, metadata.height);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Total duration in seconds. May be NaN, infinite, or zero when the
    /// container does not carry it.
    pub duration: f64,
    /// Frame width in pixels, 0 if unknown.
    pub width: u32,
    /// Frame height in pixels, 0 if unknown.
    pub height: u32,
    /// Frames per second (approximate for variable-frame-rate content), 0 if
    /// unknown.
    pub frames_per_second: f64,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}

impl VideoMetadata {
    /// Metadata with only duration and dimensions known.
    pub fn new(duration: f64, width: u32, height: u32) -> Self {
        Self {
            duration,
            width,
            height,
            frames_per_second: 0.0,
            codec: "unknown".to_string(),
            format: "unknown".to_string(),
        }
    }

    /// Returns `true` when the duration is finite and positive.
    pub fn has_usable_duration(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }

    /// Dimensions to allocate the decode surface with, substituting
    /// `fallback` when either reported dimension is zero.
    pub fn surface_dimensions(&self, fallback: (u32, u32)) -> (u32, u32) {
        if self.width == 0 || self.height == 0 {
            fallback
        } else {
            (self.width, self.height)
        }
    }
}
