//! Frame sampling.
//!
//! A [`FrameSampler`] owns the run's [`DecodeSurface`] and turns "the frame at
//! time *t*" into an encoded still image: clamp, seek, rasterize, encode.

use std::time::Duration;

use crate::{
    configuration::{ExtractOptions, ImageEncoding},
    error::VideoBreakerError,
    metadata::VideoMetadata,
    source::VideoSource,
    surface::DecodeSurface,
};

/// Clamp a requested time into `[0, duration]`.
///
/// NaN maps to 0. When `duration` itself is not usable only the lower bound
/// applies.
///
/// ```
/// use videobreaker::clamp_time;
///
/// assert_eq!(clamp_time(-1.0, 5.0), 0.0);
/// assert_eq!(clamp_time(7.5, 5.0), 5.0);
/// assert_eq!(clamp_time(2.5, 5.0), 2.5);
/// ```
pub fn clamp_time(time: f64, duration: f64) -> f64 {
    if time.is_nan() {
        return 0.0;
    }
    if duration.is_finite() && duration > 0.0 {
        time.clamp(0.0, duration)
    } else {
        time.max(0.0)
    }
}

/// Seeks a [`VideoSource`] and encodes what it presents.
///
/// One sampler serves one run. The surface is allocated at construction and
/// reused for every sample.
#[derive(Debug)]
pub struct FrameSampler {
    surface: DecodeSurface,
    encoding: ImageEncoding,
    seek_timeout: Option<Duration>,
    warmed_up: bool,
}

impl FrameSampler {
    /// Create a sampler whose surface matches `metadata`'s dimensions, or the
    /// configured fallback when the decoder reported none.
    pub fn new(metadata: &VideoMetadata, options: &ExtractOptions) -> Self {
        let (width, height) = metadata.surface_dimensions(options.fallback_dimensions());
        log::debug!("Allocating {width}x{height} decode surface");
        Self {
            surface: DecodeSurface::new(width, height),
            encoding: options.encoding(),
            seek_timeout: options.seek_timeout(),
            warmed_up: false,
        }
    }

    /// The decode surface.
    pub fn surface(&self) -> &DecodeSurface {
        &self.surface
    }

    /// The encoding applied to every sample.
    pub fn encoding(&self) -> ImageEncoding {
        self.encoding
    }

    /// Prime the source once before the first sample.
    ///
    /// Failure is logged and otherwise ignored. Later calls do nothing.
    pub fn warm_up(&mut self, source: &mut dyn VideoSource) {
        if self.warmed_up {
            return;
        }
        self.warmed_up = true;
        if let Err(error) = source.warm_up() {
            log::debug!("Decoder warm-up failed, continuing: {error}");
        }
    }

    /// Sample the frame at `time` seconds.
    ///
    /// The time is clamped into the source's `[0, duration]` before seeking.
    /// Returns `Ok(None)` when the source presents nothing or the encoder
    /// produces an empty payload; the caller skips that timestamp.
    ///
    /// # Errors
    ///
    /// Seek, rasterize and encoder failures are returned as-is.
    pub fn sample_at(
        &mut self,
        source: &mut dyn VideoSource,
        time: f64,
    ) -> Result<Option<Vec<u8>>, VideoBreakerError> {
        let target = clamp_time(time, source.metadata().duration);
        source.seek(target, self.seek_timeout)?;

        if !source.rasterize(&mut self.surface)? {
            log::debug!("No frame presented at {target:.2}s");
            return Ok(None);
        }

        let payload = self.surface.encode(self.encoding)?;
        if payload.is_empty() {
            log::debug!("Encoder produced no payload at {target:.2}s");
            return Ok(None);
        }
        Ok(Some(payload))
    }
}
