//! Media loading and the seekable video source.
//!
//! [`VideoSource`] is the seam between the extraction pipeline and whatever
//! decodes the video. [`FfmpegSource`] is the FFmpeg-backed implementation:
//! it owns the demuxer and a single decoder, and behaves like a playback
//! cursor. Seeking moves the cursor and decodes forward until the frame for
//! the target time is presented. Rasterizing copies that frame onto a
//! [`DecodeSurface`].
//!
//! [`MediaLoader`] turns a path into a boxed source; [`FfmpegLoader`] is the
//! default.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::{
    conversion::{
        copy_plane, pts_to_seconds, relative_frame_seconds, seconds_to_seek_timestamp,
        stream_start_seconds,
    },
    error::VideoBreakerError,
    metadata::VideoMetadata,
    surface::DecodeSurface,
};

/// A decodable video with a single playback cursor.
///
/// All operations are sequential: a seek must finish before the next seek or
/// rasterize is issued, because the decoder is one stateful cursor.
pub trait VideoSource {
    /// Metadata read when the source was loaded.
    fn metadata(&self) -> &VideoMetadata;

    /// Timestamp, in seconds, of the frame currently presented.
    fn position(&self) -> f64;

    /// Prime the decoder so the first sampled frame is not blank.
    ///
    /// Callers treat failure as non-fatal.
    fn warm_up(&mut self) -> Result<(), VideoBreakerError>;

    /// Move the cursor to `seconds` and block until the frame for that time
    /// is presented, or until `timeout` elapses.
    ///
    /// `seconds` is expected to be inside `[0, duration]`.
    fn seek(&mut self, seconds: f64, timeout: Option<Duration>) -> Result<(), VideoBreakerError>;

    /// Draw the presented frame onto `surface`, scaling to the surface size.
    ///
    /// Returns `false` when no frame is presented (nothing was drawn).
    fn rasterize(&mut self, surface: &mut DecodeSurface) -> Result<bool, VideoBreakerError>;
}

/// Produces a ready-to-sample [`VideoSource`] from a file path.
pub trait MediaLoader {
    /// Open `path` and read its duration and dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`VideoBreakerError::FileOpen`] or
    /// [`VideoBreakerError::NoVideoStream`] if the file cannot be decoded as a
    /// video.
    fn load(&mut self, path: &Path) -> Result<Box<dyn VideoSource>, VideoBreakerError>;
}

/// The default [`MediaLoader`], backed by FFmpeg.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegLoader;

impl MediaLoader for FfmpegLoader {
    fn load(&mut self, path: &Path) -> Result<Box<dyn VideoSource>, VideoBreakerError> {
        Ok(Box::new(FfmpegSource::open(path)?))
    }
}

/// Scaler cache key: source format and size, destination size.
type ScalerKey = (Pixel, u32, u32, u32, u32);

/// FFmpeg-backed [`VideoSource`].
///
/// Created via [`FfmpegSource::open`]. Dropping it releases the demuxer,
/// decoder and scaler.
pub struct FfmpegSource {
    input_context: Input,
    decoder: VideoDecoder,
    stream_index: usize,
    time_base: Rational,
    /// Stream start time in seconds. Seek targets and positions are
    /// relative to it.
    start_offset: f64,
    metadata: VideoMetadata,
    scaler: Option<(ScalerKey, ScalingContext)>,
    current: Option<VideoFrame>,
    position: f64,
    path: PathBuf,
}

impl Debug for FfmpegSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FfmpegSource")
            .field("metadata", &self.metadata)
            .field("stream_index", &self.stream_index)
            .field("start_offset", &self.start_offset)
            .field("position", &self.position)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl FfmpegSource {
    /// Open a video file for sampling.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, selects the best
    /// video stream and reads its duration and dimensions. A container
    /// without a usable duration falls back to the stream duration; when
    /// neither is known the reported duration is NaN.
    ///
    /// # Errors
    ///
    /// Returns [`VideoBreakerError::FileOpen`] if the file cannot be opened or
    /// its decoder cannot be created, and [`VideoBreakerError::NoVideoStream`]
    /// if it has no video.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use videobreaker::{FfmpegSource, VideoBreakerError};
    ///
    /// let source = FfmpegSource::open("video.mp4")?;
    /// # Ok::<(), VideoBreakerError>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VideoBreakerError> {
        let path = path.as_ref().to_path_buf();

        log::debug!("Opening video file: {}", path.display());

        ffmpeg_next::init().map_err(|error| VideoBreakerError::FileOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| VideoBreakerError::FileOpen {
                path: path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(VideoBreakerError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = stream.time_base();
        let start_offset = stream_start_seconds(stream.start_time(), time_base);

        let decoder_context =
            CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                VideoBreakerError::FileOpen {
                    path: path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| VideoBreakerError::FileOpen {
                    path: path.clone(),
                    reason: format!("Failed to create video decoder: {error}"),
                })?;

        // Container duration first, then the stream's own duration.
        let container_microseconds = input_context.duration();
        let duration = if container_microseconds > 0 {
            container_microseconds as f64 / 1_000_000.0
        } else if stream.duration() > 0 {
            pts_to_seconds(stream.duration(), time_base)
        } else {
            f64::NAN
        };

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            0.0
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            duration,
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            codec,
            format: input_context.format().name().to_string(),
        };

        if start_offset != 0.0 {
            log::debug!("Video stream starts at {start_offset:.3}s");
        }

        log::info!(
            "Opened video file: {} (format={}, duration={:.2}s, {}x{}, {:.2} fps, codec={})",
            path.display(),
            metadata.format,
            metadata.duration,
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            decoder,
            stream_index,
            time_base,
            start_offset,
            metadata,
            scaler: None,
            current: None,
            position: 0.0,
            path,
        })
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Half a frame interval: frames whose timestamp falls within this
    /// distance before the target are accepted as the target frame.
    fn tolerance(&self) -> f64 {
        if self.metadata.frames_per_second > 0.0 {
            0.5 / self.metadata.frames_per_second
        } else {
            0.0
        }
    }

    /// Clip-relative time of a decoded frame, `None` without a timestamp.
    fn frame_seconds(&self, frame: &VideoFrame) -> Option<f64> {
        relative_frame_seconds(
            frame.timestamp().or(frame.pts()),
            self.time_base,
            self.start_offset,
        )
    }

    fn present(&mut self, frame: VideoFrame, seconds: f64) {
        self.position = seconds;
        self.current = Some(frame);
    }

    /// Clip-relative time of `frame` when it is at or past `threshold`.
    /// Frames without a timestamp are never accepted as the target.
    fn reaches(&self, frame: &VideoFrame, threshold: f64) -> Option<f64> {
        match self.frame_seconds(frame) {
            Some(seconds) if seconds >= threshold => Some(seconds),
            Some(_) => None,
            None => {
                log::debug!("Ignoring decoded frame without a timestamp");
                None
            }
        }
    }
}

impl VideoSource for FfmpegSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn warm_up(&mut self) -> Result<(), VideoBreakerError> {
        self.seek(0.0, None)?;
        if self.current.is_none() {
            return Err(VideoBreakerError::VideoDecodeError(
                "Decoder produced no frame during warm-up".to_string(),
            ));
        }
        Ok(())
    }

    fn seek(&mut self, seconds: f64, timeout: Option<Duration>) -> Result<(), VideoBreakerError> {
        let deadline = timeout.map(|timeout| (Instant::now() + timeout, timeout));
        let threshold = seconds - self.tolerance();

        // Land on the keyframe at or before the target, then decode forward.
        let seek_timestamp = seconds_to_seek_timestamp(seconds, self.start_offset);
        if let Err(error) = self.input_context.seek(seek_timestamp, ..seek_timestamp) {
            // No keyframe at or before the target, e.g. the first keyframe
            // sits slightly after the stream start.
            log::debug!("Backward seek to {seconds:.2}s failed ({error}), seeking forward");
            self.input_context.seek(seek_timestamp, seek_timestamp..)?;
        }
        self.decoder.flush();
        self.current = None;

        let mut decoded_frame = VideoFrame::empty();
        let mut previous_frame = VideoFrame::empty();
        let mut previous_seconds = None;
        let mut target = None;

        'packets: for (stream, packet) in self.input_context.packets() {
            if let Some((deadline, timeout)) = deadline {
                if Instant::now() > deadline {
                    return Err(VideoBreakerError::SeekTimeout {
                        target: seconds,
                        timeout,
                    });
                }
            }
            if stream.index() != self.stream_index {
                continue;
            }

            self.decoder.send_packet(&packet)?;

            while self.decoder.receive_frame(&mut decoded_frame).is_ok() {
                if let Some(frame_seconds) = self.reaches(&decoded_frame, threshold) {
                    let frame = std::mem::replace(&mut decoded_frame, VideoFrame::empty());
                    target = Some((frame, frame_seconds));
                    break 'packets;
                }
                if let Some(frame_seconds) = self.frame_seconds(&decoded_frame) {
                    std::mem::swap(&mut decoded_frame, &mut previous_frame);
                    previous_seconds = Some(frame_seconds);
                }
            }
        }

        if let Some((frame, frame_seconds)) = target {
            self.present(frame, frame_seconds);
            return Ok(());
        }

        // End of stream: drain the decoder.
        self.decoder.send_eof()?;
        while self.decoder.receive_frame(&mut decoded_frame).is_ok() {
            if let Some(frame_seconds) = self.reaches(&decoded_frame, threshold) {
                self.present(decoded_frame, frame_seconds);
                return Ok(());
            }
            if let Some(frame_seconds) = self.frame_seconds(&decoded_frame) {
                std::mem::swap(&mut decoded_frame, &mut previous_frame);
                previous_seconds = Some(frame_seconds);
            }
        }

        // Target is past the last frame: keep showing the last one.
        match previous_seconds {
            Some(frame_seconds) => self.present(previous_frame, frame_seconds),
            None => log::debug!("Seek to {seconds:.2}s presented no frame"),
        }
        Ok(())
    }

    fn rasterize(&mut self, surface: &mut DecodeSurface) -> Result<bool, VideoBreakerError> {
        let Some(frame) = self.current.as_ref() else {
            return Ok(false);
        };

        let key: ScalerKey = (
            frame.format(),
            frame.width(),
            frame.height(),
            surface.width(),
            surface.height(),
        );
        let cached = matches!(&self.scaler, Some((cached_key, _)) if *cached_key == key);
        if !cached {
            let scaler = ScalingContext::get(
                frame.format(),
                frame.width(),
                frame.height(),
                Pixel::RGB24,
                surface.width(),
                surface.height(),
                ScalingFlags::BILINEAR,
            )?;
            self.scaler = Some((key, scaler));
        }
        let Some((_, scaler)) = self.scaler.as_mut() else {
            return Ok(false);
        };

        let mut rgb_frame = VideoFrame::empty();
        scaler.run(frame, &mut rgb_frame)?;

        let row_bytes = surface.row_bytes();
        copy_plane(
            rgb_frame.data(0),
            rgb_frame.stride(0),
            surface.pixels_mut(),
            row_bytes,
        );
        Ok(true)
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        log::debug!("Releasing video source {}", self.path.display());
    }
}
