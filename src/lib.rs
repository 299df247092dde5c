//! # videobreaker
//!
//! Break a video into still frames at fixed time steps and package them into
//! a ZIP archive.
//!
//! One video in, an ordered sequence of timestamped images out. Frames are
//! sampled every `step` seconds (0, step, 2·step, … up to the duration, capped
//! by a frame ceiling), encoded as PNG or JPEG, and handed to the caller as
//! they are produced. The collected frames can then be packaged into a single
//! archive. Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Extract Frames
//!
//! ```no_run
//! use videobreaker::{ExtractOptions, ExtractionSession, NoOpSink, VideoBreakerError};
//!
//! let mut session = ExtractionSession::new();
//! let options = ExtractOptions::new().with_step(1.0).with_max_frames(300);
//! let run = session.run_file("input.mp4", &options, &mut NoOpSink)?;
//!
//! println!("{}", run.status_text());
//! for frame in run.records() {
//!     frame.save_to("frames")?;
//! }
//! # Ok::<(), VideoBreakerError>(())
//! ```
//!
//! ### Package as ZIP
//!
//! ```no_run
//! use videobreaker::{
//!     ArchivePackager, DEFAULT_ARCHIVE_NAME, ExtractOptions, ExtractionSession, NoOpSink,
//!     VideoBreakerError,
//! };
//!
//! let options = ExtractOptions::new();
//! let mut session = ExtractionSession::new();
//! session.run_file("input.mp4", &options, &mut NoOpSink)?;
//! session.save_archive(&ArchivePackager::new(), DEFAULT_ARCHIVE_NAME, &options)?;
//! # Ok::<(), VideoBreakerError>(())
//! ```
//!
//! ### Live Previews
//!
//! ```no_run
//! use videobreaker::{ExtractOptions, ExtractionSession, PreviewGallery, VideoBreakerError};
//!
//! let mut gallery = PreviewGallery::new(240);
//! let mut session = ExtractionSession::new();
//! session.run_file("input.mp4", &ExtractOptions::new(), &mut gallery)?;
//! println!("{} previews", gallery.len());
//! # Ok::<(), VideoBreakerError>(())
//! ```
//!
//! ## Features
//!
//! - **Fixed-step sampling** with a frame ceiling and a truncation notice
//! - **Sequential seeking** on a single decoder, with an optional per-seek
//!   deadline
//! - **PNG or JPEG** output through one reusable decode surface
//! - **Status lines and numeric progress** via [`ProgressCallback`]
//! - **Presentation hooks** via [`FrameSink`], with [`PreviewGallery`]
//!   thumbnails
//! - **ZIP packaging** under a `frames/` folder, DEFLATE compressed
//! - **Pluggable decoding** via the [`MediaLoader`] and [`VideoSource`] traits
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `ExtractionStream` runs extraction on a blocking Tokio thread |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system. See the
//! README for platform-specific instructions.

pub mod archive;
pub mod configuration;
mod conversion;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod metadata;
pub mod preview;
pub mod progress;
pub mod sampler;
pub mod session;
pub mod source;
pub mod status;
#[cfg(feature = "async")]
pub mod stream;
pub mod surface;

pub use archive::{ArchiveOptions, ArchivePackager, DEFAULT_ARCHIVE_NAME};
pub use configuration::{
    DEFAULT_JPEG_QUALITY, DEFAULT_MAX_FRAMES, DEFAULT_STEP_SECONDS, ExtractOptions, ImageEncoding,
    MIN_STEP_SECONDS, STEP_PRESETS, coerce_step, parse_max_frames,
};
pub use error::VideoBreakerError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame::{ExtractedFrame, frame_filename};
pub use metadata::VideoMetadata;
pub use preview::{PreviewGallery, PreviewHandle};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use sampler::{FrameSampler, clamp_time};
pub use session::{
    ExtractionRun, ExtractionSession, FailureKind, FramePlan, FrameSink, NoOpSink, RunState,
};
pub use source::{FfmpegLoader, FfmpegSource, MediaLoader, VideoSource};
pub use status::RunStatus;
#[cfg(feature = "async")]
pub use stream::{ExtractionEvent, ExtractionStream, extraction_stream};
pub use surface::DecodeSurface;
