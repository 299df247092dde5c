//! Async extraction (feature `async`).
//!
//! [`ExtractionStream`] runs the same sequential pipeline as
//! [`ExtractionSession::run`] on a `tokio::task::spawn_blocking` thread and
//! delivers everything it reports as [`ExtractionEvent`]s through a bounded
//! channel. Seeking stays strictly sequential on the worker; the async side
//! only awaits events.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//!
//! use videobreaker::{ExtractOptions, ExtractionEvent, ExtractionStream};
//!
//! # async fn example() {
//! let mut stream = ExtractionStream::open("input.mp4", ExtractOptions::new());
//!
//! while let Some(event) = stream.next().await {
//!     match event {
//!         ExtractionEvent::Status(status) => println!("{status}"),
//!         ExtractionEvent::Frame(frame) => println!("got {}", frame.filename()),
//!         ExtractionEvent::Finished(outcome) => println!("finished: {}", outcome.is_ok()),
//!         _ => {}
//!     }
//! }
//! # }
//! ```

use std::{
    path::PathBuf,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tokio::{
    sync::mpsc::{Receiver, Sender},
    task::JoinHandle,
};
use tokio_stream::Stream;

use crate::{
    configuration::ExtractOptions,
    error::VideoBreakerError,
    frame::ExtractedFrame,
    progress::{ProgressCallback, ProgressInfo},
    session::{ExtractionRun, ExtractionSession, FrameSink},
    source::{FfmpegLoader, MediaLoader},
    status::RunStatus,
};

/// Default bounded-channel capacity for [`ExtractionStream`].
///
/// Kept small so encoded frames do not pile up when the consumer is slow.
const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// One notification from a background extraction.
#[derive(Debug)]
#[non_exhaustive]
pub enum ExtractionEvent {
    /// The run status changed.
    Status(RunStatus),
    /// Numeric progress.
    Progress(ProgressInfo),
    /// A record was extracted.
    Frame(ExtractedFrame),
    /// The run is over. This is always the last event.
    Finished(Result<ExtractionRun, VideoBreakerError>),
}

/// A stream of [`ExtractionEvent`]s produced by a background run.
///
/// Dropping the stream closes the channel. The worker still finishes the
/// run it started, discarding further events.
pub struct ExtractionStream {
    receiver: Receiver<ExtractionEvent>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl Stream for ExtractionStream {
    type Item = ExtractionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl ExtractionStream {
    /// Extract frames from `path` with the FFmpeg loader.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open<P: Into<PathBuf>>(path: P, options: ExtractOptions) -> Self {
        extraction_stream(FfmpegLoader, path.into(), options)
    }

    /// Wait for the run to finish, discarding intermediate events.
    ///
    /// # Errors
    ///
    /// Returns the run's error, or [`VideoBreakerError::VideoDecodeError`] if
    /// the worker stopped without reporting an outcome.
    pub async fn finish(mut self) -> Result<ExtractionRun, VideoBreakerError> {
        while let Some(event) = self.receiver.recv().await {
            if let ExtractionEvent::Finished(outcome) = event {
                return outcome;
            }
        }
        Err(VideoBreakerError::VideoDecodeError(
            "Extraction worker stopped without a result".to_string(),
        ))
    }
}

/// Run an extraction with a custom loader on a blocking thread.
///
/// The callback configured in `options` still receives every notification;
/// the stream receives copies.
pub fn extraction_stream<L>(mut loader: L, path: PathBuf, options: ExtractOptions) -> ExtractionStream
where
    L: MediaLoader + Send + 'static,
{
    let (sender, receiver) = tokio::sync::mpsc::channel(DEFAULT_CHANNEL_CAPACITY);

    let handle = tokio::task::spawn_blocking(move || {
        let forward = Arc::new(ChannelProgress {
            sender: sender.clone(),
            inner: options.progress.clone(),
        });
        let options = options.with_progress(forward);
        let mut sink = ChannelSink {
            sender: sender.clone(),
        };

        let mut session = ExtractionSession::new();
        let started = session
            .run(&mut loader, &path, &options, &mut sink)
            .map(|_| ());
        let outcome = started.map(|()| session.into_run());

        // The receiver may have been dropped.
        let _ = sender.blocking_send(ExtractionEvent::Finished(outcome));
    });

    ExtractionStream { receiver, handle }
}

struct ChannelProgress {
    sender: Sender<ExtractionEvent>,
    inner: Arc<dyn ProgressCallback>,
}

impl ProgressCallback for ChannelProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.inner.on_progress(info);
        let _ = self
            .sender
            .blocking_send(ExtractionEvent::Progress(info.clone()));
    }

    fn on_status(&self, status: &RunStatus) {
        self.inner.on_status(status);
        let _ = self
            .sender
            .blocking_send(ExtractionEvent::Status(status.clone()));
    }
}

struct ChannelSink {
    sender: Sender<ExtractionEvent>,
}

impl FrameSink for ChannelSink {
    fn on_frame(&mut self, frame: &ExtractedFrame) {
        let _ = self
            .sender
            .blocking_send(ExtractionEvent::Frame(frame.clone()));
    }
}
