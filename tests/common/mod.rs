//! Scripted media backend shared by the integration tests.
//!
//! `ScriptedLoader` hands out `ScriptedSource`s that report a fixed duration
//! and size, paint a distinct flat colour for every rasterized frame and log
//! every seek, so the pipeline can be exercised without FFmpeg fixtures.

#![allow(dead_code)]

use std::{
    collections::HashSet,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tempfile::NamedTempFile;
use videobreaker::{
    DecodeSurface, MediaLoader, ProgressCallback, ProgressInfo, RunStatus, VideoBreakerError,
    VideoMetadata, VideoSource,
};

/// What the scripted source reports and how it misbehaves.
#[derive(Debug, Clone)]
pub struct Script {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Rasterize calls (0-based) that present nothing.
    pub blank_frames: HashSet<usize>,
    /// Seek call (0-based, warm-up excluded) that fails.
    pub failing_seek: Option<usize>,
    /// Seek call (0-based, warm-up excluded) that never presents a frame
    /// and so runs into the caller's timeout, if any.
    pub stalled_seek: Option<usize>,
    pub fail_open: bool,
    pub fail_warm_up: bool,
}

impl Script {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            width: 32,
            height: 18,
            blank_frames: HashSet::new(),
            failing_seek: None,
            stalled_seek: None,
            fail_open: false,
            fail_warm_up: false,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_blank_frames(mut self, frames: &[usize]) -> Self {
        self.blank_frames = frames.iter().copied().collect();
        self
    }

    pub fn with_failing_seek(mut self, call: usize) -> Self {
        self.failing_seek = Some(call);
        self
    }

    pub fn with_stalled_seek(mut self, call: usize) -> Self {
        self.stalled_seek = Some(call);
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_warm_up(mut self) -> Self {
        self.fail_warm_up = true;
        self
    }
}

/// Everything the scripted sources observed.
#[derive(Debug, Default)]
pub struct SourceLog {
    pub loads: AtomicUsize,
    pub drops: AtomicUsize,
    pub warm_ups: AtomicUsize,
    pub seeks: Mutex<Vec<f64>>,
    pub surfaces: Mutex<Vec<(u32, u32)>>,
}

impl SourceLog {
    pub fn seeks(&self) -> Vec<f64> {
        self.seeks.lock().unwrap().clone()
    }

    pub fn surfaces(&self) -> Vec<(u32, u32)> {
        self.surfaces.lock().unwrap().clone()
    }
}

pub struct ScriptedLoader {
    pub script: Script,
    pub log: Arc<SourceLog>,
}

impl ScriptedLoader {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            log: Arc::new(SourceLog::default()),
        }
    }
}

impl MediaLoader for ScriptedLoader {
    fn load(&mut self, path: &Path) -> Result<Box<dyn VideoSource>, VideoBreakerError> {
        self.log.loads.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_open {
            return Err(VideoBreakerError::FileOpen {
                path: path.to_path_buf(),
                reason: "Invalid data found when processing input".to_string(),
            });
        }
        Ok(Box::new(ScriptedSource {
            metadata: VideoMetadata::new(self.script.duration, self.script.width, self.script.height),
            script: self.script.clone(),
            log: self.log.clone(),
            position: 0.0,
            seek_calls: 0,
            rasterize_calls: 0,
        }))
    }
}

pub struct ScriptedSource {
    metadata: VideoMetadata,
    script: Script,
    log: Arc<SourceLog>,
    position: f64,
    seek_calls: usize,
    rasterize_calls: usize,
}

impl VideoSource for ScriptedSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn warm_up(&mut self) -> Result<(), VideoBreakerError> {
        self.log.warm_ups.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_warm_up {
            return Err(VideoBreakerError::VideoDecodeError(
                "autoplay blocked".to_string(),
            ));
        }
        Ok(())
    }

    fn seek(&mut self, seconds: f64, timeout: Option<Duration>) -> Result<(), VideoBreakerError> {
        let call = self.seek_calls;
        self.seek_calls += 1;
        if self.script.failing_seek == Some(call) {
            return Err(VideoBreakerError::VideoDecodeError(format!(
                "decoder stalled at {seconds:.2}s"
            )));
        }
        if self.script.stalled_seek == Some(call) {
            if let Some(timeout) = timeout {
                return Err(VideoBreakerError::SeekTimeout {
                    target: seconds,
                    timeout,
                });
            }
        }
        self.log.seeks.lock().unwrap().push(seconds);
        self.position = seconds;
        Ok(())
    }

    fn rasterize(&mut self, surface: &mut DecodeSurface) -> Result<bool, VideoBreakerError> {
        let call = self.rasterize_calls;
        self.rasterize_calls += 1;
        self.log
            .surfaces
            .lock()
            .unwrap()
            .push((surface.width(), surface.height()));
        if self.script.blank_frames.contains(&call) {
            return Ok(false);
        }
        surface.pixels_mut().fill((call % 251) as u8);
        Ok(true)
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.log.drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records every status line and progress report.
#[derive(Default)]
pub struct Recorder {
    pub statuses: Mutex<Vec<RunStatus>>,
    pub progress: Mutex<Vec<ProgressInfo>>,
}

impl Recorder {
    pub fn statuses(&self) -> Vec<RunStatus> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn status_lines(&self) -> Vec<String> {
        self.statuses().iter().map(ToString::to_string).collect()
    }

    pub fn progress_counts(&self) -> Vec<u64> {
        self.progress
            .lock()
            .unwrap()
            .iter()
            .map(|info| info.current)
            .collect()
    }
}

impl ProgressCallback for Recorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.progress.lock().unwrap().push(info.clone());
    }

    fn on_status(&self, status: &RunStatus) {
        self.statuses.lock().unwrap().push(status.clone());
    }
}

/// An existing file to hand to `ExtractionSession::run` as the input path.
pub fn input_file() -> NamedTempFile {
    NamedTempFile::new().expect("Failed to create input placeholder")
}
