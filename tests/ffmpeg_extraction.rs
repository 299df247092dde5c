//! FFmpeg-backed extraction tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`
//! and return early when they are missing.

use std::{path::Path, time::Duration};

use videobreaker::{
    ArchivePackager, ExtractOptions, ExtractionSession, FfmpegSource, ImageEncoding, NoOpSink,
    PreviewGallery, RunState, VideoSource,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

/// Same pattern in MPEG-TS whose timestamps start at 2s.
fn offset_video_path() -> &'static str {
    "tests/fixtures/offset_start.ts"
}

#[test]
fn metadata_is_read_on_open() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let source = FfmpegSource::open(path).expect("Failed to open fixture");
    let metadata = source.metadata();
    assert!(metadata.has_usable_duration());
    assert!(metadata.width > 0);
    assert!(metadata.height > 0);
    assert_eq!(source.path(), Path::new(path));
}

#[test]
fn seek_presents_frame_near_target() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = FfmpegSource::open(path).expect("Failed to open fixture");
    source.seek(1.0, None).expect("seek");
    assert!((source.position() - 1.0).abs() < 0.1);

    source.seek(0.0, Some(Duration::from_secs(10))).expect("seek back");
    assert!(source.position() < 0.1);
}

#[test]
fn seek_is_relative_to_stream_start() {
    let path = offset_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = FfmpegSource::open(path).expect("Failed to open fixture");
    assert!(source.metadata().duration < 6.0);

    source.warm_up().expect("warm-up");
    assert!(source.position() < 0.1);

    source.seek(1.0, None).expect("seek");
    assert!((source.position() - 1.0).abs() < 0.1);

    source.seek(4.0, None).expect("seek");
    assert!((source.position() - 4.0).abs() < 0.1);
}

#[test]
fn offset_stream_frames_are_distinct() {
    let path = offset_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut session = ExtractionSession::new();
    let options = ExtractOptions::new().with_step(1.0);
    let run = session
        .run_file(path, &options, &mut NoOpSink)
        .expect("run should start");

    assert_eq!(run.state(), RunState::Complete);
    assert!(run.len() >= 5);
    // Targets inside the clip must not collapse onto the final frame.
    let records = run.records();
    assert_ne!(records[1].image(), records[3].image());
}

#[test]
fn extract_fixture_at_one_second_steps() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut gallery = PreviewGallery::new(64);
    let mut session = ExtractionSession::new();
    let options = ExtractOptions::new().with_step(1.0);
    let run = session
        .run_file(path, &options, &mut gallery)
        .expect("run should start");

    assert_eq!(run.state(), RunState::Complete);
    assert_eq!(run.total(), run.planned_count());
    assert_eq!(run.len() as u64 + run.skipped(), run.total());
    assert_eq!(gallery.len(), run.len());

    let metadata = session.metadata().expect("source stays bound").clone();
    for frame in session.records() {
        let image = frame.decode().expect("valid PNG");
        assert_eq!((image.width(), image.height()), (metadata.width, metadata.height));
    }

    let bytes = ArchivePackager::new().package(session.records()).unwrap();
    assert!(!bytes.is_empty());
}

#[test]
fn jpeg_extraction_with_ceiling() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut session = ExtractionSession::new();
    let options = ExtractOptions::new()
        .with_step(0.5)
        .with_max_frames(3)
        .with_encoding(ImageEncoding::jpeg(70))
        .with_seek_timeout(Duration::from_secs(30));
    let run = session
        .run_file(path, &options, &mut NoOpSink)
        .expect("run should start");

    assert_eq!(run.total(), 3);
    assert!(run.records().iter().all(|frame| frame.filename().ends_with(".jpg")));
}
