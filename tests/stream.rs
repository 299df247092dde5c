//! Async extraction tests (feature `async`).

mod common;

use std::path::PathBuf;

use common::{Script, ScriptedLoader, input_file};
use tokio_stream::StreamExt;
use videobreaker::{
    ExtractOptions, ExtractionEvent, RunState, RunStatus, VideoBreakerError, extraction_stream,
};

#[tokio::test]
async fn stream_delivers_frames_then_finishes() {
    let input = input_file();
    let loader = ScriptedLoader::new(Script::new(3.0));
    let mut stream = extraction_stream(loader, input.path().to_path_buf(), ExtractOptions::new());

    let mut statuses = Vec::new();
    let mut frames = Vec::new();
    let mut finished = None;
    while let Some(event) = stream.next().await {
        match event {
            ExtractionEvent::Status(status) => statuses.push(status),
            ExtractionEvent::Frame(frame) => frames.push(frame),
            ExtractionEvent::Finished(outcome) => finished = Some(outcome),
            _ => {}
        }
    }

    let run = finished.expect("finished event").expect("run started");
    assert_eq!(run.state(), RunState::Complete);
    assert_eq!(frames.len(), 4);
    assert_eq!(frames, run.records());
    assert_eq!(statuses.first(), Some(&RunStatus::Loading));
    assert_eq!(statuses.last(), Some(&RunStatus::Done { extracted: 4 }));
}

#[tokio::test]
async fn finish_returns_the_run() {
    let input = input_file();
    let loader = ScriptedLoader::new(Script::new(5.0).with_blank_frames(&[1]));
    let stream = extraction_stream(loader, input.path().to_path_buf(), ExtractOptions::new());

    let run = stream.finish().await.expect("run started");
    assert_eq!(run.len(), 5);
    assert_eq!(run.skipped(), 1);
}

#[tokio::test]
async fn missing_input_finishes_with_error() {
    let loader = ScriptedLoader::new(Script::new(5.0));
    let stream = extraction_stream(
        loader,
        PathBuf::from("no/such/video.mp4"),
        ExtractOptions::new(),
    );

    let result = stream.finish().await;
    assert!(matches!(result, Err(VideoBreakerError::NoInput)));
}
