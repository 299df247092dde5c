//! ExtractOptions, ImageEncoding and input parsing tests.

use std::time::Duration;

use videobreaker::{
    DEFAULT_MAX_FRAMES, ExtractOptions, ImageEncoding, MIN_STEP_SECONDS, STEP_PRESETS,
    coerce_step, parse_max_frames,
};

// ── ExtractOptions builder ───────────────────────────────────────

#[test]
fn config_defaults() {
    let config = ExtractOptions::new();
    assert_eq!(config.step_seconds(), 1.0);
    assert_eq!(config.max_frames(), 300);
    assert_eq!(config.encoding(), ImageEncoding::Png);
    assert_eq!(config.seek_timeout(), None);
    assert_eq!(config.fallback_dimensions(), (1280, 720));

    let debug = format!("{config:?}");
    assert!(debug.contains("ExtractOptions"));
    assert!(debug.contains("batch_size: 10"));
}

#[test]
fn config_with_batch_size_clamps_zero() {
    let config = ExtractOptions::new().with_batch_size(0);
    assert_eq!(config.batch_size(), 1);
    assert!(format!("{config:?}").contains("batch_size: 1"));
}

#[test]
fn config_step_coercion() {
    assert_eq!(ExtractOptions::new().with_step(2.0).step_seconds(), 2.0);
    assert_eq!(
        ExtractOptions::new().with_step(0.0).step_seconds(),
        MIN_STEP_SECONDS
    );
    assert_eq!(
        ExtractOptions::new().with_step(-1.0).step_seconds(),
        MIN_STEP_SECONDS
    );
    assert_eq!(coerce_step(f64::NAN), MIN_STEP_SECONDS);
}

#[test]
fn step_presets_are_accepted_unchanged() {
    for step in STEP_PRESETS {
        assert_eq!(ExtractOptions::new().with_step(step).step_seconds(), step);
    }
}

#[test]
fn config_seek_timeout() {
    let config = ExtractOptions::new().with_seek_timeout(Duration::from_secs(3));
    assert_eq!(config.seek_timeout(), Some(Duration::from_secs(3)));

    let unbounded = config.with_seek_timeout(Duration::ZERO);
    assert_eq!(unbounded.seek_timeout(), None);
}

#[test]
fn config_fallback_dimensions_never_zero() {
    let config = ExtractOptions::new().with_fallback_dimensions(0, 0);
    assert_eq!(config.fallback_dimensions(), (1, 1));
}

// ── Max frames input ─────────────────────────────────────────────

#[test]
fn max_frames_text_parsing() {
    assert_eq!(parse_max_frames(None), DEFAULT_MAX_FRAMES);
    assert_eq!(parse_max_frames(Some("abc")), DEFAULT_MAX_FRAMES);
    assert_eq!(parse_max_frames(Some("50")), 50);
    assert_eq!(parse_max_frames(Some(" 75 ")), 75);
    assert_eq!(parse_max_frames(Some("0")), 1);
    assert_eq!(parse_max_frames(Some("-12")), 1);
    assert_eq!(parse_max_frames(Some("3.9")), 3);
}

// ── ImageEncoding ────────────────────────────────────────────────

#[test]
fn encoding_metadata() {
    assert_eq!(ImageEncoding::Png.extension(), "png");
    assert_eq!(ImageEncoding::Png.mime_type(), "image/png");
    assert_eq!(ImageEncoding::jpeg(92).extension(), "jpg");
    assert_eq!(ImageEncoding::jpeg(92).mime_type(), "image/jpeg");
    assert_eq!(ImageEncoding::default(), ImageEncoding::Png);
}
