//! Internal conversion helpers.
//!
//! Pixel-plane copying and timestamp conversion shared by the FFmpeg source
//! and the sampler.

use ffmpeg_next::Rational;

/// Copy a possibly padded pixel plane into a tightly packed destination.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × bpp).
/// `destination` must hold exactly `row_bytes × rows` bytes.
pub(crate) fn copy_plane(source: &[u8], stride: usize, destination: &mut [u8], row_bytes: usize) {
    if row_bytes == 0 {
        return;
    }
    if stride == row_bytes {
        let length = destination.len().min(source.len());
        destination[..length].copy_from_slice(&source[..length]);
        return;
    }

    for (row, chunk) in destination.chunks_exact_mut(row_bytes).enumerate() {
        let row_start = row * stride;
        let Some(line) = source.get(row_start..row_start + row_bytes) else {
            break;
        };
        chunk.copy_from_slice(line);
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// FFmpeg's `AV_NOPTS_VALUE`: the timestamp is unknown.
const NO_TIMESTAMP: i64 = i64::MIN;

/// Stream start time in seconds. An unknown start counts as 0.
pub(crate) fn stream_start_seconds(start_time: i64, time_base: Rational) -> f64 {
    if start_time == NO_TIMESTAMP || time_base.denominator() == 0 {
        return 0.0;
    }
    pts_to_seconds(start_time, time_base)
}

/// Presentation time of a frame relative to the stream start, or `None`
/// when the frame carries no timestamp.
pub(crate) fn relative_frame_seconds(
    pts: Option<i64>,
    time_base: Rational,
    start_offset: f64,
) -> Option<f64> {
    match pts {
        Some(pts) if pts != NO_TIMESTAMP => Some(pts_to_seconds(pts, time_base) - start_offset),
        _ => None,
    }
}

/// Convert a clip-relative time to a container seek timestamp in
/// AV_TIME_BASE (microseconds), the absolute unit `input_context.seek()`
/// expects.
pub(crate) fn seconds_to_seek_timestamp(seconds: f64, start_offset: f64) -> i64 {
    ((seconds.max(0.0) + start_offset) * 1_000_000.0) as i64
}
