//! Extracted frame records.

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::DynamicImage;

use crate::{configuration::ImageEncoding, error::VideoBreakerError};

/// Build the archive/download filename for a frame.
///
/// The zero-padded index prefix keeps names unique and sortable within a run;
/// the timestamp is rendered with exactly two decimals.
///
/// ```
/// use videobreaker::frame_filename;
///
/// assert_eq!(frame_filename(3, 1.5, "png"), "frame_00003_1.50s.png");
/// ```
pub fn frame_filename(index: u64, time: f64, extension: &str) -> String {
    format!("frame_{index:05}_{time:.2}s.{extension}")
}

/// Format a timestamp the way previews label it (`"12.50s"`).
pub fn time_label(time: f64) -> String {
    format!("{time:.2}s")
}

/// One sampled frame.
///
/// Records are produced in ascending index order by an
/// [`ExtractionSession`](crate::ExtractionSession) and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFrame {
    index: u64,
    time: f64,
    image: Vec<u8>,
    filename: String,
    encoding: ImageEncoding,
}

impl ExtractedFrame {
    /// Create a record, deriving its filename from `index`, `time` and the
    /// encoding's extension.
    pub fn new(index: u64, time: f64, image: Vec<u8>, encoding: ImageEncoding) -> Self {
        let filename = frame_filename(index, time, encoding.extension());
        Self {
            index,
            time,
            image,
            filename,
            encoding,
        }
    }

    /// Sequence index within the run. Skipped samples leave gaps.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Requested timestamp in seconds (not necessarily the decoded frame's
    /// exact presentation time).
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Encoded image payload.
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Unique filename within the run.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Encoding of [`image`](ExtractedFrame::image).
    pub fn encoding(&self) -> ImageEncoding {
        self.encoding
    }

    /// Timestamp label with two decimals.
    pub fn time_label(&self) -> String {
        time_label(self.time)
    }

    /// Decode the payload back into pixels.
    ///
    /// # Errors
    ///
    /// Returns [`VideoBreakerError::ImageError`] if the payload is corrupt.
    pub fn decode(&self) -> Result<DynamicImage, VideoBreakerError> {
        Ok(image::load_from_memory(&self.image)?)
    }

    /// Write the payload into `directory` under [`filename`](ExtractedFrame::filename).
    ///
    /// Returns the written path.
    ///
    /// # Errors
    ///
    /// Returns [`VideoBreakerError::IoError`] if the file cannot be written.
    pub fn save_to<P: AsRef<Path>>(&self, directory: P) -> Result<PathBuf, VideoBreakerError> {
        let path = directory.as_ref().join(&self.filename);
        fs::write(&path, &self.image)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_pattern() {
        assert_eq!(frame_filename(0, 0.0, "png"), "frame_00000_0.00s.png");
        assert_eq!(frame_filename(12, 6.0, "jpg"), "frame_00012_6.00s.jpg");
        assert_eq!(frame_filename(123_456, 0.5, "png"), "frame_123456_0.50s.png");
    }

    #[test]
    fn record_uses_encoding_extension() {
        let frame = ExtractedFrame::new(7, 3.5, vec![1, 2, 3], ImageEncoding::jpeg(90));
        assert_eq!(frame.filename(), "frame_00007_3.50s.jpg");
        assert_eq!(frame.time_label(), "3.50s");
        assert_eq!(frame.image(), &[1, 2, 3]);
    }

    #[test]
    fn save_writes_payload() {
        let directory = tempfile::tempdir().unwrap();
        let frame = ExtractedFrame::new(1, 0.5, vec![9, 8, 7], ImageEncoding::Png);
        let path = frame.save_to(directory.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "frame_00001_0.50s.png");
        assert_eq!(std::fs::read(path).unwrap(), vec![9, 8, 7]);
    }
}
