//! Frame previews.
//!
//! [`PreviewGallery`] is a [`FrameSink`] that keeps a scaled-down preview of
//! every record as it arrives, labelled with its timestamp. Previews are
//! derived from the records and owned by the gallery; a new run releases
//! them through [`FrameSink::on_reset`] before the records are discarded.
//!
//! # Example
//!
//! ```no_run
//! use videobreaker::{ExtractOptions, ExtractionSession, PreviewGallery, VideoBreakerError};
//!
//! let mut gallery = PreviewGallery::new(320);
//! let mut session = ExtractionSession::new();
//! session.run_file("input.mp4", &ExtractOptions::new(), &mut gallery)?;
//!
//! for preview in gallery.previews() {
//!     println!("{} {}", preview.label(), preview.filename());
//! }
//! gallery.contact_sheet(4).save("contact_sheet.png")?;
//! # Ok::<(), VideoBreakerError>(())
//! ```

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImage, imageops::FilterType};

use crate::{error::VideoBreakerError, frame::ExtractedFrame, session::FrameSink};

/// Longest preview edge used by [`PreviewGallery::default`].
pub const DEFAULT_PREVIEW_DIMENSION: u32 = 320;

/// A displayable preview of one record.
#[derive(Debug, Clone)]
pub struct PreviewHandle {
    index: u64,
    label: String,
    filename: String,
    thumbnail: DynamicImage,
    payload: Vec<u8>,
}

impl PreviewHandle {
    /// Sequence index of the record.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Timestamp label, e.g. `"12.50s"`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Download filename of the record.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The scaled preview image.
    pub fn thumbnail(&self) -> &DynamicImage {
        &self.thumbnail
    }

    /// Write the full-size encoded frame into `directory`.
    ///
    /// # Errors
    ///
    /// Returns [`VideoBreakerError::IoError`] if the file cannot be written.
    pub fn save_to<P: AsRef<Path>>(&self, directory: P) -> Result<PathBuf, VideoBreakerError> {
        let path = directory.as_ref().join(&self.filename);
        std::fs::write(&path, &self.payload)?;
        Ok(path)
    }
}

/// Collects previews for every frame of the current run.
#[derive(Debug, Clone)]
pub struct PreviewGallery {
    max_dimension: u32,
    previews: Vec<PreviewHandle>,
}

impl Default for PreviewGallery {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_DIMENSION)
    }
}

impl PreviewGallery {
    /// A gallery whose previews fit within `max_dimension` on their longest
    /// edge.
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
            previews: Vec::new(),
        }
    }

    /// Previews in arrival order.
    pub fn previews(&self) -> &[PreviewHandle] {
        &self.previews
    }

    /// Number of previews held.
    pub fn len(&self) -> usize {
        self.previews.len()
    }

    /// Whether the gallery holds no previews.
    pub fn is_empty(&self) -> bool {
        self.previews.is_empty()
    }

    /// Preview for sequence index `index`, if that frame was extracted.
    pub fn get(&self, index: u64) -> Option<&PreviewHandle> {
        self.previews.iter().find(|preview| preview.index == index)
    }

    /// Save the full-size frame for sequence index `index` into `directory`.
    ///
    /// Returns `Ok(None)` when no such frame exists.
    ///
    /// # Errors
    ///
    /// Returns [`VideoBreakerError::IoError`] if the file cannot be written.
    pub fn save_frame<P: AsRef<Path>>(
        &self,
        index: u64,
        directory: P,
    ) -> Result<Option<PathBuf>, VideoBreakerError> {
        self.get(index)
            .map(|preview| preview.save_to(directory))
            .transpose()
    }

    /// Composite all previews into one grid image, `columns` per row.
    ///
    /// Each cell is `max_dimension` square; previews are drawn at their own
    /// size in the top-left of their cell. An empty gallery yields a 1×1
    /// black image.
    pub fn contact_sheet(&self, columns: u32) -> DynamicImage {
        let columns = columns.max(1);
        if self.previews.is_empty() {
            return DynamicImage::new_rgb8(1, 1);
        }

        let count = self.previews.len() as u32;
        let rows = count.div_ceil(columns);
        let cell = self.max_dimension;
        let mut sheet = DynamicImage::new_rgb8(cell * columns.min(count), cell * rows);

        for (position, preview) in self.previews.iter().enumerate() {
            let column = position as u32 % columns;
            let row = position as u32 / columns;
            if let Err(error) = sheet.copy_from(&preview.thumbnail, column * cell, row * cell) {
                log::debug!("Preview {} does not fit its cell: {error}", preview.index);
            }
        }
        sheet
    }

    fn build(&self, frame: &ExtractedFrame) -> Result<PreviewHandle, VideoBreakerError> {
        let image = frame.decode()?;
        let (width, height) = fit_dimensions(image.width(), image.height(), self.max_dimension);
        Ok(PreviewHandle {
            index: frame.index(),
            label: frame.time_label(),
            filename: frame.filename().to_string(),
            thumbnail: image.resize_exact(width, height, FilterType::Triangle),
            payload: frame.image().to_vec(),
        })
    }
}

impl FrameSink for PreviewGallery {
    fn on_frame(&mut self, frame: &ExtractedFrame) {
        match self.build(frame) {
            Ok(preview) => self.previews.push(preview),
            Err(error) => log::warn!("No preview for {}: {error}", frame.filename()),
        }
    }

    fn on_reset(&mut self) {
        if !self.previews.is_empty() {
            log::debug!("Releasing {} previews", self.previews.len());
        }
        self.previews.clear();
    }
}

/// Scale `width` × `height` to fit within `max_dimension`, keeping the
/// aspect ratio. Never upscales.
fn fit_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (max_dimension, max_dimension);
    }
    let longest = width.max(height);
    if longest <= max_dimension {
        return (width, height);
    }
    let scale = max_dimension as f64 / longest as f64;
    let new_width = ((width as f64) * scale).round() as u32;
    let new_height = ((height as f64) * scale).round() as u32;
    (new_width.max(1), new_height.max(1))
}
