//! The reusable decode surface.
//!
//! A [`DecodeSurface`] is a packed RGB24 pixel buffer allocated once per run
//! at the video's dimensions (or the fallback size). Each sampled frame is
//! rasterized onto it and then encoded into a still-image payload.

use image::{
    ExtendedColorType, ImageEncoder,
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
};

use crate::{configuration::ImageEncoding, error::VideoBreakerError};

/// Bytes per pixel of the surface layout (RGB24).
pub const BYTES_PER_PIXEL: usize = 3;

/// A fixed-size RGB24 pixel buffer reused for every frame of a run.
#[derive(Debug, Clone)]
pub struct DecodeSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DecodeSurface {
    /// Allocate a black surface of `width` × `height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        let length = width as usize * height as usize * BYTES_PER_PIXEL;
        Self {
            width,
            height,
            pixels: vec![0; length],
        }
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes in one packed row.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// The packed RGB24 pixels.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable access to the packed RGB24 pixels, for sources to rasterize into.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Reset every pixel to black.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Encode the current pixel content.
    ///
    /// Returns an empty vector for a zero-sized surface; callers treat an
    /// empty payload as "no frame".
    ///
    /// # Errors
    ///
    /// Returns [`VideoBreakerError::ImageError`] if the encoder fails.
    pub fn encode(&self, encoding: ImageEncoding) -> Result<Vec<u8>, VideoBreakerError> {
        if self.width == 0 || self.height == 0 {
            return Ok(Vec::new());
        }

        let mut payload = Vec::new();
        match encoding {
            ImageEncoding::Png => {
                PngEncoder::new(&mut payload).write_image(
                    &self.pixels,
                    self.width,
                    self.height,
                    ExtendedColorType::Rgb8,
                )?;
            }
            ImageEncoding::Jpeg { quality } => {
                JpegEncoder::new_with_quality(&mut payload, quality).write_image(
                    &self.pixels,
                    self.width,
                    self.height,
                    ExtendedColorType::Rgb8,
                )?;
            }
        }
        Ok(payload)
    }
}
