// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster value type and the codec capability that produces and consumes it.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use scandesk_core::error::{Result, ScanError};
use tracing::{debug, instrument};

/// Opaque white, the fill colour for anything not covered by content.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// An owned RGBA8 pixel buffer.
///
/// All pixel stages take and return `Raster`, so nothing in the pipeline
/// depends on how the host decodes or displays images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster(RgbaImage);

impl Raster {
    pub fn new(image: RgbaImage) -> Self {
        Self(image)
    }

    /// A raster of `width` x `height` filled with `pixel`.
    pub fn filled(width: u32, height: u32, pixel: Rgba<u8>) -> Self {
        Self(RgbaImage::from_pixel(width, height, pixel))
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self(image.into_rgba8())
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.0
    }

    pub fn as_image_mut(&mut self) -> &mut RgbaImage {
        &mut self.0
    }

    pub fn into_image(self) -> RgbaImage {
        self.0
    }

    /// Packed RGBA bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_raw()
    }
}

impl From<RgbaImage> for Raster {
    fn from(image: RgbaImage) -> Self {
        Self(image)
    }
}

/// Turns encoded bytes into rasters and back.
pub trait Codec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Raster>;

    /// Encode losslessly.
    fn encode(&self, raster: &Raster) -> Result<Vec<u8>>;
}

/// Decodes anything the `image` crate recognises; encodes PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngCodec;

impl Codec for PngCodec {
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    fn decode(&self, bytes: &[u8]) -> Result<Raster> {
        let image = image::load_from_memory(bytes)
            .map_err(|err| ScanError::Decode(err.to_string()))?;
        debug!(width = image.width(), height = image.height(), "Source decoded");
        Ok(Raster::from_dynamic(image))
    }

    #[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
    fn encode(&self, raster: &Raster) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        raster
            .as_image()
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| ScanError::Export(format!("png encoding failed: {err}")))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_codec_is_lossless() {
        let mut raster = Raster::filled(7, 5, WHITE);
        raster
            .as_image_mut()
            .put_pixel(3, 2, Rgba([12, 34, 56, 255]));

        let bytes = PngCodec.encode(&raster).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
        assert_eq!(PngCodec.decode(&bytes).unwrap(), raster);
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = PngCodec.decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ScanError::Decode(_)));
    }
}
