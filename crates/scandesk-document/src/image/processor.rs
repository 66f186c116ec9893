// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: bounded resize and quarter-turn rotation on in-memory
// rasters using the `image` crate.

use image::imageops::{self, FilterType};
use scandesk_core::QuarterTurn;
use tracing::{debug, info, instrument};

use crate::raster::Raster;

/// Size of `width` x `height` once its long side is capped at `max_side`.
///
/// The long side becomes exactly `max_side` and the short side is rounded.
/// Images already within the limit are returned unchanged; this never
/// upscales.
pub fn calculate_size(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let scale_other = |other: u32, long: u32| -> u32 {
        ((other as f64 * max_side as f64) / long as f64).round().max(1.0) as u32
    };
    if width > height {
        if width > max_side {
            return (max_side, scale_other(height, width));
        }
    } else if height > max_side {
        return (scale_other(width, height), max_side);
    }
    (width, height)
}

/// Raster transformations chained by value.
///
/// Each method consumes `self` and returns a new `ImageProcessor`, so steps
/// compose left to right:
///
/// ```ignore
/// let raster = ImageProcessor::new(raster)
///     .fit_within(4096)
///     .rotate_quarter(QuarterTurn::R90)
///     .into_raster();
/// ```
pub struct ImageProcessor {
    raster: Raster,
}

impl ImageProcessor {
    pub fn new(raster: Raster) -> Self {
        Self { raster }
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn into_raster(self) -> Raster {
        self.raster
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Downscale so the long side is at most `max_side`. A no-op (same
    /// buffer, untouched) when the raster already fits.
    #[instrument(skip(self), fields(max_side))]
    pub fn fit_within(self, max_side: u32) -> Self {
        let (w, h) = self.raster.dimensions();
        let (new_w, new_h) = calculate_size(w, h, max_side);
        if (new_w, new_h) == (w, h) {
            return self;
        }
        info!(from_w = w, from_h = h, new_w, new_h, "Downscaling raster");
        self.resize_exact(new_w, new_h)
    }

    /// Resize to exactly `width` x `height`, ignoring aspect ratio.
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        let resized = imageops::resize(self.raster.as_image(), width, height, FilterType::Lanczos3);
        debug!(width, height, "Resize complete");
        Self {
            raster: Raster::new(resized),
        }
    }

    /// Rotate clockwise by a quarter turn about the center. 90 and 270 swap
    /// width and height.
    #[instrument(skip(self), fields(degrees = turn.degrees()))]
    pub fn rotate_quarter(self, turn: QuarterTurn) -> Self {
        let image = self.raster.as_image();
        let rotated = match turn {
            QuarterTurn::R0 => return self,
            QuarterTurn::R90 => imageops::rotate90(image),
            QuarterTurn::R180 => imageops::rotate180(image),
            QuarterTurn::R270 => imageops::rotate270(image),
        };
        Self {
            raster: Raster::new(rotated),
        }
    }
}
