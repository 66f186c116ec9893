// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective warp engine: flattens a photographed quadrilateral into an
// upright rectangle by inverse mapping every output pixel into the source and
// sampling bilinearly.

use image::Rgba;
use scandesk_core::config::WarpConfig;
use scandesk_core::error::{Result, ScanError};
use scandesk_core::{Corners, Point};
use tracing::{debug, info, instrument, warn};

use crate::geometry::Homography;
use crate::raster::{Raster, WHITE};

/// Slack allowed when a mapped coordinate lands a hair outside the source.
const EDGE_TOLERANCE: f64 = 1e-6;

/// Outcome of a warp.
#[derive(Debug, Clone)]
pub enum Warped {
    /// The perspective-corrected page.
    Flattened(Raster),
    /// Warping failed part way; the caller keeps the untouched source.
    Unwarped { raster: Raster, reason: String },
}

impl Warped {
    pub fn raster(&self) -> &Raster {
        match self {
            Self::Flattened(raster) | Self::Unwarped { raster, .. } => raster,
        }
    }

    pub fn into_raster(self) -> Raster {
        match self {
            Self::Flattened(raster) | Self::Unwarped { raster, .. } => raster,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Unwarped { .. })
    }
}

/// Inverse-mapping perspective corrector.
#[derive(Debug, Clone)]
pub struct WarpEngine {
    config: WarpConfig,
}

impl Default for WarpEngine {
    fn default() -> Self {
        Self::new(WarpConfig::default())
    }
}

impl WarpEngine {
    pub fn new(config: WarpConfig) -> Self {
        Self { config }
    }

    /// Output dimensions for `corners`.
    ///
    /// Width is the longer of the top and bottom edges, height the longer of
    /// the left and right edges, each rounded. If the long side is under
    /// `min_output_side` both sides are scaled up so the long side equals it.
    pub fn output_size(&self, corners: &Corners) -> Result<(u32, u32)> {
        if !corners.is_finite() {
            return Err(ScanError::InvalidGeometry("corners are not finite".into()));
        }
        let width = corners.top_edge().max(corners.bottom_edge()).round();
        let height = corners.left_edge().max(corners.right_edge()).round();
        if width < 1.0 || height < 1.0 {
            return Err(ScanError::InvalidGeometry(format!(
                "quadrilateral collapses to {width}x{height}"
            )));
        }

        let long = width.max(height);
        let min_side = self.config.min_output_side as f64;
        let (width, height) = if long < min_side {
            let scale = min_side / long;
            if width >= height {
                (min_side, (height * scale).round().max(1.0))
            } else {
                ((width * scale).round().max(1.0), min_side)
            }
        } else {
            (width, height)
        };

        let max_side = self.config.max_output_side as f64;
        if width > max_side || height > max_side {
            return Err(ScanError::Processing(format!(
                "output {width}x{height} exceeds {max_side} px"
            )));
        }
        Ok((width as u32, height as u32))
    }

    /// Flatten the region of `source` bounded by `corners` (absolute source
    /// pixels, TL/TR/BR/BL).
    ///
    /// Degenerate corners are rejected with `InvalidGeometry`. Any other
    /// failure degrades to `Warped::Unwarped` carrying a copy of the source.
    #[instrument(skip(self, source), fields(src_w = source.width(), src_h = source.height()))]
    pub fn warp(&self, source: &Raster, corners: &Corners) -> Result<Warped> {
        match self.try_warp(source, corners) {
            Ok(raster) => Ok(Warped::Flattened(raster)),
            Err(err @ ScanError::InvalidGeometry(_)) => Err(err),
            Err(err) => {
                warn!(%err, "Perspective warp failed; keeping unwarped source");
                Ok(Warped::Unwarped {
                    raster: source.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }

    fn try_warp(&self, source: &Raster, corners: &Corners) -> Result<Raster> {
        let (out_w, out_h) = self.output_size(corners)?;
        info!(out_w, out_h, "Warping to output dimensions");

        let (w, h) = (out_w as f64, out_h as f64);
        let rect = Corners::rectangle(w, h);
        // Output rectangle -> source quadrilateral: the inverse map.
        let inverse = Homography::solve(&rect.to_array(), &corners.to_array())?;

        let sampler = Sampler::new(source)?;
        let mut output = Raster::filled(out_w, out_h, WHITE);
        let mut covered: u64 = 0;

        for (x, y, pixel) in output.as_image_mut().enumerate_pixels_mut() {
            let Some(src) = inverse.apply(x as f64, y as f64) else {
                continue;
            };
            if let Some(rgb) = sampler.bilinear(src) {
                *pixel = Rgba([rgb[0], rgb[1], rgb[2], 255]);
                covered += 1;
            }
        }

        debug!(covered, total = out_w as u64 * out_h as u64, "Warp sampled");
        Ok(output)
    }
}

/// Bilinear reads from a source raster.
struct Sampler<'a> {
    source: &'a Raster,
    max_x: f64,
    max_y: f64,
}

impl<'a> Sampler<'a> {
    fn new(source: &'a Raster) -> Result<Self> {
        let (w, h) = source.dimensions();
        if w == 0 || h == 0 {
            return Err(ScanError::Processing("source raster is empty".into()));
        }
        Ok(Self {
            source,
            max_x: (w - 1) as f64,
            max_y: (h - 1) as f64,
        })
    }

    /// RGB at a fractional coordinate, or `None` outside `[0,w-1] x [0,h-1]`.
    ///
    /// The right/bottom neighbour is clamped to the last column/row so reads
    /// never leave the buffer.
    #[inline]
    fn bilinear(&self, p: Point) -> Option<[u8; 3]> {
        if !(p.x >= -EDGE_TOLERANCE
            && p.y >= -EDGE_TOLERANCE
            && p.x <= self.max_x + EDGE_TOLERANCE
            && p.y <= self.max_y + EDGE_TOLERANCE)
        {
            return None;
        }
        let sx = p.x.clamp(0.0, self.max_x);
        let sy = p.y.clamp(0.0, self.max_y);

        let x1 = sx.floor();
        let y1 = sy.floor();
        let fx = sx - x1;
        let fy = sy - y1;
        let (x1, y1) = (x1 as u32, y1 as u32);
        let x2 = (x1 + 1).min(self.max_x as u32);
        let y2 = (y1 + 1).min(self.max_y as u32);

        let img = self.source.as_image();
        let p11 = img.get_pixel(x1, y1).0;
        let p21 = img.get_pixel(x2, y1).0;
        let p12 = img.get_pixel(x1, y2).0;
        let p22 = img.get_pixel(x2, y2).0;

        let mut out = [0u8; 3];
        for c in 0..3 {
            let top = p11[c] as f64 * (1.0 - fx) + p21[c] as f64 * fx;
            let bottom = p12[c] as f64 * (1.0 - fx) + p22[c] as f64 * fx;
            out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
        }
        Some(out)
    }
}
