// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polygonal crop: cut out the quadrilateral without correcting perspective.

use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as PixelPoint;
use scandesk_core::Corners;
use scandesk_core::error::{Result, ScanError};
use tracing::{debug, instrument};

use crate::raster::Raster;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Crop `source` to the bounding box of `corners`. Pixels outside the
/// quadrilateral, or outside the source, come out fully transparent.
#[instrument(skip(source), fields(width = source.width(), height = source.height()))]
pub fn polygon_crop(source: &Raster, corners: &Corners) -> Result<Raster> {
    if !corners.is_finite() {
        return Err(ScanError::InvalidGeometry("corners are not finite".into()));
    }
    let (min_x, min_y, max_x, max_y) = corners.bounds();
    let left = min_x.floor();
    let top = min_y.floor();
    let width = (max_x - left).ceil();
    let height = (max_y - top).ceil();
    if width < 1.0 || height < 1.0 {
        return Err(ScanError::InvalidGeometry(format!(
            "crop region is {width}x{height}"
        )));
    }

    let polygon: Vec<PixelPoint<i32>> = corners
        .to_array()
        .iter()
        .map(|p| PixelPoint::new((p.x - left).round() as i32, (p.y - top).round() as i32))
        .collect();
    if polygon.first() == polygon.last() {
        return Err(ScanError::InvalidGeometry(
            "crop polygon is not closed by distinct corners".into(),
        ));
    }

    let (w, h) = (width as u32, height as u32);
    let mut mask = GrayImage::new(w, h);
    draw_polygon_mut(&mut mask, &polygon, Luma([255u8]));

    let (src_w, src_h) = source.dimensions();
    let (ox, oy) = (left as i64, top as i64);
    let src = source.as_image();
    let out = RgbaImage::from_fn(w, h, |x, y| {
        if mask.get_pixel(x, y).0[0] == 0 {
            return TRANSPARENT;
        }
        let (sx, sy) = (ox + x as i64, oy + y as i64);
        if sx < 0 || sy < 0 || sx >= src_w as i64 || sy >= src_h as i64 {
            return TRANSPARENT;
        }
        *src.get_pixel(sx as u32, sy as u32)
    });

    debug!(w, h, "Polygon crop complete");
    Ok(Raster::new(out))
}
