// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export: flatten a composition into one output-page raster and encode it.
//
// Each item is painted with the same transform stack the view uses:
// translate to the item center, rotate, then scale the source to the stored
// box about its own center.

use std::borrow::Cow;
use std::sync::Arc;

use image::Rgba;
use image::imageops;
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use scandesk_core::error::{Result, ScanError};
use scandesk_core::{OutputPage, PlacedItem, QuarterTurn};
use scandesk_document::raster::WHITE;
use scandesk_document::scan::filters::apply_filters;
use scandesk_document::{Codec, ImageProcessor, PdfWriter, ProcessedPage, Raster, ScanWorker};
use tracing::{debug, info, instrument, warn};

use crate::compose::composer::Composer;
use crate::session::Session;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Container for the flattened page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Pdf,
}

/// Paint every item of `composer` onto a white page, lowest z-index first.
#[instrument(skip_all, fields(items = composer.items().len()))]
pub fn flatten(composer: &Composer, session: &Session) -> Result<Raster> {
    let page = composer.page();
    let mut canvas = Raster::filled(page.width_px, page.height_px, WHITE);

    for item in composer.export_order() {
        let source = session.get(item.page)?;
        let pixels = baked_pixels(source);
        paint_item(&mut canvas, &pixels, item)?;
    }

    info!(width = page.width_px, height = page.height_px, "Flattened composition");
    Ok(canvas)
}

/// Pixels with any pending rotation and filters applied.
fn baked_pixels(page: &ProcessedPage) -> Cow<'_, Raster> {
    if page.rotation == QuarterTurn::R0 && page.filters.is_identity() {
        return Cow::Borrowed(page.pixels.as_ref());
    }
    let mut raster = ImageProcessor::new(page.pixels.as_ref().clone())
        .rotate_quarter(page.rotation)
        .into_raster();
    apply_filters(&mut raster, &page.filters);
    Cow::Owned(raster)
}

/// Draw `source` into `canvas` at `item`'s box and rotation.
fn paint_item(canvas: &mut Raster, source: &Raster, item: &PlacedItem) -> Result<()> {
    let (iw, ih) = source.dimensions();
    if iw == 0 || ih == 0 {
        warn!(item = %item.id, "Skipping empty page");
        return Ok(());
    }
    if !(item.width > 0.0 && item.height > 0.0) || !item.rotation.is_finite() {
        return Err(ScanError::Export(format!("item {} has an invalid box", item.id)));
    }

    let (bx, by, bw, bh) = match footprint(item, canvas.width(), canvas.height()) {
        Some(rect) => rect,
        None => {
            debug!(item = %item.id, "Item lies entirely off the page");
            return Ok(());
        }
    };

    let center = item.center();
    let to_page = Projection::translate(center.x as f32, center.y as f32)
        * Projection::rotate(item.rotation.to_radians() as f32)
        * Projection::scale(
            (item.width / iw as f64) as f32,
            (item.height / ih as f64) as f32,
        )
        * Projection::translate(-(iw as f32) / 2.0, -(ih as f32) / 2.0);
    let to_layer = Projection::translate(-(bx as f32), -(by as f32)) * to_page;

    let mut layer = image::RgbaImage::from_pixel(bw, bh, TRANSPARENT);
    warp_into(
        source.as_image(),
        &to_layer,
        Interpolation::Bilinear,
        TRANSPARENT,
        &mut layer,
    );
    imageops::overlay(canvas.as_image_mut(), &layer, bx as i64, by as i64);
    debug!(item = %item.id, bx, by, bw, bh, "Painted item");
    Ok(())
}

/// Integer bounding box of the rotated item clipped to the canvas.
fn footprint(item: &PlacedItem, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let (sin, cos) = item.rotation.to_radians().sin_cos();
    let half_w = (item.width * cos.abs() + item.height * sin.abs()) / 2.0;
    let half_h = (item.width * sin.abs() + item.height * cos.abs()) / 2.0;
    let c = item.center();

    // Trig noise on quarter turns must not widen the box by a pixel.
    const SLACK: f64 = 1e-9;
    let left = (c.x - half_w + SLACK).floor().max(0.0);
    let top = (c.y - half_h + SLACK).floor().max(0.0);
    let right = (c.x + half_w - SLACK).ceil().min(width as f64);
    let bottom = (c.y + half_h - SLACK).ceil().min(height as f64);
    if right <= left || bottom <= top {
        return None;
    }
    Some((
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

/// Flatten and encode in one go.
pub fn export(
    composer: &Composer,
    session: &Session,
    format: ExportFormat,
    codec: &dyn Codec,
) -> Result<Vec<u8>> {
    let raster = flatten(composer, session)?;
    encode(&raster, composer.page(), format, codec)
}

fn encode(raster: &Raster, page: &OutputPage, format: ExportFormat, codec: &dyn Codec) -> Result<Vec<u8>> {
    let bytes = match format {
        ExportFormat::Png => codec.encode(raster)?,
        ExportFormat::Pdf => PdfWriter::new(*page).create_from_raster(raster)?,
    };
    info!(?format, bytes = bytes.len(), "Encoded export");
    Ok(bytes)
}

/// Export on the worker's blocking pool.
///
/// The composition and pages are snapshotted first, so the caller may keep
/// editing while the export runs; the result reflects the state at the call.
pub async fn export_async(
    worker: &ScanWorker,
    composer: &Composer,
    session: &Session,
    format: ExportFormat,
) -> Result<Vec<u8>> {
    let composer = composer.clone();
    let session = session.clone();
    let pipeline = Arc::clone(worker.pipeline());
    worker
        .export(move || export(&composer, &session, format, pipeline.codec()))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use scandesk_core::config::ComposerConfig;
    use scandesk_core::{ItemId, PageId, FilterPreset};

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> Arc<Raster> {
        Arc::new(Raster::filled(w, h, Rgba([rgb[0], rgb[1], rgb[2], 255])))
    }

    fn item_at(page: PageId, x: f64, y: f64, w: f64, h: f64, rotation: f64) -> PlacedItem {
        PlacedItem {
            id: ItemId::new(),
            page,
            x,
            y,
            width: w,
            height: h,
            rotation,
            z_index: 1,
        }
    }

    #[test]
    fn footprint_of_quarter_turn_swaps_extent() {
        let page = PageId::new();
        let item = item_at(page, 100.0, 100.0, 200.0, 100.0, 90.0);
        assert_eq!(footprint(&item, 1000, 1000), Some((150, 50, 100, 200)));
    }

    #[test]
    fn footprint_off_page_is_none() {
        let item = item_at(PageId::new(), -500.0, -500.0, 100.0, 100.0, 0.0);
        assert!(footprint(&item, 100, 100).is_none());
    }

    #[test]
    fn unrotated_item_scales_into_its_box() {
        let mut canvas = Raster::filled(100, 100, WHITE);
        let source = Raster::filled(10, 10, Rgba([200, 0, 0, 255]));
        let item = item_at(PageId::new(), 20.0, 30.0, 40.0, 20.0, 0.0);
        paint_item(&mut canvas, &source, &item).unwrap();

        let px = |x, y| canvas.as_image().get_pixel(x, y).0;
        assert_eq!(px(40, 40), [200, 0, 0, 255]);
        assert_eq!(px(25, 35), [200, 0, 0, 255]);
        assert_eq!(px(10, 40), [255, 255, 255, 255]);
        assert_eq!(px(40, 60), [255, 255, 255, 255]);
    }

    #[test]
    fn rotated_item_covers_rotated_footprint() {
        let mut canvas = Raster::filled(200, 200, WHITE);
        let source = Raster::filled(20, 10, Rgba([0, 0, 200, 255]));
        // 120 x 40 box centered at (100, 100), turned upright.
        let item = item_at(PageId::new(), 40.0, 80.0, 120.0, 40.0, 90.0);
        paint_item(&mut canvas, &source, &item).unwrap();

        let px = |x, y| canvas.as_image().get_pixel(x, y).0;
        assert_eq!(px(100, 50), [0, 0, 200, 255]);
        assert_eq!(px(100, 150), [0, 0, 200, 255]);
        assert_eq!(px(50, 100), [255, 255, 255, 255]);
    }

    #[test]
    fn pending_rotation_and_filters_are_baked() {
        let mut page = ProcessedPage::new(solid(4, 2, [120, 120, 120]));
        page.rotation = QuarterTurn::R90;
        page.filters = FilterPreset::BlackWhite.settings();
        let baked = baked_pixels(&page);
        assert_eq!(baked.dimensions(), (2, 4));
        let value = baked.as_image().get_pixel(0, 0).0[0];
        assert!(value == 0 || value == 255);

        let plain = ProcessedPage::new(solid(4, 2, [1, 2, 3]));
        assert!(matches!(baked_pixels(&plain), Cow::Borrowed(_)));
    }

    #[test]
    fn empty_composition_is_white_page() {
        let composer = Composer::new(OutputPage::a4(), ComposerConfig::default());
        let raster = flatten(&composer, &Session::new()).unwrap();
        assert_eq!(raster.dimensions(), (2480, 3508));
        assert!(raster.as_bytes().iter().all(|&b| b == 255));
    }
}
