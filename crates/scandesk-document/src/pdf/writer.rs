// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: wrap a flattened page raster into a single-page PDF using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use scandesk_core::OutputPage;
use scandesk_core::error::{Result, ScanError};
use tracing::{debug, info, instrument, warn};

use crate::raster::Raster;

const POINTS_PER_INCH: f32 = 72.0;

/// Title written to the PDF /Info dictionary.
const DOCUMENT_TITLE: &str = "Scandesk Scan";

/// Produces one-page PDFs sized to an `OutputPage`.
pub struct PdfWriter {
    page: OutputPage,
}

impl PdfWriter {
    pub fn new(page: OutputPage) -> Self {
        Self { page }
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.page.paper.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Embed `raster` as the only page, full bleed.
    ///
    /// Pixels go in as raw RGB, so nothing is recompressed lossily. Alpha is
    /// dropped; composed pages are opaque.
    #[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
    pub fn create_from_raster(&self, raster: &Raster) -> Result<Vec<u8>> {
        let (img_w, img_h) = raster.dimensions();
        if img_w == 0 || img_h == 0 {
            return Err(ScanError::Export("cannot place an empty raster".into()));
        }
        let (page_w, page_h) = self.page_dimensions();
        info!(paper = ?self.page.paper, dpi = self.page.dpi, "Creating page PDF");

        let rgb = image::DynamicImage::ImageRgba8(raster.as_image().clone()).into_rgb8();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: img_w as usize,
            height: img_h as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(DOCUMENT_TITLE);
        let xobject_id = doc.add_image(&raw);

        // At the page DPI an exactly sized raster has a scale of 1; anything
        // else is stretched to the page edges.
        let dpi = self.page.dpi as f32;
        let native_w_pt = img_w as f32 / dpi * POINTS_PER_INCH;
        let native_h_pt = img_h as f32 / dpi * POINTS_PER_INCH;
        let scale_x = page_w.into_pt().0 / native_w_pt;
        let scale_y = page_h.into_pt().0 / native_h_pt;

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                dpi: Some(dpi),
                rotate: None,
            },
        }];

        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);
        debug!(scale_x, scale_y, "Raster placed on page");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "PDF serialiser reported warnings");
        }
        if output.is_empty() {
            return Err(ScanError::Export("PDF serialiser produced no output".into()));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::WHITE;
    use lopdf::Object;

    fn number(obj: &Object) -> f64 {
        match obj {
            Object::Integer(i) => *i as f64,
            Object::Real(r) => *r as f64,
            other => panic!("not a number: {other:?}"),
        }
    }

    #[test]
    fn a4_page_is_single_full_size_page() {
        // MediaBox follows the paper, not the raster size.
        let raster = Raster::filled(310, 438, WHITE);
        let bytes = PdfWriter::new(OutputPage::a4()).create_from_raster(&raster).unwrap();

        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let page_id = *pages.values().next().unwrap();
        let dict = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let media_box = dict.get(b"MediaBox").unwrap().as_array().unwrap();
        let width_pt = number(&media_box[2]) - number(&media_box[0]);
        let height_pt = number(&media_box[3]) - number(&media_box[1]);
        assert!((width_pt - 595.3).abs() < 1.0, "width {width_pt}");
        assert!((height_pt - 841.9).abs() < 1.0, "height {height_pt}");
    }

    #[test]
    fn empty_raster_is_export_error() {
        let raster = Raster::filled(0, 0, WHITE);
        let err = PdfWriter::new(OutputPage::a4()).create_from_raster(&raster).unwrap_err();
        assert!(matches!(err, ScanError::Export(_)));
    }
}
