// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scandesk-document: Pixel-level document processing for Scandesk.
//
// Provides the raster type and codec, the four-point homography solver, the
// perspective warp engine, corner estimation, scan filters, and single-page
// PDF output.

pub mod geometry;
pub mod image;
pub mod page;
pub mod pdf;
pub mod raster;
pub mod scan;

// Re-export the primary types so callers can use `scandesk_document::WarpEngine` etc.
pub use geometry::Homography;
pub use crate::image::processor::ImageProcessor;
pub use page::ProcessedPage;
pub use pdf::writer::PdfWriter;
pub use raster::{Codec, PngCodec, Raster};
pub use scan::{
    ConfirmedScan, CornerEstimator, CropMode, Estimate, EstimateKind, ScanJob, ScanOutcome, ScanPipeline,
    ScanWorker, WarpEngine, Warped,
};
