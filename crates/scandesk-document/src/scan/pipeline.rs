// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline: decode, estimate, warp and bake, always in that order.

use std::sync::Arc;

use scandesk_core::config::ScanConfig;
use scandesk_core::error::Result;
use scandesk_core::{Corners, FilterSettings, QuarterTurn};
use tracing::{info, instrument, warn};

use crate::image::ImageProcessor;
use crate::page::ProcessedPage;
use crate::raster::{Codec, PngCodec, Raster};
use crate::scan::crop::polygon_crop;
use crate::scan::estimate::{CornerEstimator, Estimate};
use crate::scan::filters::apply_filters;
use crate::scan::validate::validate_source;
use crate::scan::warp::{WarpEngine, Warped};

/// How confirmed corners are applied to the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropMode {
    /// Warp the quadrilateral onto a flat rectangle.
    #[default]
    Perspective,
    /// Cut the quadrilateral out as drawn. Pixels outside it are transparent.
    Polygon,
}

/// Result of confirming a crop.
#[derive(Debug, Clone)]
pub struct ConfirmedScan {
    /// The baked page: filters applied, rotation already in the pixels.
    pub page: ProcessedPage,
    /// Set when the warp degraded and the page holds the unwarped source.
    pub degraded: Option<String>,
}

/// Sequential scan stages sharing one configuration.
pub struct ScanPipeline {
    config: ScanConfig,
    codec: Box<dyn Codec>,
    estimator: CornerEstimator,
    warp: WarpEngine,
}

impl Default for ScanPipeline {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

impl ScanPipeline {
    pub fn new(config: ScanConfig) -> Self {
        Self::with_codec(config, Box::new(PngCodec))
    }

    pub fn with_codec(config: ScanConfig, codec: Box<dyn Codec>) -> Self {
        Self {
            estimator: CornerEstimator::new(config.estimator.clone()),
            warp: WarpEngine::new(config.warp.clone()),
            config,
            codec,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    pub fn estimator(&self) -> &CornerEstimator {
        &self.estimator
    }

    pub fn warp_engine(&self) -> &WarpEngine {
        &self.warp
    }

    /// Validate and decode an encoded source image.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn load(&self, bytes: &[u8]) -> Result<Raster> {
        let format = validate_source(bytes, self.config.max_source_bytes)?;
        let raster = self.codec.decode(bytes)?;
        info!(?format, width = raster.width(), height = raster.height(), "Source loaded");
        Ok(raster)
    }

    pub fn estimate(&self, source: &Raster) -> Estimate {
        self.estimator.estimate(source)
    }

    pub fn warp(&self, source: &Raster, corners: &Corners) -> Result<Warped> {
        self.warp.warp(source, corners)
    }

    /// Filters at preview resolution, rotation left to the view.
    #[instrument(skip(self, source), fields(width = source.width(), height = source.height()))]
    pub fn render_preview(&self, source: &Raster, filters: &FilterSettings) -> Raster {
        self.bake(source, QuarterTurn::R0, filters, self.config.render.preview_max_side)
    }

    /// Filters and rotation at export resolution.
    #[instrument(skip(self, source), fields(width = source.width(), height = source.height()))]
    pub fn render_export(
        &self,
        source: &Raster,
        rotation: QuarterTurn,
        filters: &FilterSettings,
    ) -> Raster {
        self.bake(source, rotation, filters, self.config.render.export_max_side)
    }

    fn bake(
        &self,
        source: &Raster,
        rotation: QuarterTurn,
        filters: &FilterSettings,
        max_side: u32,
    ) -> Raster {
        let mut raster = ImageProcessor::new(source.clone())
            .fit_within(max_side)
            .into_raster();
        apply_filters(&mut raster, filters);
        ImageProcessor::new(raster).rotate_quarter(rotation).into_raster()
    }

    /// Warp (when corners are given), then bake at export resolution.
    ///
    /// Bad corners fail with `InvalidGeometry`; a warp that fails for any other
    /// reason still yields a page, flagged as degraded.
    #[instrument(skip(self, source, filters), fields(width = source.width(), height = source.height()))]
    pub fn confirm(
        &self,
        source: &Raster,
        corners: Option<&Corners>,
        rotation: QuarterTurn,
        filters: &FilterSettings,
    ) -> Result<ConfirmedScan> {
        let (flat, degraded) = match corners {
            Some(corners) => match self.warp(source, corners)? {
                Warped::Flattened(raster) => (raster, None),
                Warped::Unwarped { raster, reason } => {
                    warn!(%reason, "Confirming with unwarped source");
                    (raster, Some(reason))
                }
            },
            None => (source.clone(), None),
        };

        let baked = self.render_export(&flat, rotation, filters);
        info!(width = baked.width(), height = baked.height(), "Page baked");
        Ok(ConfirmedScan {
            page: ProcessedPage::new(Arc::new(baked)),
            degraded,
        })
    }

    /// Cut `corners` out of `source` without perspective correction, then
    /// bake at export resolution.
    #[instrument(skip(self, source, filters), fields(width = source.width(), height = source.height()))]
    pub fn confirm_polygon(
        &self,
        source: &Raster,
        corners: &Corners,
        rotation: QuarterTurn,
        filters: &FilterSettings,
    ) -> Result<ConfirmedScan> {
        let cut = polygon_crop(source, corners)?;
        let baked = self.render_export(&cut, rotation, filters);
        info!(width = baked.width(), height = baked.height(), "Polygon page baked");
        Ok(ConfirmedScan {
            page: ProcessedPage::new(Arc::new(baked)),
            degraded: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use scandesk_core::{FilterPreset, Point};

    fn photo() -> Raster {
        let mut raster = Raster::filled(300, 200, Rgba([40, 40, 40, 255]));
        for y in 40..160 {
            for x in 60..240 {
                raster.as_image_mut().put_pixel(x, y, Rgba([220, 220, 220, 255]));
            }
        }
        raster
    }

    #[test]
    fn load_rejects_before_decoding() {
        let pipeline = ScanPipeline::default();
        assert!(pipeline.load(&[]).is_err());
        assert!(pipeline.load(b"GIF89a....").is_err());
    }

    #[test]
    fn load_decodes_png() {
        let pipeline = ScanPipeline::default();
        let bytes = PngCodec.encode(&photo()).unwrap();
        assert_eq!(pipeline.load(&bytes).unwrap().dimensions(), (300, 200));
    }

    #[test]
    fn preview_is_capped_and_unrotated() {
        let pipeline = ScanPipeline::default();
        let big = Raster::filled(3200, 1600, Rgba([90, 90, 90, 255]));
        let preview = pipeline.render_preview(&big, &FilterSettings::default());
        assert_eq!(preview.dimensions(), (1600, 800));
    }

    #[test]
    fn export_applies_rotation_after_filters() {
        let pipeline = ScanPipeline::default();
        let out = pipeline.render_export(&photo(), QuarterTurn::R90, &FilterPreset::BlackWhite.settings());
        assert_eq!(out.dimensions(), (200, 300));
        assert!(out.as_bytes().chunks(4).all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn confirm_warps_then_bakes() {
        let pipeline = ScanPipeline::default();
        let source = photo();
        let estimate = pipeline.estimate(&source);
        let confirmed = pipeline
            .confirm(&source, Some(&estimate.corners), QuarterTurn::R0, &FilterSettings::default())
            .unwrap();

        assert!(confirmed.degraded.is_none());
        let (w, h) = confirmed.page.pixels.dimensions();
        assert_eq!(w.max(h), 2000, "small crops are upscaled to the minimum side");
        assert_eq!(confirmed.page.rotation, QuarterTurn::R0);
        assert!(confirmed.page.filters.is_identity());
    }

    #[test]
    fn confirm_without_corners_keeps_geometry() {
        let pipeline = ScanPipeline::default();
        let confirmed = pipeline
            .confirm(&photo(), None, QuarterTurn::R180, &FilterSettings::default())
            .unwrap();
        assert_eq!(confirmed.page.pixels.dimensions(), (300, 200));
    }

    #[test]
    fn confirm_rejects_degenerate_corners() {
        let pipeline = ScanPipeline::default();
        let p = Point::new(10.0, 10.0);
        let corners = Corners::from_array([p, p, Point::new(50.0, 50.0), Point::new(0.0, 50.0)]);
        assert!(pipeline
            .confirm(&photo(), Some(&corners), QuarterTurn::R0, &FilterSettings::default())
            .is_err());
    }

    #[test]
    fn polygon_confirm_keeps_perspective_and_clears_outside() {
        let pipeline = ScanPipeline::default();
        let diamond = Corners::from_array([
            Point::new(150.0, 20.0),
            Point::new(280.0, 100.0),
            Point::new(150.0, 180.0),
            Point::new(20.0, 100.0),
        ]);
        let confirmed = pipeline
            .confirm_polygon(&photo(), &diamond, QuarterTurn::R0, &FilterSettings::default())
            .unwrap();

        let pixels = &confirmed.page.pixels;
        assert!(confirmed.degraded.is_none());
        assert_eq!(pixels.dimensions(), (260, 160), "bounding box, no upscale");
        assert_eq!(pixels.as_image().get_pixel(0, 0).0[3], 0);
        assert_eq!(pixels.as_image().get_pixel(130, 80), &Rgba([220, 220, 220, 255]));
    }

    #[test]
    fn polygon_confirm_rejects_collapsed_corners() {
        let pipeline = ScanPipeline::default();
        let p = Point::new(10.0, 10.0);
        assert!(pipeline
            .confirm_polygon(&photo(), &Corners::from_array([p; 4]), QuarterTurn::R0, &FilterSettings::default())
            .is_err());
    }
}
