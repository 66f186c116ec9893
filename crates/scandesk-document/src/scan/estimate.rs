// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner estimator: proposes a starting quadrilateral by comparing pixels
// against the colour of the top-left corner. A heuristic, not edge detection:
// the user is expected to refine the result.

use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};
use scandesk_core::config::EstimatorConfig;
use scandesk_core::{Corners, Point};
use tracing::{debug, info, instrument, warn};

use crate::raster::{Codec, Raster};

/// How an estimate was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimateKind {
    /// Content was found and boxed.
    Detected,
    /// Nothing stood out from the background; this is the default inset box.
    Fallback,
}

/// Proposed corners in absolute source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub corners: Corners,
    pub kind: EstimateKind,
}

/// Background-vs-content bounding box detector.
#[derive(Debug, Clone)]
pub struct CornerEstimator {
    config: EstimatorConfig,
}

impl Default for CornerEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

impl CornerEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Decode `bytes` and estimate. `None` means the source could not be
    /// processed at all, which is distinct from a fallback estimate.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn estimate_bytes(&self, codec: &dyn Codec, bytes: &[u8]) -> Option<Estimate> {
        match codec.decode(bytes) {
            Ok(raster) => Some(self.estimate(&raster)),
            Err(err) => {
                warn!(%err, "Corner estimation skipped");
                None
            }
        }
    }

    /// Estimate the document boundary in `source`.
    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn estimate(&self, source: &Raster) -> Estimate {
        let (src_w, src_h) = source.dimensions();
        let fallback = || Estimate {
            corners: Corners::inset(src_w as f64, src_h as f64, self.config.fallback_inset),
            kind: EstimateKind::Fallback,
        };
        if src_w == 0 || src_h == 0 {
            return fallback();
        }

        let max_dim = self.config.max_dimension.max(1);
        let (w, h) = if src_w > max_dim || src_h > max_dim {
            let ratio = (max_dim as f64 / src_w as f64).min(max_dim as f64 / src_h as f64);
            (
                ((src_w as f64 * ratio).round() as u32).max(1),
                ((src_h as f64 * ratio).round() as u32).max(1),
            )
        } else {
            (src_w, src_h)
        };
        let small = if (w, h) == (src_w, src_h) {
            None
        } else {
            Some(imageops::resize(source.as_image(), w, h, FilterType::Triangle))
        };
        let working = small.as_ref().unwrap_or(source.as_image());

        let bg = working.get_pixel(0, 0).0;
        let stride = self.config.stride.max(1) as usize;
        let threshold_sq = self.config.threshold * self.config.threshold;

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (w, h, 0u32, 0u32);
        let mut hits: u64 = 0;
        for y in (0..h).step_by(stride) {
            for x in (0..w).step_by(stride) {
                let px = working.get_pixel(x, y).0;
                let dist_sq: f64 = (0..3)
                    .map(|c| {
                        let d = px[c] as f64 - bg[c] as f64;
                        d * d
                    })
                    .sum();
                if dist_sq > threshold_sq {
                    min_x = min_x.min(x);
                    max_x = max_x.max(x);
                    min_y = min_y.min(y);
                    max_y = max_y.max(y);
                    hits += 1;
                }
            }
        }
        debug!(hits, w, h, "Content samples");

        if min_x >= max_x || min_y >= max_y {
            warn!("No content boundary found; using inset fallback");
            return fallback();
        }

        let pad = self.config.padding;
        let left = (min_x as f64 - pad).max(0.0);
        let top = (min_y as f64 - pad).max(0.0);
        let right = (max_x as f64 + pad).min(w as f64);
        let bottom = (max_y as f64 + pad).min(h as f64);

        let sx = src_w as f64 / w as f64;
        let sy = src_h as f64 / h as f64;
        let corners = Corners::new(
            Point::new(left, top),
            Point::new(right, top),
            Point::new(right, bottom),
            Point::new(left, bottom),
        )
        .scaled(sx, sy);

        info!(?corners, "Content boundary detected");
        Estimate {
            corners,
            kind: EstimateKind::Detected,
        }
    }
}
