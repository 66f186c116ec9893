// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan worker: moves pixel work off the async runtime onto tokio's blocking
// pool. Each job runs its stages back to back inside a single blocking task,
// so estimate, warp and bake can never interleave or reorder.

use std::sync::Arc;

use scandesk_core::error::{Result, ScanError};
use scandesk_core::{Corners, FilterSettings, QuarterTurn};
use tracing::{debug, instrument};

use crate::raster::Raster;
use crate::scan::estimate::Estimate;
use crate::scan::pipeline::{ConfirmedScan, CropMode, ScanPipeline};

/// One image's trip through the pipeline.
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub source: Arc<Raster>,
    /// Corners chosen by the user. When absent the estimator proposes them.
    pub corners: Option<Corners>,
    pub mode: CropMode,
    pub rotation: QuarterTurn,
    pub filters: FilterSettings,
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Present when the corners came from the estimator.
    pub estimate: Option<Estimate>,
    pub confirmed: ConfirmedScan,
}

/// Async front for a shared `ScanPipeline`.
#[derive(Clone)]
pub struct ScanWorker {
    pipeline: Arc<ScanPipeline>,
}

impl ScanWorker {
    pub fn new(pipeline: Arc<ScanPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Arc<ScanPipeline> {
        &self.pipeline
    }

    /// Estimate corners for `source` on the blocking pool.
    #[instrument(skip_all)]
    pub async fn detect(&self, source: Arc<Raster>) -> Result<Estimate> {
        let pipeline = Arc::clone(&self.pipeline);
        tokio::task::spawn_blocking(move || pipeline.estimate(&source))
            .await
            .map_err(|err| ScanError::Processing(format!("estimator task failed: {err}")))
    }

    /// Run estimate (if needed), warp and bake for one image.
    #[instrument(skip_all, fields(has_corners = job.corners.is_some()))]
    pub async fn scan(&self, job: ScanJob) -> Result<ScanOutcome> {
        let pipeline = Arc::clone(&self.pipeline);
        tokio::task::spawn_blocking(move || {
            let (corners, estimate) = match job.corners {
                Some(corners) => (corners, None),
                None => {
                    let estimate = pipeline.estimate(&job.source);
                    (estimate.corners, Some(estimate))
                }
            };
            debug!(?corners, mode = ?job.mode, "Scan corners fixed");
            let confirmed = match job.mode {
                CropMode::Perspective => {
                    pipeline.confirm(&job.source, Some(&corners), job.rotation, &job.filters)?
                }
                CropMode::Polygon => {
                    pipeline.confirm_polygon(&job.source, &corners, job.rotation, &job.filters)?
                }
            };
            Ok(ScanOutcome {
                estimate,
                confirmed,
            })
        })
        .await
        .map_err(|err| ScanError::Processing(format!("scan task failed: {err}")))?
    }

    /// Bake the whole frame (no crop) on the blocking pool.
    #[instrument(skip_all, fields(degrees = rotation.degrees()))]
    pub async fn keep_frame(
        &self,
        source: Arc<Raster>,
        rotation: QuarterTurn,
        filters: FilterSettings,
    ) -> Result<ConfirmedScan> {
        let pipeline = Arc::clone(&self.pipeline);
        tokio::task::spawn_blocking(move || pipeline.confirm(&source, None, rotation, &filters))
            .await
            .map_err(|err| ScanError::Processing(format!("bake task failed: {err}")))?
    }

    /// Run an export closure on the blocking pool. Settles exactly once with
    /// either the encoded bytes or an `Export` error.
    #[instrument(skip_all)]
    pub async fn export<F>(&self, render: F) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Result<Vec<u8>> + Send + 'static,
    {
        tokio::task::spawn_blocking(render)
            .await
            .map_err(|err| ScanError::Export(format!("export task failed: {err}")))?
    }
}
