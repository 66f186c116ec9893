// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: source validation, corner estimation, perspective warp,
// pixel filters, polygonal crop and the async worker that sequences them.

pub mod crop;
pub mod estimate;
pub mod filters;
pub mod pipeline;
pub mod validate;
pub mod warp;
pub mod worker;

pub use estimate::{CornerEstimator, Estimate, EstimateKind};
pub use pipeline::{ConfirmedScan, CropMode, ScanPipeline};
pub use warp::{WarpEngine, Warped};
pub use worker::{ScanJob, ScanOutcome, ScanWorker};
