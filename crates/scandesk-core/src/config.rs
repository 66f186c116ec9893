// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{OutputPage, PaperSize};

/// Tunables for every stage of the scanning pipeline.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub estimator: EstimatorConfig,
    pub warp: WarpConfig,
    pub render: RenderConfig,
    pub composer: ComposerConfig,
    /// Maximum number of undo steps kept.
    pub history_capacity: usize,
    pub page: PageConfig,
    /// Largest accepted source file, in bytes.
    pub max_source_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorConfig::default(),
            warp: WarpConfig::default(),
            render: RenderConfig::default(),
            composer: ComposerConfig::default(),
            history_capacity: 20,
            page: PageConfig::default(),
            max_source_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ScanConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// The output page described by `page`.
    pub fn output_page(&self) -> OutputPage {
        OutputPage::new(self.page.paper, self.page.dpi)
    }
}

/// Background-vs-content bounding box heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Longest side of the working copy.
    pub max_dimension: u32,
    /// Sample every `stride`th pixel in both axes.
    pub stride: u32,
    /// Euclidean RGB distance from the background that counts as content.
    pub threshold: f64,
    /// Padding around the detected box, in working-copy pixels.
    pub padding: f64,
    /// Inset of the fallback box as a fraction of each dimension.
    pub fallback_inset: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_dimension: 800,
            stride: 5,
            threshold: 30.0,
            padding: 10.0,
            fallback_inset: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    /// The long side of a warped page is raised to at least this.
    pub min_output_side: u32,
    /// Larger outputs are treated as a processing fault.
    pub max_output_side: u32,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            min_output_side: 2000,
            max_output_side: 20_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub export_max_side: u32,
    pub preview_max_side: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            export_max_side: 4096,
            preview_max_side: 1600,
        }
    }
}

/// Interaction constants for the page composer. Lengths are page pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub snap_tolerance: f64,
    pub rotate_snap_degrees: f64,
    pub min_item_width: f64,
    /// Width of a newly placed item as a fraction of page width.
    pub default_width_fraction: f64,
    pub stack_start_y: f64,
    pub stack_step_y: f64,
    /// Top used instead of the stacked position when the stack overflows.
    pub overflow_y: f64,
    pub duplicate_offset: f64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: 20.0,
            rotate_snap_degrees: 5.0,
            min_item_width: 50.0,
            default_width_fraction: 0.4,
            stack_start_y: 150.0,
            stack_step_y: 400.0,
            overflow_y: 100.0,
            duplicate_offset: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub paper: PaperSize,
    pub dpi: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            paper: PaperSize::A4,
            dpi: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_describe_a4_pipeline() {
        let config = ScanConfig::default();
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.estimator.stride, 5);
        assert_eq!(config.warp.min_output_side, 2000);
        let page = config.output_page();
        assert_eq!((page.width_px, page.height_px), (2480, 3508));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"estimator": {{"threshold": 45.0}}, "history_capacity": 5}}"#).unwrap();

        let config = ScanConfig::load(file.path()).unwrap();
        assert_eq!(config.estimator.threshold, 45.0);
        assert_eq!(config.estimator.stride, 5, "unset nested keys fall back");
        assert_eq!(config.history_capacity, 5);
        assert_eq!(config.composer, ComposerConfig::default());
    }

    #[test]
    fn malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = ScanConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, crate::ScanError::Config(_)));
    }
}
