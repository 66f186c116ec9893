// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The result of one scan/edit cycle.

use std::sync::Arc;

use scandesk_core::{FilterSettings, PageId, QuarterTurn};

use crate::raster::Raster;

/// A flattened page ready for composition.
///
/// Pixels are shared: duplicating a page or snapshotting it for undo clones
/// the `Arc`, never the buffer.
#[derive(Debug, Clone)]
pub struct ProcessedPage {
    pub id: PageId,
    pub pixels: Arc<Raster>,
    pub rotation: QuarterTurn,
    pub filters: FilterSettings,
}

impl ProcessedPage {
    /// A page with no pending rotation or filters.
    pub fn new(pixels: Arc<Raster>) -> Self {
        Self {
            id: PageId::new(),
            pixels,
            rotation: QuarterTurn::R0,
            filters: FilterSettings::default(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Width and height once the pending rotation is applied.
    pub fn display_dimensions(&self) -> (u32, u32) {
        if self.rotation.swaps_dimensions() {
            (self.height(), self.width())
        } else {
            (self.width(), self.height())
        }
    }

    /// Same pixels and settings under a fresh id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: PageId::new(),
            ..self.clone()
        }
    }
}
