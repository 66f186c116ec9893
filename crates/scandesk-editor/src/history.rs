// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded linear undo/redo history.

use std::collections::VecDeque;
use std::sync::Arc;

use scandesk_core::config::ScanConfig;
use scandesk_core::{FilterSettings, QuarterTurn};
use scandesk_document::Raster;
use tracing::debug;

/// Past states, the present state, and the redo tail.
///
/// `past` never holds more than `capacity` entries; the oldest is dropped
/// when a push overflows it. Any push clears the redo tail.
#[derive(Debug, Clone)]
pub struct HistoryManager<T> {
    past: VecDeque<T>,
    present: T,
    future: Vec<T>,
    capacity: usize,
}

impl<T: Clone + PartialEq> HistoryManager<T> {
    pub fn new(initial: T, capacity: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(capacity),
            present: initial,
            future: Vec::new(),
            capacity,
        }
    }

    /// A history bounded by `config.history_capacity`.
    pub fn from_config(initial: T, config: &ScanConfig) -> Self {
        Self::new(initial, config.history_capacity)
    }

    /// Record `state` as the new present. Returns `false` (and changes
    /// nothing) when `state` equals the current present.
    pub fn push(&mut self, state: T) -> bool {
        if state == self.present {
            return false;
        }
        let previous = std::mem::replace(&mut self.present, state);
        self.past.push_back(previous);
        self.future.clear();
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
        debug!(past = self.past.len(), "History push");
        true
    }

    /// Step back one state. `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<&T> {
        let previous = self.past.pop_back()?;
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push(current);
        Some(&self.present)
    }

    /// Step forward one state. `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<&T> {
        let next = self.future.pop()?;
        let current = std::mem::replace(&mut self.present, next);
        self.past.push_back(current);
        Some(&self.present)
    }

    pub fn present(&self) -> &T {
        &self.present
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }
}

/// Snapshot of a page being edited.
#[derive(Debug, Clone)]
pub struct EditState {
    pub source: Arc<Raster>,
    pub rotation: QuarterTurn,
    pub filters: FilterSettings,
}

impl EditState {
    pub fn new(source: Arc<Raster>) -> Self {
        Self {
            source,
            rotation: QuarterTurn::R0,
            filters: FilterSettings::default(),
        }
    }
}

/// Two states are equal when they point at the same pixels and agree on
/// rotation and filters. Pixel buffers are never compared.
impl PartialEq for EditState {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
            && self.rotation == other.rotation
            && self.filters == other.filters
    }
}
