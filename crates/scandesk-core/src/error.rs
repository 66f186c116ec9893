// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scandesk.

use thiserror::Error;

use crate::types::{ItemId, PageId};

/// Top-level error type for all Scandesk operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Source errors --
    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("unsupported source format: {0}")]
    UnsupportedSource(String),

    #[error("source is {size} bytes, limit is {limit}")]
    SourceTooLarge { size: u64, limit: u64 },

    #[error("source is empty")]
    EmptySource,

    // -- Pipeline errors --
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("processing fault: {0}")]
    Processing(String),

    #[error("export failed: {0}")]
    Export(String),

    // -- Session errors --
    #[error("page {0} is not in the session")]
    PageNotFound(PageId),

    #[error("item {0} is not on the page")]
    ItemNotFound(ItemId),

    // -- I/O and configuration --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// How far an error travels before somebody handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Reported synchronously to the immediate caller (bad input, bad corners).
    Local,
    /// Swallowed at the pipeline boundary and turned into a degraded result.
    Degradable,
    /// Surfaced to the top-level caller for user notification.
    Fatal,
}

impl ScanError {
    /// Classify this error for propagation decisions.
    pub fn propagation(&self) -> Propagation {
        match self {
            Self::Decode(_)
            | Self::UnsupportedSource(_)
            | Self::SourceTooLarge { .. }
            | Self::EmptySource
            | Self::InvalidGeometry(_)
            | Self::PageNotFound(_)
            | Self::ItemNotFound(_) => Propagation::Local,
            Self::Processing(_) => Propagation::Degradable,
            Self::Export(_) | Self::Io(_) | Self::Config(_) => Propagation::Fatal,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
