// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page composition: placement, pointer interaction and export.

pub mod composer;
pub mod export;
pub mod interaction;

pub use composer::Composer;
pub use export::{ExportFormat, export, export_async, flatten};
pub use interaction::{
    ComposerState, Effect, Guides, Handle, Interaction, PointerEvent, Viewport, step,
};
