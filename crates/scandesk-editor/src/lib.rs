// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scandesk editor: crop editing, undo history, page composition and export.

pub mod compose;
pub mod crop;
pub mod history;
pub mod session;

pub use compose::{Composer, ExportFormat};
pub use crop::{CropEditor, ImageBox};
pub use history::{EditState, HistoryManager};
pub use session::Session;
