// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: wrapping a flattened page into a single-page document.

pub mod writer;

pub use writer::PdfWriter;
