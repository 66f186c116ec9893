// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the host presents the notification.

use crate::error::ScanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Trying again may well work.
    Transient,
    /// The user must change something (pick another file, move a corner).
    ActionRequired,
    /// Nothing the user does with this input will help.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether retrying the same operation is reasonable.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `ScanError` into a `HumanError`.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        // -- Source errors --
        ScanError::Decode(_) => HumanError {
            message: "We couldn't open this image.".into(),
            suggestion: "The file may be damaged. Try taking the photo again or saving it as a JPEG or PNG.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanError::UnsupportedSource(detail) => HumanError {
            message: "This type of file isn't supported.".into(),
            suggestion: format!("Please choose a JPEG, PNG or WebP image. (File type: {detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::SourceTooLarge { limit, .. } => HumanError {
            message: "This image is too large.".into(),
            suggestion: format!(
                "Please choose an image smaller than {} MB.",
                limit / (1024 * 1024)
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::EmptySource => HumanError {
            message: "The file is empty.".into(),
            suggestion: "Try choosing the image again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Pipeline errors --
        ScanError::InvalidGeometry(_) => HumanError {
            message: "We couldn't straighten the page with those corners.".into(),
            suggestion: "Drag the four corners so they sit on the edges of the document, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::Processing(_) => HumanError {
            message: "There was a problem processing the image.".into(),
            suggestion: "Please try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanError::Export(_) => HumanError {
            message: "We couldn't create the PDF.".into(),
            suggestion: "Please try again. If it keeps failing, try removing a page and exporting again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Session errors --
        ScanError::PageNotFound(_) | ScanError::ItemNotFound(_) => HumanError {
            message: "That page is no longer available.".into(),
            suggestion: "It may have been removed. Add the page again to continue.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "We don't have permission to use that file.".into(),
                suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, your storage may be full.".into(),
                retriable: true,
                severity: Severity::Transient,
            },
        },

        ScanError::Config(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Check that it is valid JSON, or remove it to use the defaults.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
