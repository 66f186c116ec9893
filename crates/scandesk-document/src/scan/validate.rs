// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Source validation, run on the raw bytes before any decoding.

use image::ImageFormat;
use scandesk_core::error::{Result, ScanError};
use tracing::{debug, instrument};

/// Check that `bytes` is a non-empty JPEG, PNG or WebP no larger than
/// `max_bytes`, returning the sniffed format.
#[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
pub fn validate_source(bytes: &[u8], max_bytes: u64) -> Result<ImageFormat> {
    if bytes.is_empty() {
        return Err(ScanError::EmptySource);
    }
    let size = bytes.len() as u64;
    if size > max_bytes {
        return Err(ScanError::SourceTooLarge {
            size,
            limit: max_bytes,
        });
    }

    let format = image::guess_format(bytes)
        .map_err(|_| ScanError::UnsupportedSource("unrecognised data".into()))?;
    match format {
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP => {
            debug!(?format, "Source accepted");
            Ok(format)
        }
        other => Err(ScanError::UnsupportedSource(other.to_mime_type().to_string())),
    }
}
