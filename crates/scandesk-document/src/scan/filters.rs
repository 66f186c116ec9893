// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pixel filters: "magic" background whitening, CSS-style
// brightness/contrast/grayscale and binarization.
//
// The order is fixed: enhance, tone, threshold. Rotation is applied by the
// caller afterwards.

use image::Rgba;
use scandesk_core::FilterSettings;
use tracing::{debug, instrument};

use crate::raster::Raster;

/// Rec. 601 luma, the weighting used by every filter here.
#[inline]
fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Apply `settings` to `raster` in place. Settings that do nothing leave the
/// buffer untouched.
#[instrument(skip(raster), fields(width = raster.width(), height = raster.height()))]
pub fn apply_filters(raster: &mut Raster, settings: &FilterSettings) {
    let settings = settings.clamped();
    if settings.is_identity() {
        debug!("Identity filters; skipping pixel pass");
        return;
    }
    if settings.auto_enhance {
        magic_enhance(raster);
    }
    if settings.has_tone_adjustment() {
        adjust_tone(raster, settings.brightness, settings.contrast, settings.grayscale);
    }
    if settings.threshold > 0 {
        threshold(raster, settings.threshold);
    }
}

/// Whiten light backgrounds and deepen dark content.
///
/// Pixels with luma above 130 gain `(L-130)*2.5` on every channel; pixels
/// below 80 lose `(80-L)*0.5`.
pub fn magic_enhance(raster: &mut Raster) {
    for pixel in raster.as_image_mut().pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let (rf, gf, bf) = (r as f32, g as f32, b as f32);
        let l = luminance(rf, gf, bf);

        let mut shift = 0.0;
        if l > 130.0 {
            shift += (l - 130.0) * 2.5;
        }
        if l < 80.0 {
            shift -= (80.0 - l) * 0.5;
        }
        let adjust = |c: f32| (c + shift).round().clamp(0.0, 255.0) as u8;
        *pixel = Rgba([adjust(rf), adjust(gf), adjust(bf), a]);
    }
}

/// Brightness, then contrast, then grayscale, each with CSS filter semantics.
///
/// Arguments use the settings' ranges: brightness and contrast in -100..=100,
/// grayscale in 0..=100. Channels are clamped after every step.
pub fn adjust_tone(raster: &mut Raster, brightness: i32, contrast: i32, grayscale: u8) {
    let b = (brightness + 100) as f32 / 100.0;
    let c = (contrast + 100) as f32 / 100.0;
    let g = grayscale as f32 / 100.0;
    let s = 1.0 - g;

    // CSS grayscale(g) colour matrix.
    let m = [
        [0.2126 + 0.7874 * s, 0.7152 - 0.7152 * s, 0.0722 - 0.0722 * s],
        [0.2126 - 0.2126 * s, 0.7152 + 0.2848 * s, 0.0722 - 0.0722 * s],
        [0.2126 - 0.2126 * s, 0.7152 - 0.7152 * s, 0.0722 + 0.9278 * s],
    ];
    let clamp = |v: f32| v.clamp(0.0, 255.0);

    for pixel in raster.as_image_mut().pixels_mut() {
        let [r, gr, bl, a] = pixel.0;
        let mut ch = [r as f32, gr as f32, bl as f32];

        for v in ch.iter_mut() {
            *v = clamp(*v * b);
        }
        for v in ch.iter_mut() {
            *v = clamp((*v - 127.5) * c + 127.5);
        }
        if grayscale > 0 {
            let [cr, cg, cb] = ch;
            for (row, v) in m.iter().zip(ch.iter_mut()) {
                *v = clamp(row[0] * cr + row[1] * cg + row[2] * cb);
            }
        }

        *pixel = Rgba([
            ch[0].round() as u8,
            ch[1].round() as u8,
            ch[2].round() as u8,
            a,
        ]);
    }
}

/// Binarize: luma strictly above `level` becomes white, everything else black.
pub fn threshold(raster: &mut Raster, level: u8) {
    let level = level as f32;
    for pixel in raster.as_image_mut().pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let v = if luminance(r as f32, g as f32, b as f32) > level {
            255
        } else {
            0
        };
        *pixel = Rgba([v, v, v, a]);
    }
}
