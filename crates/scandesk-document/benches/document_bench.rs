// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the scandesk-document crate: the perspective warp
// and the export-resolution filter bake.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use scandesk_core::{Corners, FilterPreset, Point, QuarterTurn};
use scandesk_document::{Raster, ScanPipeline, WarpEngine};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A 1000x1000 photo-like raster: dark table, light sheet, some texture.
fn photo() -> Raster {
    Raster::new(RgbaImage::from_fn(1000, 1000, |x, y| {
        let on_sheet = (100..900).contains(&x) && (100..900).contains(&y);
        let base: u8 = if on_sheet { 220 } else { 40 };
        let noise = ((x * 31 + y * 17) % 13) as u8;
        Rgba([base.saturating_add(noise), base, base.saturating_sub(noise), 255])
    }))
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Warp a skewed quadrilateral; output is upscaled to 2000 px on the long side.
fn bench_perspective_warp(c: &mut Criterion) {
    let source = photo();
    let corners = Corners::from_array([
        Point::new(100.0, 100.0),
        Point::new(900.0, 150.0),
        Point::new(880.0, 950.0),
        Point::new(120.0, 900.0),
    ]);
    let engine = WarpEngine::default();

    c.bench_function("perspective_warp (1000x1000 -> 2000 long side)", |b| {
        b.iter(|| {
            let warped = engine.warp(black_box(&source), black_box(&corners));
            black_box(warped.ok());
        });
    });
}

/// Bake the "magic" preset with a quarter turn.
fn bench_filter_bake(c: &mut Criterion) {
    let source = photo();
    let pipeline = ScanPipeline::default();
    let magic = FilterPreset::Magic.settings();

    c.bench_function("render_export magic + 90deg (1000x1000)", |b| {
        b.iter(|| {
            let out = pipeline.render_export(black_box(&source), QuarterTurn::R90, &magic);
            black_box(out);
        });
    });
}

criterion_group!(benches, bench_perspective_warp, bench_filter_bake);
criterion_main!(benches);
