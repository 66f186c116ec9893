// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand bodies, kept apart from argument parsing so they can be driven
// from tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use scandesk_core::{Corners, FilterSettings, QuarterTurn};
use scandesk_document::{ConfirmedScan, CropMode, Estimate, Raster, ScanJob, ScanWorker};
use scandesk_editor::compose::export_async;
use scandesk_editor::{Composer, ExportFormat, Session};
use tracing::{info, warn};

/// How each input is turned into a page.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Corners in source pixels. Detected when absent and `crop` is set.
    pub corners: Option<Corners>,
    /// Crop to a quadrilateral; when off the whole frame is kept.
    pub crop: bool,
    pub mode: CropMode,
    pub rotation: QuarterTurn,
    pub filters: FilterSettings,
}

/// PDF for a `.pdf` extension (any case), PNG otherwise.
pub fn output_format(path: &Path) -> ExportFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => ExportFormat::Pdf,
        _ => ExportFormat::Png,
    }
}

async fn load(worker: &ScanWorker, input: &Path) -> Result<Arc<Raster>> {
    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let raster = worker
        .pipeline()
        .load(&bytes)
        .with_context(|| format!("loading {}", input.display()))?;
    Ok(Arc::new(raster))
}

pub async fn detect(worker: &ScanWorker, input: &Path) -> Result<Estimate> {
    let source = load(worker, input).await?;
    Ok(worker.detect(source).await?)
}

async fn scan_page(worker: &ScanWorker, input: &Path, options: &ScanOptions) -> Result<ConfirmedScan> {
    let source = load(worker, input).await?;
    let confirmed = if options.crop {
        let outcome = worker
            .scan(ScanJob {
                source,
                corners: options.corners,
                mode: options.mode,
                rotation: options.rotation,
                filters: options.filters,
            })
            .await
            .with_context(|| format!("scanning {}", input.display()))?;
        if let Some(estimate) = outcome.estimate {
            info!(kind = ?estimate.kind, "Using detected corners for {}", input.display());
        }
        outcome.confirmed
    } else {
        worker
            .keep_frame(source, options.rotation, options.filters)
            .await
            .with_context(|| format!("baking {}", input.display()))?
    };

    if let Some(reason) = &confirmed.degraded {
        warn!(%reason, "{} was kept unflattened", input.display());
    }
    Ok(confirmed)
}

/// Scan one image. PNG output is the page itself; PDF output places it on
/// the configured paper.
pub async fn scan(
    worker: &ScanWorker,
    input: &Path,
    output: &Path,
    options: &ScanOptions,
) -> Result<usize> {
    let confirmed = scan_page(worker, input, options).await?;
    let bytes = match output_format(output) {
        ExportFormat::Png => worker.pipeline().codec().encode(&confirmed.page.pixels)?,
        ExportFormat::Pdf => {
            let mut session = Session::new();
            session.add(confirmed.page);
            export_session(worker, &session, ExportFormat::Pdf).await?
        }
    };
    write(output, &bytes).await?;
    Ok(bytes.len())
}

/// Scan every input, place them in order and export one page.
pub async fn compose(
    worker: &ScanWorker,
    inputs: &[PathBuf],
    output: &Path,
    options: &ScanOptions,
) -> Result<usize> {
    if inputs.is_empty() {
        bail!("nothing to compose");
    }
    let mut session = Session::new();
    for input in inputs {
        let confirmed = scan_page(worker, input, options).await?;
        session.add(confirmed.page);
    }
    let bytes = export_session(worker, &session, output_format(output)).await?;
    write(output, &bytes).await?;
    Ok(bytes.len())
}

async fn export_session(worker: &ScanWorker, session: &Session, format: ExportFormat) -> Result<Vec<u8>> {
    let config = worker.pipeline().config();
    let mut composer = Composer::new(config.output_page(), config.composer.clone());
    let placed = composer.sync(session);
    info!(items = placed.len(), ?format, "Exporting composition");
    Ok(export_async(worker, &composer, session, format).await?)
}

async fn write(output: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(output, bytes)
        .await
        .with_context(|| format!("writing {}", output.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use scandesk_core::FilterPreset;
    use scandesk_document::{EstimateKind, ScanPipeline};

    fn worker() -> ScanWorker {
        ScanWorker::new(Arc::new(ScanPipeline::default()))
    }

    /// A light sheet on a dark table, written as PNG.
    fn photo(dir: &Path, name: &str) -> PathBuf {
        let image = RgbaImage::from_fn(320, 240, |x, y| {
            if (60..260).contains(&x) && (40..200).contains(&y) {
                Rgba([225, 222, 218, 255])
            } else {
                Rgba([30, 32, 36, 255])
            }
        });
        let path = dir.join(name);
        image.save(&path).unwrap();
        path
    }

    fn options(crop: bool) -> ScanOptions {
        ScanOptions {
            corners: None,
            crop,
            mode: CropMode::Perspective,
            rotation: QuarterTurn::R0,
            filters: FilterPreset::Original.settings(),
        }
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(output_format(Path::new("a/page.PDF")), ExportFormat::Pdf);
        assert_eq!(output_format(Path::new("page.png")), ExportFormat::Png);
        assert_eq!(output_format(Path::new("page")), ExportFormat::Png);
    }

    #[tokio::test]
    async fn detect_finds_the_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let estimate = detect(&worker(), &photo(dir.path(), "in.png")).await.unwrap();
        assert_eq!(estimate.kind, EstimateKind::Detected);
    }

    #[tokio::test]
    async fn scan_to_png_flattens_and_upscales() {
        let dir = tempfile::tempdir().unwrap();
        let input = photo(dir.path(), "in.png");
        let output = dir.path().join("out.png");

        scan(&worker(), &input, &output, &options(true)).await.unwrap();
        let page = image::open(&output).unwrap();
        assert_eq!(page.width().max(page.height()), 2000);
    }

    #[tokio::test]
    async fn scan_without_crop_keeps_frame() {
        let dir = tempfile::tempdir().unwrap();
        let input = photo(dir.path(), "in.png");
        let output = dir.path().join("out.png");

        scan(&worker(), &input, &output, &options(false)).await.unwrap();
        let page = image::open(&output).unwrap();
        assert_eq!((page.width(), page.height()), (320, 240));
    }

    #[tokio::test]
    async fn polygon_scan_keeps_source_scale() {
        let dir = tempfile::tempdir().unwrap();
        let input = photo(dir.path(), "in.png");
        let output = dir.path().join("out.png");
        let cut = ScanOptions {
            corners: Some(Corners::rectangle(200.0, 100.0)),
            mode: CropMode::Polygon,
            ..options(true)
        };

        scan(&worker(), &input, &output, &cut).await.unwrap();
        let page = image::open(&output).unwrap();
        assert_eq!((page.width(), page.height()), (200, 100));
    }

    #[tokio::test]
    async fn compose_writes_single_page_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = vec![photo(dir.path(), "a.png"), photo(dir.path(), "b.png")];
        let output = dir.path().join("page.pdf");

        let written = compose(&worker(), &inputs, &output, &options(true)).await.unwrap();
        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(bytes.len(), written);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = detect(&worker(), &dir.path().join("nope.png")).await.unwrap_err();
        assert!(err.to_string().contains("nope.png"));
    }
}
