// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scandesk: perspective-correcting document scanner.
//
// Entry point. Initialises logging and configuration, then runs one
// subcommand against files on disk.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scandesk_core::human_errors::humanize_error;
use scandesk_core::{Corners, FilterPreset, Point, QuarterTurn, ScanConfig, ScanError};
use scandesk_document::{CropMode, ScanPipeline, ScanWorker};

use commands::ScanOptions;

#[derive(Parser)]
#[command(name = "scandesk", about = "Flatten, clean up and compose document photos", version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Propose document corners and print them as JSON
    Detect {
        /// Input image (JPEG, PNG or WebP)
        input: PathBuf,
    },

    /// Flatten one photo into a clean page
    Scan {
        /// Input image (JPEG, PNG or WebP)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file; `.pdf` places the page on the output paper, anything
        /// else writes PNG
        #[arg(short, long)]
        output: PathBuf,

        /// Corners in source pixels: TLx,TLy,TRx,TRy,BRx,BRy,BLx,BLy.
        /// Detected automatically when omitted
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        corners: Option<Vec<f64>>,

        /// Keep the full frame instead of flattening a quadrilateral
        #[arg(long, conflicts_with = "corners")]
        no_crop: bool,

        /// Cut the quadrilateral out as drawn instead of flattening it
        #[arg(long, conflicts_with = "no_crop")]
        polygon: bool,

        #[command(flatten)]
        look: LookArgs,
    },

    /// Place several photos on one page and export it
    Compose {
        /// Input images, placed in order
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output file (`.pdf` or `.png`)
        #[arg(short, long)]
        output: PathBuf,

        /// Flatten each input with detected corners before placing it
        #[arg(long)]
        auto_crop: bool,

        #[command(flatten)]
        look: LookArgs,
    },
}

#[derive(clap::Args)]
struct LookArgs {
    /// Filter preset
    #[arg(long, default_value = "original", value_enum)]
    preset: PresetArg,

    /// Clockwise rotation in degrees (0, 90, 180 or 270)
    #[arg(long, default_value = "0", value_parser = parse_turn)]
    rotate: QuarterTurn,
}

#[derive(Clone, Copy, ValueEnum)]
enum PresetArg {
    Original,
    Magic,
    Bw,
    Gray,
}

impl From<PresetArg> for FilterPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Original => Self::Original,
            PresetArg::Magic => Self::Magic,
            PresetArg::Bw => Self::BlackWhite,
            PresetArg::Gray => Self::Gray,
        }
    }
}

fn parse_turn(raw: &str) -> Result<QuarterTurn, String> {
    let degrees: i32 = raw.parse().map_err(|e| format!("{e}"))?;
    QuarterTurn::from_degrees(degrees).ok_or_else(|| format!("{degrees} is not a quarter turn"))
}

fn corners_from(values: &[f64]) -> Option<Corners> {
    match values {
        [a, b, c, d, e, f, g, h] => Some(Corners::new(
            Point::new(*a, *b),
            Point::new(*c, *d),
            Point::new(*e, *f),
            Point::new(*g, *h),
        )),
        _ => None,
    }
}

impl LookArgs {
    fn options(&self, corners: Option<Corners>, crop: bool, mode: CropMode) -> ScanOptions {
        ScanOptions {
            corners,
            crop,
            mode,
            rotation: self.rotate,
            filters: FilterPreset::from(self.preset).settings(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => ScanConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ScanConfig::default(),
    };
    let worker = ScanWorker::new(Arc::new(ScanPipeline::new(config)));

    let outcome = run(cli.command, &worker).await;
    if let Some(scan_err) = outcome.as_ref().err().and_then(|e| e.downcast_ref::<ScanError>()) {
        let human = humanize_error(scan_err);
        eprintln!("{}", human.message);
        eprintln!("{}", human.suggestion);
    }
    outcome
}

async fn run(command: Commands, worker: &ScanWorker) -> Result<()> {
    match command {
        Commands::Detect { input } => {
            let estimate = commands::detect(worker, &input).await?;
            println!("{}", serde_json::to_string_pretty(&estimate)?);
        }

        Commands::Scan {
            input,
            output,
            corners,
            no_crop,
            polygon,
            look,
        } => {
            let corners = corners
                .as_deref()
                .map(|v| corners_from(v).context("--corners takes exactly 8 numbers"))
                .transpose()?;
            let mode = if polygon { CropMode::Polygon } else { CropMode::Perspective };
            let options = look.options(corners, !no_crop, mode);
            let written = commands::scan(worker, &input, &output, &options).await?;
            println!("Scanned {} → {} ({written} bytes)", input.display(), output.display());
        }

        Commands::Compose {
            input,
            output,
            auto_crop,
            look,
        } => {
            let options = look.options(None, auto_crop, CropMode::Perspective);
            let written = commands::compose(worker, &input, &output, &options).await?;
            println!(
                "Composed {} images → {} ({written} bytes)",
                input.len(),
                output.display()
            );
        }
    }
    Ok(())
}
