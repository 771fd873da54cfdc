// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// autocrop: skew and black-border estimation for scanned pages.
//
// Entry point. Parses flags, layers them over an optional JSON config file,
// analyses one image, and prints the `convert` invocation that straightens and
// crops it. Logs go to stderr so stdout carries only the result.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use autocrop_analysis::{Analyzer, PageAnalysis};
use autocrop_core::error::Result;
use autocrop_core::{AnalysisConfig, AngleAggregation, AutocropError, CropRect, Side, Transform};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit status when `--strict` is set and a side fit is unreliable.
const EXIT_LOW_CONFIDENCE: u8 = 2;
/// Exit status when the estimated crop rectangle is inverted.
const EXIT_INVERTED: u8 = 3;

#[derive(Debug, Parser)]
#[command(name = "autocrop")]
#[command(
    about = "Estimate the skew and black border of a scanned page and print the convert command that fixes them"
)]
#[command(version)]
struct Cli {
    /// Scanned page to analyse.
    #[arg(required_unless_present = "print_config")]
    image: Option<PathBuf>,

    /// Derivative threshold (gray levels per pixel) for a page border.
    #[arg(short = 'd', long)]
    threshold: Option<f64>,

    /// Cutoff frequency (cycles/sample) of the denoising filter.
    #[arg(long = "fc", visible_alias = "cutoff")]
    cutoff: Option<f64>,

    /// Scan lines per image side.
    #[arg(short = 'n', long = "samples")]
    samples: Option<usize>,

    /// JSON configuration file. Flags override its values.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Sides with r² below this are reported as low confidence.
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Weight side angles by their confidence instead of a plain mean.
    #[arg(long)]
    weighted: bool,

    /// Print the transform as JSON instead of a convert command.
    #[arg(long)]
    json: bool,

    /// Exit with status 2 when any side is low confidence.
    #[arg(long)]
    strict: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    /// Defaults, then the `--config` file, then individual flags.
    fn effective_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(cutoff) = self.cutoff {
            config.cutoff_frequency = cutoff;
        }
        if let Some(samples) = self.samples {
            config.samples_per_side = samples;
        }
        if let Some(min_confidence) = self.min_confidence {
            config.min_confidence = min_confidence;
        }
        if self.weighted {
            config.aggregation = AngleAggregation::ConfidenceWeighted;
        }
        config.validate()?;
        Ok(config)
    }
}

/// JSON shape printed by `--json`.
#[derive(Debug, Serialize)]
struct Report<'a> {
    image: &'a Path,
    angle: f64,
    degrees: f64,
    bounds: CropRect,
    confidence: [f64; 4],
    low_confidence: Vec<Side>,
    command: String,
}

impl<'a> Report<'a> {
    fn new(image: &'a Path, analysis: &PageAnalysis) -> Self {
        let transform = &analysis.transform;
        Self {
            image,
            angle: transform.angle,
            degrees: transform.degrees(),
            bounds: transform.bounds,
            confidence: transform.confidence,
            low_confidence: analysis.low_confidence_sides(),
            command: transform.crop_command(),
        }
    }
}

/// `scans/p1.png` -> `scans/_p1.png`
fn output_path(image: &Path) -> PathBuf {
    match image.file_name() {
        Some(name) => {
            let mut prefixed = OsString::from("_");
            prefixed.push(name);
            image.with_file_name(prefixed)
        }
        None => PathBuf::from(format!("_{}", image.display())),
    }
}

fn convert_line(image: &Path, transform: &Transform) -> String {
    format!(
        "convert {} {} {}",
        image.display(),
        transform,
        output_path(image).display()
    )
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// How a run ended, beyond plain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Done,
    /// `--strict` and at least one side fit below `min_confidence`.
    LowConfidence,
    /// Nothing printed: the crop rectangle came out inverted.
    Inverted,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Done => ExitCode::SUCCESS,
            Outcome::LowConfidence => ExitCode::from(EXIT_LOW_CONFIDENCE),
            Outcome::Inverted => ExitCode::from(EXIT_INVERTED),
        }
    }
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<Outcome> {
    let config = cli.effective_config()?;
    if cli.print_config {
        writeln!(out, "{}", config.to_json_pretty()?)?;
        return Ok(Outcome::Done);
    }

    let Some(image) = cli.image.as_deref() else {
        return Err(AutocropError::InvalidConfig("no input image given".into()));
    };
    info!(image = %image.display(), samples = config.samples_per_side, "autocrop starting");

    let analysis = Analyzer::new(config)?.run_file(image)?;
    emit(cli, image, &analysis, out)
}

/// Write the result of `analysis` to `out` in the requested format.
fn emit(
    cli: &Cli,
    image: &Path,
    analysis: &PageAnalysis,
    out: &mut impl Write,
) -> Result<Outcome> {
    let transform = &analysis.transform;
    if transform.bounds.is_inverted() {
        error!(
            bounds = ?transform.bounds,
            "Refusing to print an inverted crop rectangle"
        );
        return Ok(Outcome::Inverted);
    }

    if cli.json {
        writeln!(
            out,
            "{}",
            serde_json::to_string_pretty(&Report::new(image, analysis))?
        )?;
    } else {
        writeln!(out, "{}", convert_line(image, transform))?;
    }

    let weak = analysis.low_confidence_sides();
    if cli.strict && !weak.is_empty() {
        warn!(sides = ?weak, "Strict mode: low-confidence sides");
        return Ok(Outcome::LowConfidence);
    }
    Ok(Outcome::Done)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let mut stdout = std::io::stdout().lock();
    match run(&cli, &mut stdout) {
        Ok(outcome) => outcome.into(),
        Err(err) => {
            error!(error = %err, "autocrop failed");
            ExitCode::FAILURE
        }
    }
}
