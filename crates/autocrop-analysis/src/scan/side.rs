// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-side estimation: turns one side's sequence of detected border offsets
// into a tilt angle, a crop offset, and a confidence.

use std::ops::Range;

use autocrop_core::config::AnalysisConfig;
use autocrop_core::error::{AutocropError, Degeneracy, Result};
use autocrop_core::types::Side;
use serde::Serialize;
use tracing::debug;

use crate::signal::clean::{clean, trim};
use crate::signal::filter::lowpass;
use crate::signal::regression::LineFit;

/// Cutoff used to smooth an edge-position sequence before cleaning it.
pub const SEQUENCE_CUTOFF: f64 = 0.1;

/// Whether a side's line fit can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitQuality {
    Confident,
    /// r² fell below the configured minimum; manual review is advised.
    LowConfidence,
}

/// Result of analysing one side of the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideEstimate {
    pub side: Side,
    /// Tilt of this border in radians, signed so that all four sides agree.
    pub angle: f64,
    /// Distance in pixels from this side's image edge to the page border,
    /// evaluated at the middle of the side.
    pub offset: i64,
    /// Fit over the cleaned sequence.
    pub fit: LineFit,
    pub quality: FitQuality,
    /// Scan lines on which a border was detected at all.
    pub detected: usize,
    /// Index window of plausible raw detections (non-zero, below the trim
    /// threshold).
    pub window: Range<usize>,
}

impl SideEstimate {
    pub fn confidence(&self) -> f64 {
        self.fit.r_squared
    }
}

/// Estimate angle and crop offset for `side` from its raw edge positions.
///
/// `edges` holds one detected offset per scan line (zero where nothing was
/// found). `span` is the image dimension the scan lines are spread across:
/// the width for top and bottom, the height for left and right.
pub fn estimate_side(
    side: Side,
    edges: &[f64],
    span: u32,
    config: &AnalysisConfig,
) -> Result<SideEstimate> {
    let degenerate = |reason: Degeneracy| AutocropError::DegenerateSide { side, reason };

    let n = edges.len();
    let detected = edges.iter().filter(|&&e| e != 0.0).count();
    let window = trim(edges, config.trim_threshold);

    let mut smoothed = lowpass(edges, SEQUENCE_CUTOFF);
    let report = clean(&mut smoothed, &config.clean).map_err(degenerate)?;
    let fit = LineFit::compute(&smoothed).map_err(degenerate)?;

    // Slope is in pixels per scan line; scan lines are span / n pixels apart.
    let angle = (fit.slope * side.direction() * n as f64 / f64::from(span)).atan();
    let offset = (fit.intercept + fit.slope * n as f64 / 2.0) as i64;
    let quality = if fit.r_squared < config.min_confidence {
        FitQuality::LowConfidence
    } else {
        FitQuality::Confident
    };

    debug!(
        %side,
        detected,
        missed = n - detected,
        chunks_zeroed = report.chunks_zeroed,
        residuals_zeroed = report.residuals_zeroed,
        filled = report.filled,
        slope = fit.slope,
        intercept = fit.intercept,
        r_squared = fit.r_squared,
        angle_deg = angle.to_degrees(),
        offset,
        "Side estimated"
    );

    Ok(SideEstimate {
        side,
        angle,
        offset,
        fit,
        quality,
        detected,
        window,
    })
}
