// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outlier cleaning for per-side edge-position sequences.
//
// Ink, stray marks, and torn corners near the page border show up as bursts of
// edge positions far from the straight line the border should follow. The
// cleaner zeroes the untrustworthy regions, zeroes what still sits too far
// from a first fit, and then fills every hole from a second fit over the
// survivors.

use std::ops::Range;

use autocrop_core::config::CleanParams;
use autocrop_core::error::Degeneracy;

use super::regression::LineFit;

/// Once fewer than this many samples remain, they form the final chunk.
pub const MIN_TAIL_CHUNK: usize = 8;

/// What a [`clean`] pass changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanReport {
    /// Chunks wiped for excessive internal deviation.
    pub chunks_zeroed: usize,
    /// Individual samples wiped for sitting too far from the first fit.
    pub residuals_zeroed: usize,
    /// Zero entries replaced by the final fit.
    pub filled: usize,
}

/// Arithmetic mean. Empty input yields zero.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Average absolute deviation of `xs` from its own mean.
pub fn avg_abs_dev(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let centre = mean(xs);
    xs.iter().map(|x| (x - centre).abs()).sum::<f64>() / xs.len() as f64
}

/// Split `len` elements into contiguous chunks of `size`. When fewer than
/// [`MIN_TAIL_CHUNK`] elements remain they become one last chunk of their own,
/// so a short noisy tail is judged on its own deviation.
fn chunk_ranges(len: usize, size: usize) -> Vec<Range<usize>> {
    let size = size.max(1);
    let mut ranges = Vec::with_capacity(len / size + 1);
    let mut start = 0;
    while start < len {
        let end = if len - start < MIN_TAIL_CHUNK {
            len
        } else {
            (start + size).min(len)
        };
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Clean `xs` in place so a straight line dominates it.
///
/// 1. Every chunk whose average absolute deviation exceeds
///    `params.chunk_mean_dev` is zeroed.
/// 2. A line is fitted over the non-zero values and every value further than
///    `params.regression_dev` from it is zeroed.
/// 3. A second line is fitted over the survivors and every zero is replaced
///    by that line's value at its index.
///
/// On success `xs` holds no missing values. If either fit has nothing to work
/// with, the degeneracy is returned and `xs` is left partially zeroed.
pub fn clean(xs: &mut [f64], params: &CleanParams) -> Result<CleanReport, Degeneracy> {
    let mut report = CleanReport::default();

    for range in chunk_ranges(xs.len(), params.chunk_size) {
        let chunk = &mut xs[range];
        if avg_abs_dev(chunk) > params.chunk_mean_dev {
            chunk.fill(0.0);
            report.chunks_zeroed += 1;
        }
    }

    let first = LineFit::compute(xs)?;
    for (t, y) in xs.iter_mut().enumerate() {
        if *y != 0.0 && (first.at(t) - *y).abs() > params.regression_dev {
            *y = 0.0;
            report.residuals_zeroed += 1;
        }
    }

    let second = LineFit::compute(xs)?;
    for (t, y) in xs.iter_mut().enumerate() {
        if *y == 0.0 {
            *y = second.at(t);
            report.filled += 1;
        }
    }

    Ok(report)
}

/// Index window `lo..hi` spanning the first through last values that are
/// non-zero and below `thresh`.
///
/// Falls back to the full sequence on either end when no such value exists.
pub fn trim(xs: &[f64], thresh: f64) -> Range<usize> {
    let keep = |y: f64| y > 0.0 && y < thresh;
    let lo = xs.iter().position(|&y| keep(y)).unwrap_or(0);
    let hi = xs.iter().rposition(|&y| keep(y)).map_or(xs.len(), |t| t + 1);
    lo..hi
}
