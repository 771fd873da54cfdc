// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Low-pass filter and differentiator.

use std::f64::consts::PI;

/// Cutoff (cycles/sample) used to smooth every derivative.
pub const DERIVATIVE_CUTOFF: f64 = 0.1;

/// One-pole exponential smoothing of `x` at cutoff frequency `fc`
/// (cycles/sample).
///
/// `fc` must be positive; callers validate it up front.
pub fn lowpass(x: &[f64], fc: f64) -> Vec<f64> {
    let Some((&first, rest)) = x.split_first() else {
        return Vec::new();
    };

    let rc = 1.0 / (2.0 * PI * fc);
    let alpha = 1.0 / (rc + 1.0);

    let mut y = Vec::with_capacity(x.len());
    y.push(first);
    let mut prev = first;
    for &sample in rest {
        prev += alpha * (sample - prev);
        y.push(prev);
    }
    y
}

/// Central-difference derivative of `x` without smoothing.
///
/// The first and last points use one-sided differences. A single sample has
/// derivative zero.
pub fn raw_derivative(x: &[f64]) -> Vec<f64> {
    match x.len() {
        0 => Vec::new(),
        1 => vec![0.0],
        len => {
            let mut d = Vec::with_capacity(len);
            d.push(x[1] - x[0]);
            d.extend(x.windows(3).map(|w| (w[2] - w[0]) / 2.0));
            d.push(x[len - 1] - x[len - 2]);
            d
        }
    }
}

/// Derivative of `x`, low-passed at [`DERIVATIVE_CUTOFF`] to keep pixel noise
/// from dominating.
pub fn differentiate(x: &[f64]) -> Vec<f64> {
    lowpass(&raw_derivative(x), DERIVATIVE_CUTOFF)
}
