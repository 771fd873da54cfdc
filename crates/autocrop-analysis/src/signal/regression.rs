// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ordinary least-squares line fit over (index, value) pairs.

use autocrop_core::error::Degeneracy;
use serde::Serialize;

/// Relative spread below which all values count as equal.
const FLAT_TOLERANCE: f64 = 1e-12;

/// Straight line `value = intercept + slope * index` fitted to a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
    /// Squared correlation coefficient, in `[0, 1]`.
    pub r_squared: f64,
    /// Number of non-zero samples that took part in the fit.
    pub samples: usize,
}

impl LineFit {
    /// Fit a line through `values`, using each element's index as x.
    ///
    /// Elements equal to exactly zero are treated as missing and skipped. At
    /// least two usable values are required. When every usable value is the
    /// same the fit is a flat line with r² = 1.
    pub fn compute(values: &[f64]) -> Result<Self, Degeneracy> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Degeneracy::NonFinite);
        }

        let usable = || {
            values
                .iter()
                .enumerate()
                .filter(|(_, y)| **y != 0.0)
                .map(|(i, y)| (i as f64, *y))
        };

        let n = usable().count();
        if n < 2 {
            return Err(Degeneracy::TooFewSamples { usable: n });
        }

        let count = n as f64;
        let (sum_x, sum_y) = usable().fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        let mean_x = sum_x / count;
        let mean_y = sum_y / count;

        // Centred sums: E[xy] - E[x]E[y] etc., scaled by n.
        let (sxy, sxx, syy) = usable().fold((0.0, 0.0, 0.0), |(sxy, sxx, syy), (x, y)| {
            let dx = x - mean_x;
            let dy = y - mean_y;
            (sxy + dx * dy, sxx + dx * dx, syy + dy * dy)
        });

        // Indices are distinct, so sxx > 0 whenever n >= 2.
        if syy <= FLAT_TOLERANCE * count * mean_y * mean_y {
            return Ok(Self {
                intercept: mean_y,
                slope: 0.0,
                r_squared: 1.0,
                samples: n,
            });
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        let r_squared = ((sxy * sxy) / (sxx * syy)).clamp(0.0, 1.0);

        Ok(Self {
            intercept,
            slope,
            r_squared,
            samples: n,
        })
    }

    /// Value of the fitted line at `index`.
    pub fn at(&self, index: usize) -> f64 {
        self.intercept + self.slope * index as f64
    }
}
