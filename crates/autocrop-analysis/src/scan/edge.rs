// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rising-edge detection along a single scan line.

use crate::signal::filter::{differentiate, lowpass};

/// Finds the black-to-white transition where the page starts.
///
/// Only rising edges are reported: the background is assumed black and the
/// page white near its border, so a falling edge is never a page border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeDetector {
    /// Derivative value that must be exceeded to count as an edge.
    threshold: f64,
    /// Cutoff frequency of the denoising filter applied before differentiating.
    cutoff: f64,
}

impl EdgeDetector {
    pub fn new(threshold: f64, cutoff: f64) -> Self {
        Self { threshold, cutoff }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Offset of the page border within `samples`, or `None` when the
    /// derivative never rises above the threshold.
    ///
    /// The border is the peak of the first run of derivative values above the
    /// threshold, not the first crossing itself.
    pub fn search(&self, samples: &[f64]) -> Option<usize> {
        let smoothed = lowpass(samples, self.cutoff);
        let d = differentiate(&smoothed);

        let first = d.iter().position(|&v| v > self.threshold)?;
        let mut peak = first;
        for (i, &v) in d.iter().enumerate().skip(first + 1) {
            if v <= self.threshold {
                break;
            }
            if v > d[peak] {
                peak = i;
            }
        }
        Some(peak)
    }
}
