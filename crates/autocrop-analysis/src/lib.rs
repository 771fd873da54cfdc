// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// autocrop-analysis: Skew and black-border estimation for scanned pages.
//
// Provides grayscale scan-line sampling, one-dimensional signal processing
// (low-pass filtering, differentiation, line fitting, outlier cleaning), and the
// page analysis that turns four sets of detected borders into a rotate/crop
// plan.

pub mod image;
pub mod scan;
pub mod signal;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export the primary entry points so callers can use `autocrop_analysis::Analyzer` etc.
pub use crate::image::source::{PixelSource, ScanLine, Step};
pub use scan::compose::{Analyzer, PageAnalysis, analyze, analyze_bytes, analyze_file};
pub use scan::edge::EdgeDetector;
pub use scan::side::{FitQuality, SideEstimate};
pub use signal::regression::LineFit;
