// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One-dimensional signal processing: low-pass filtering, differentiation,
// least-squares line fitting, and outlier cleaning of edge-position sequences.

pub mod clean;
pub mod filter;
pub mod regression;

pub use clean::{CleanReport, clean, trim};
pub use filter::{differentiate, lowpass};
pub use regression::LineFit;
