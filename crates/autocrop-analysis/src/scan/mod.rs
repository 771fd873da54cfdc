// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page analysis: rising-edge search along scan lines, per-side line fitting,
// and composition of the four sides into one rotate/crop plan.

pub mod compose;
pub mod edge;
pub mod side;

pub use compose::{Analyzer, PageAnalysis, analyze, analyze_bytes, analyze_file};
pub use edge::EdgeDetector;
pub use side::{FitQuality, SideEstimate};
