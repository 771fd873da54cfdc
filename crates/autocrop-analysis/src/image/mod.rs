// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: grayscale pixel access and scan-line sampling.

pub mod source;

pub use source::{PixelSource, ScanLine, Step};
