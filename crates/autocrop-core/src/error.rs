// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for autocrop.

use thiserror::Error;

use crate::types::Side;

/// Top-level error type for all autocrop operations.
#[derive(Debug, Error)]
pub enum AutocropError {
    // -- Input errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("image too small for edge analysis: {width}x{height} (need at least {min}px on each axis)", min = crate::types::MIN_IMAGE_DIMENSION)]
    ImageTooSmall { width: u32, height: u32 },

    // -- Configuration errors --
    #[error("invalid analysis configuration: {0}")]
    InvalidConfig(String),

    // -- Analysis errors --
    #[error("scan line sampling failed: {0}")]
    Sampling(String),

    #[error("{side} side could not be fitted: {reason}")]
    DegenerateSide { side: Side, reason: Degeneracy },

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a straight-line fit over an edge-position sequence is not well posed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Degeneracy {
    /// Fewer than two non-zero samples remained, so no slope exists.
    #[error("only {usable} usable sample(s), need at least 2")]
    TooFewSamples { usable: usize },

    /// The sequence contained NaN or infinite values.
    #[error("sequence contains non-finite values")]
    NonFinite,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AutocropError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_side_message_names_the_side() {
        let err = AutocropError::DegenerateSide {
            side: Side::Left,
            reason: Degeneracy::TooFewSamples { usable: 1 },
        };
        assert_eq!(
            err.to_string(),
            "left side could not be fitted: only 1 usable sample(s), need at least 2"
        );
    }

    #[test]
    fn image_too_small_reports_minimum() {
        let err = AutocropError::ImageTooSmall {
            width: 10,
            height: 400,
        };
        assert!(err.to_string().contains("10x400"));
        assert!(err.to_string().contains("32px"));
    }
}
