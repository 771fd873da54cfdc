// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Analysis configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AutocropError, Result};

/// Below this many samples per side the r² values stop being meaningful.
pub const MIN_STABLE_SAMPLES: usize = 8;

/// How the four per-side angles are combined into one rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleAggregation {
    /// Plain arithmetic mean of the four side angles.
    #[default]
    Mean,
    /// Mean weighted by each side's r²; falls back to the plain mean when
    /// every confidence is zero.
    ConfidenceWeighted,
}

/// Tuning for the outlier cleaner applied to each per-side sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanParams {
    /// Maximum residual (pixels) a sample may have from the first-pass fit.
    pub regression_dev: f64,
    /// Maximum average absolute deviation (pixels) inside one chunk.
    pub chunk_mean_dev: f64,
    /// Number of consecutive samples per chunk.
    pub chunk_size: usize,
}

impl Default for CleanParams {
    fn default() -> Self {
        Self {
            regression_dev: 24.0,
            chunk_mean_dev: 4.0,
            chunk_size: 8,
        }
    }
}

/// Settings for one page analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Derivative value (gray levels per pixel) that counts as a page border.
    pub threshold: f64,
    /// Cutoff frequency (cycles/sample) of the denoising low-pass filter.
    pub cutoff_frequency: f64,
    /// Number of scan lines per image side.
    pub samples_per_side: usize,
    /// Edge positions at or above this are ignored when computing the
    /// reported trim window.
    pub trim_threshold: f64,
    /// Sides with r² below this are flagged as low confidence.
    pub min_confidence: f64,
    /// How side angles are combined.
    pub aggregation: AngleAggregation,
    pub clean: CleanParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: 12.0,
            cutoff_frequency: 0.1,
            samples_per_side: 500,
            trim_threshold: 200.0,
            min_confidence: 0.5,
            aggregation: AngleAggregation::Mean,
            clean: CleanParams::default(),
        }
    }
}

impl AnalysisConfig {
    /// Defaults with the three caller-facing knobs replaced.
    pub fn new(threshold: f64, cutoff_frequency: f64, samples_per_side: usize) -> Self {
        Self {
            threshold,
            cutoff_frequency,
            samples_per_side,
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), "Analysis config loaded");
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.samples_per_side == 0 {
            return Err(AutocropError::InvalidConfig(
                "samples_per_side must be at least 1".into(),
            ));
        }
        if !self.threshold.is_finite() {
            return Err(AutocropError::InvalidConfig(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        if !(self.cutoff_frequency.is_finite() && self.cutoff_frequency > 0.0) {
            return Err(AutocropError::InvalidConfig(format!(
                "cutoff_frequency must be a positive number, got {}",
                self.cutoff_frequency
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(AutocropError::InvalidConfig(format!(
                "min_confidence must lie in [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.trim_threshold.is_nan() {
            return Err(AutocropError::InvalidConfig(
                "trim_threshold must be a number".into(),
            ));
        }
        if self.clean.chunk_size == 0 {
            return Err(AutocropError::InvalidConfig(
                "clean.chunk_size must be at least 1".into(),
            ));
        }
        if !(self.clean.regression_dev >= 0.0 && self.clean.chunk_mean_dev >= 0.0) {
            return Err(AutocropError::InvalidConfig(format!(
                "clean deviations must be non-negative, got regression_dev={} chunk_mean_dev={}",
                self.clean.regression_dev, self.clean.chunk_mean_dev
            )));
        }
        Ok(())
    }

    /// Whether enough scan lines are taken per side for r² to mean anything.
    pub fn has_stable_confidence(&self) -> bool {
        self.samples_per_side >= MIN_STABLE_SAMPLES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_accepts_small_sample_counts_but_flags_them() {
        let few = AnalysisConfig::new(12.0, 0.1, MIN_STABLE_SAMPLES - 1);
        assert!(few.validate().is_ok());
        assert!(!few.has_stable_confidence());

        let enough = AnalysisConfig::new(12.0, 0.1, MIN_STABLE_SAMPLES);
        assert!(enough.has_stable_confidence());
        assert!(AnalysisConfig::default().has_stable_confidence());
    }

    #[test]
    fn defaults_match_command_line_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.threshold, 12.0);
        assert_eq!(config.cutoff_frequency, 0.1);
        assert_eq!(config.samples_per_side, 500);
        assert_eq!(config.clean, CleanParams::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_samples_rejected() {
        let config = AnalysisConfig::new(12.0, 0.1, 0);
        assert!(matches!(
            config.validate(),
            Err(AutocropError::InvalidConfig(_))
        ));
    }

    #[test]
    fn non_positive_cutoff_rejected() {
        for fc in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let config = AnalysisConfig::new(12.0, fc, 50);
            assert!(config.validate().is_err(), "cutoff {fc} accepted");
        }
    }

    #[test]
    fn bad_clean_params_rejected() {
        let mut config = AnalysisConfig::default();
        config.clean.chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.clean.regression_dev = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"samples_per_side": 64, "clean": {"chunk_size": 16}}"#)
                .unwrap();
        assert_eq!(config.samples_per_side, 64);
        assert_eq!(config.threshold, 12.0);
        assert_eq!(config.clean.chunk_size, 16);
        assert_eq!(config.clean.regression_dev, 24.0);
        assert_eq!(config.aggregation, AngleAggregation::Mean);
    }

    #[test]
    fn load_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autocrop.json");

        let mut config = AnalysisConfig::new(20.0, 0.25, 120);
        config.aggregation = AngleAggregation::ConfidenceWeighted;
        std::fs::write(&path, config.to_json_pretty().unwrap()).unwrap();

        let loaded = AnalysisConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = AnalysisConfig::load("/nonexistent/autocrop.json").unwrap_err();
        assert!(matches!(err, AutocropError::Io(_)));
    }
}
