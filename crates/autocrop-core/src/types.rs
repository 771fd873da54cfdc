// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: page sides, crop rectangles, and the transformation plan.

use serde::{Deserialize, Serialize};

/// Each scan line covers `1 / SCAN_WINDOW_DIVISOR` of the dimension it walks.
pub const SCAN_WINDOW_DIVISOR: u32 = 16;

/// Smallest width/height that still yields a scan window of two pixels.
pub const MIN_IMAGE_DIMENSION: u32 = 2 * SCAN_WINDOW_DIVISOR;

/// One of the four image edges, in CSS box order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// All sides in confidence order (top, right, bottom, left).
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// Position of this side in `Transform::confidence`.
    pub fn index(self) -> usize {
        match self {
            Self::Top => 0,
            Self::Right => 1,
            Self::Bottom => 2,
            Self::Left => 3,
        }
    }

    /// Sign that turns this side's edge-offset slope into a rotation angle.
    ///
    /// A clockwise tilt pushes the top and right borders away from their image
    /// edges as the index grows, and pulls the bottom and left borders in, so
    /// the two pairs carry opposite signs.
    pub fn direction(self) -> f64 {
        match self {
            Self::Top | Self::Right => -1.0,
            Self::Bottom | Self::Left => 1.0,
        }
    }

    /// True for sides sampled along image columns (top, bottom).
    pub fn runs_along_width(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned crop rectangle in original image coordinates.
///
/// `min_*` is inclusive and `max_*` exclusive. Nothing prevents an inverted
/// rectangle from being built; check [`CropRect::is_inverted`] before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CropRect {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl CropRect {
    pub fn new(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> i64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i64 {
        self.max_y - self.min_y
    }

    /// True when either axis has `min > max`.
    pub fn is_inverted(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }
}

/// A transformation plan that, applied by a downstream tool, should straighten
/// the page and remove its black border.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Rotate by this angle (radians) to make the page straight.
    pub angle: f64,
    /// Crop to this rectangle after rotating.
    pub bounds: CropRect,
    /// r² of the per-side line fits, in top/right/bottom/left order.
    pub confidence: [f64; 4],
}

impl Transform {
    /// Rotation angle in degrees.
    pub fn degrees(&self) -> f64 {
        self.angle.to_degrees()
    }

    pub fn confidence_for(&self, side: Side) -> f64 {
        self.confidence[side.index()]
    }

    /// Sides whose fit confidence falls below `min_confidence`.
    pub fn low_confidence_sides(&self, min_confidence: f64) -> Vec<Side> {
        Side::ALL
            .into_iter()
            .filter(|side| self.confidence_for(*side) < min_confidence)
            .collect()
    }

    /// The weakest of the four side confidences.
    pub fn min_confidence(&self) -> f64 {
        self.confidence.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// ImageMagick/GraphicsMagick flags that perform this transformation.
    ///
    /// Rotating an image grows its canvas by a thin triangle on every side, so
    /// the crop origin is shifted by half the extra width/height the rotation
    /// introduces.
    pub fn crop_command(&self) -> String {
        let r = (-self.angle).sin() / 2.0;
        let width = self.bounds.width();
        let height = self.bounds.height();
        let left = self.bounds.min_x + (height as f64 * r) as i64;
        let top = self.bounds.min_y + (width as f64 * r) as i64;

        format!(
            "-rotate {:.6} -crop {}x{}+{}+{}",
            self.degrees(),
            width,
            height,
            left,
            top
        )
    }
}

impl std::fmt::Display for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.crop_command())
    }
}
