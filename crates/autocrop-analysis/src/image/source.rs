// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pixel source: grayscale intensity access over a decoded image, and sampling
// of intensity sequences along single rows or columns.

use autocrop_core::error::{AutocropError, Result};
use image::{DynamicImage, GenericImageView, GrayImage, Rgba};

/// Read-only grayscale view of a decoded image.
///
/// The variant is chosen once per image: 8-bit luma buffers are indexed
/// directly, every other layout is reduced to the plain mean of its red, green
/// and blue channels. No perceptual weighting is applied; only the contrast
/// between a black background and a white page matters here.
#[derive(Clone, Copy)]
pub enum PixelSource<'a> {
    /// Native 8-bit grayscale buffer.
    Luma(&'a GrayImage),
    /// Any other pixel layout, blended to gray per pixel.
    Blended(&'a DynamicImage),
}

/// A single row or column of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanLine {
    /// Walk along x at this fixed y.
    Row(u32),
    /// Walk along y at this fixed x.
    Column(u32),
}

/// Walking direction along a scan line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// +1 per sample.
    Forward,
    /// -1 per sample.
    Backward,
}

impl Step {
    fn delta(self) -> i64 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

impl<'a> PixelSource<'a> {
    pub fn new(image: &'a DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) => Self::Luma(gray),
            other => Self::Blended(other),
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            Self::Luma(gray) => gray.width(),
            Self::Blended(image) => image.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::Luma(gray) => gray.height(),
            Self::Blended(image) => image.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Gray value at `(x, y)`. The coordinate must be inside the image.
    pub fn gray_at(&self, x: u32, y: u32) -> u8 {
        match self {
            Self::Luma(gray) => gray.get_pixel(x, y).0[0],
            Self::Blended(image) => blend(image.get_pixel(x, y)),
        }
    }

    /// Collect intensities along `line`, from `start` towards the exclusive
    /// `end`, one pixel per `step`.
    ///
    /// `start` and `end` are offsets along the line. A forward walk needs
    /// `0 <= start <= end <= extent`; a backward walk needs
    /// `-1 <= end <= start < extent`.
    pub fn sample(&self, line: ScanLine, start: i64, end: i64, step: Step) -> Result<Vec<f64>> {
        let (extent, across, fixed) = match line {
            ScanLine::Row(y) => (self.width(), self.height(), y),
            ScanLine::Column(x) => (self.height(), self.width(), x),
        };
        if fixed >= across {
            return Err(AutocropError::Sampling(format!(
                "{line:?} lies outside a {}x{} image",
                self.width(),
                self.height()
            )));
        }

        let extent = i64::from(extent);
        let reachable = match step {
            Step::Forward => 0 <= start && start <= end && end <= extent,
            Step::Backward => -1 <= end && end <= start && start < extent,
        };
        if !reachable {
            return Err(AutocropError::Sampling(format!(
                "cannot walk {step:?} from {start} to {end} along {line:?} (extent {extent})"
            )));
        }

        let len = (end - start).unsigned_abs() as usize;
        let delta = step.delta();
        // Offsets are in bounds after the check above.
        let offsets = (0..len as i64).map(|i| (start + i * delta) as u32);

        let samples = match (self, line) {
            (Self::Luma(gray), ScanLine::Row(y)) => offsets
                .map(|x| f64::from(gray.get_pixel(x, y).0[0]))
                .collect(),
            (Self::Luma(gray), ScanLine::Column(x)) => offsets
                .map(|y| f64::from(gray.get_pixel(x, y).0[0]))
                .collect(),
            (Self::Blended(image), ScanLine::Row(y)) => offsets
                .map(|x| f64::from(blend(image.get_pixel(x, y))))
                .collect(),
            (Self::Blended(image), ScanLine::Column(x)) => offsets
                .map(|y| f64::from(blend(image.get_pixel(x, y))))
                .collect(),
        };
        Ok(samples)
    }
}

/// Mean of the colour channels, alpha ignored.
fn blend(pixel: Rgba<u8>) -> u8 {
    let Rgba([r, g, b, _]) = pixel;
    ((u16::from(r) + u16::from(g) + u16::from(b)) / 3) as u8
}
