// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page analysis: samples every side of the image in parallel, estimates each
// side independently, and composes the four estimates into one `Transform`.

use std::path::Path;

use autocrop_core::config::{AnalysisConfig, AngleAggregation, MIN_STABLE_SAMPLES};
use autocrop_core::error::{AutocropError, Result};
use autocrop_core::types::{CropRect, MIN_IMAGE_DIMENSION, SCAN_WINDOW_DIVISOR, Side, Transform};
use image::DynamicImage;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::edge::EdgeDetector;
use super::side::{FitQuality, SideEstimate, estimate_side};
use crate::image::source::{PixelSource, ScanLine, Step};
use crate::signal::clean::mean;

/// Estimates how a scanned page is tilted and where its black border ends.
///
/// The analysis looks in from each image edge for the page border, taking
/// `samples_per_side` scan lines per side. Each scan line covers the outer
/// sixteenth of the image and is searched for the first strong rising edge
/// (black background to white page). The offsets found along one side are
/// cleaned of outliers and fitted with a straight line: its slope gives the
/// tilt, its value at the middle of the side gives the crop offset.
///
/// A page with a lot of black near its own edges will confuse the analysis.
/// Check the per-side confidences; below roughly 0.5 manual review is
/// advised.
///
/// ```ignore
/// let analysis = Analyzer::new(AnalysisConfig::default())?.run_file("page.png")?;
/// println!("convert page.png {} _page.png", analysis.transform);
/// ```
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
    detector: EdgeDetector,
}

/// Full result of one page analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageAnalysis {
    pub transform: Transform,
    /// Per-side estimates in top/right/bottom/left order.
    pub sides: [SideEstimate; 4],
}

impl PageAnalysis {
    pub fn side(&self, side: Side) -> &SideEstimate {
        &self.sides[side.index()]
    }

    /// Sides whose fit fell below the configured minimum confidence.
    pub fn low_confidence_sides(&self) -> Vec<Side> {
        self.sides
            .iter()
            .filter(|estimate| estimate.quality == FitQuality::LowConfidence)
            .map(|estimate| estimate.side)
            .collect()
    }
}

impl Analyzer {
    // -- Construction ---------------------------------------------------------

    /// Validate `config` and build an analyzer from it.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        if !config.has_stable_confidence() {
            warn!(
                samples_per_side = config.samples_per_side,
                "Fewer than {MIN_STABLE_SAMPLES} samples per side; confidence values will be unstable"
            );
        }
        let detector = EdgeDetector::new(config.threshold, config.cutoff_frequency);
        Ok(Self { config, detector })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    // -- Entry points ---------------------------------------------------------

    /// Decode an image file (PNG, JPEG, TIFF, etc.) and analyse it.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<PageAnalysis> {
        let image = image::open(path.as_ref()).map_err(|err| {
            AutocropError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(
            width = image.width(),
            height = image.height(),
            "Image loaded"
        );
        self.run(&image)
    }

    /// Decode raw encoded bytes and analyse the image.
    #[instrument(skip(self, data), fields(data_len = data.len()))]
    pub fn run_bytes(&self, data: &[u8]) -> Result<PageAnalysis> {
        let image = image::load_from_memory(data).map_err(|err| {
            AutocropError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = image.width(),
            height = image.height(),
            "Image decoded from bytes"
        );
        self.run(&image)
    }

    /// Analyse an already-decoded image.
    #[instrument(
        skip_all,
        fields(
            width = image.width(),
            height = image.height(),
            samples = self.config.samples_per_side
        )
    )]
    pub fn run(&self, image: &DynamicImage) -> Result<PageAnalysis> {
        let source = PixelSource::new(image);
        let (width, height) = source.dimensions();
        if width < MIN_IMAGE_DIMENSION || height < MIN_IMAGE_DIMENSION {
            return Err(AutocropError::ImageTooSmall { width, height });
        }

        let n = self.config.samples_per_side;
        let mut top = vec![0.0; n];
        let mut right = vec![0.0; n];
        let mut bottom = vec![0.0; n];
        let mut left = vec![0.0; n];

        // One task per sample index; each writes only its own slot of the four
        // sequences.
        top.par_iter_mut()
            .zip(right.par_iter_mut())
            .zip(bottom.par_iter_mut())
            .zip(left.par_iter_mut())
            .enumerate()
            .try_for_each(|(i, (((top, right), bottom), left))| -> Result<()> {
                let [t, r, b, l] = self.probe(&source, i)?;
                *top = t;
                *right = r;
                *bottom = b;
                *left = l;
                Ok(())
            })?;

        let estimate = |side: Side, edges: &[f64]| {
            let span = if side.runs_along_width() { width } else { height };
            estimate_side(side, edges, span, &self.config)
        };
        let sides = [
            estimate(Side::Top, &top)?,
            estimate(Side::Right, &right)?,
            estimate(Side::Bottom, &bottom)?,
            estimate(Side::Left, &left)?,
        ];

        let transform = self.compose(&sides, width, height);
        Ok(PageAnalysis { transform, sides })
    }

    // -- Internals ------------------------------------------------------------

    /// Border offsets on the scan lines of sample `i`, in top/right/bottom/left
    /// order. Top and bottom share column `i * width / n`; left and right share
    /// row `i * height / n`.
    fn probe(&self, source: &PixelSource<'_>, i: usize) -> Result<[f64; 4]> {
        let n = self.config.samples_per_side;
        let (width, height) = source.dimensions();
        let column = ScanLine::Column((i * width as usize / n) as u32);
        let row = ScanLine::Row((i * height as usize / n) as u32);

        let reach_x = i64::from(width / SCAN_WINDOW_DIVISOR);
        let reach_y = i64::from(height / SCAN_WINDOW_DIVISOR);
        let last_x = i64::from(width) - 1;
        let last_y = i64::from(height) - 1;

        let top = source.sample(column, 0, reach_y, Step::Forward)?;
        let right = source.sample(row, last_x, last_x - reach_x, Step::Backward)?;
        let bottom = source.sample(column, last_y, last_y - reach_y, Step::Backward)?;
        let left = source.sample(row, 0, reach_x, Step::Forward)?;

        Ok([top, right, bottom, left].map(|samples| {
            self.detector
                .search(&samples)
                .map_or(0.0, |offset| offset as f64)
        }))
    }

    fn compose(&self, sides: &[SideEstimate; 4], width: u32, height: u32) -> Transform {
        let [top, right, bottom, left] = sides;
        let bounds = CropRect::new(
            left.offset,
            top.offset,
            i64::from(width) - right.offset,
            i64::from(height) - bottom.offset,
        );
        let transform = Transform {
            angle: combine_angles(sides, self.config.aggregation),
            bounds,
            confidence: std::array::from_fn(|i| sides[i].confidence()),
        };

        let weak = transform.low_confidence_sides(self.config.min_confidence);
        if !weak.is_empty() {
            warn!(
                sides = ?weak,
                min_confidence = self.config.min_confidence,
                "Low-confidence border fit; manual review advised"
            );
        }
        if bounds.is_inverted() {
            warn!(?bounds, "Crop rectangle is inverted");
        }
        info!(
            angle_deg = transform.degrees(),
            ?bounds,
            confidence = ?transform.confidence,
            "Transform computed"
        );

        transform
    }
}

/// Combine the four side angles into one rotation.
fn combine_angles(sides: &[SideEstimate; 4], aggregation: AngleAggregation) -> f64 {
    let angles: [f64; 4] = std::array::from_fn(|i| sides[i].angle);
    match aggregation {
        AngleAggregation::Mean => mean(&angles),
        AngleAggregation::ConfidenceWeighted => {
            let total: f64 = sides.iter().map(SideEstimate::confidence).sum();
            if total > 0.0 {
                sides
                    .iter()
                    .map(|side| side.angle * side.confidence())
                    .sum::<f64>()
                    / total
            } else {
                mean(&angles)
            }
        }
    }
}

/// Analyse `image` with default tuning and the three caller-facing knobs.
///
/// `threshold` is the rising-edge derivative threshold, `cutoff_frequency` the
/// denoising cutoff in cycles/sample, `samples_per_side` the number of scan
/// lines per side (must be at least 1).
pub fn analyze(
    image: &DynamicImage,
    threshold: f64,
    cutoff_frequency: f64,
    samples_per_side: usize,
) -> Result<Transform> {
    let config = AnalysisConfig::new(threshold, cutoff_frequency, samples_per_side);
    Ok(Analyzer::new(config)?.run(image)?.transform)
}

/// Load an image file and analyse it.
pub fn analyze_file(path: impl AsRef<Path>, config: &AnalysisConfig) -> Result<Transform> {
    Ok(Analyzer::new(config.clone())?.run_file(path)?.transform)
}

/// Decode an encoded image and analyse it.
pub fn analyze_bytes(data: &[u8], config: &AnalysisConfig) -> Result<Transform> {
    Ok(Analyzer::new(config.clone())?.run_bytes(data)?.transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::regression::LineFit;
    use crate::test_utils::tilted_page;
    use autocrop_core::error::Degeneracy;
    use image::{GrayImage, ImageFormat, Luma};

    const CANVAS: u32 = 1142;
    const PAGE: u32 = 1060;

    fn offsets(transform: &Transform) -> [i64; 4] {
        let b = transform.bounds;
        [
            b.min_y,
            i64::from(CANVAS) - b.max_x,
            i64::from(CANVAS) - b.max_y,
            b.min_x,
        ]
    }

    #[test]
    fn recovers_counter_clockwise_tilt() {
        let image = tilted_page(CANVAS, CANVAS, PAGE, PAGE, -2.0);
        let transform = analyze(&image, 12.0, 0.1, 50).unwrap();

        assert!(
            (transform.degrees() - 2.0).abs() < 0.5,
            "angle {}",
            transform.degrees()
        );
        for (side, confidence) in Side::ALL.iter().zip(transform.confidence) {
            assert!(confidence > 0.8, "{side} confidence {confidence}");
        }
        // The rotated page's mid-side borders sit about 41 px in, plus filter lag.
        for offset in offsets(&transform) {
            assert!((36..=50).contains(&offset), "{transform:?}");
        }
        assert!(!transform.bounds.is_inverted());
    }

    #[test]
    fn recovers_clockwise_tilt() {
        let image = tilted_page(CANVAS, CANVAS, PAGE, PAGE, 1.5);
        let transform = analyze(&image, 12.0, 0.1, 50).unwrap();

        assert!(
            (transform.degrees() + 1.5).abs() < 0.5,
            "angle {}",
            transform.degrees()
        );
        assert!(transform.min_confidence() > 0.8, "{transform:?}");
    }

    #[test]
    fn straight_page_crops_to_its_border() {
        // Page covers columns 20..=620 and rows 30..=770.
        let image = tilted_page(640, 800, 600, 740, 0.0);
        let analyzer = Analyzer::new(AnalysisConfig::new(12.0, 0.1, 40)).unwrap();
        let analysis = analyzer.run(&image).unwrap();
        let transform = analysis.transform;

        assert!(transform.degrees().abs() < 0.5, "{transform:?}");
        let b = transform.bounds;
        assert!((b.min_x - 20).abs() <= 3, "{b:?}");
        assert!((b.min_y - 30).abs() <= 3, "{b:?}");
        assert!((b.max_x - 620).abs() <= 3, "{b:?}");
        assert!((b.max_y - 770).abs() <= 3, "{b:?}");

        // Far edges are the image dimension minus the far side's offset.
        assert_eq!(b.max_x, 640 - analysis.side(Side::Right).offset);
        assert_eq!(b.max_y, 800 - analysis.side(Side::Bottom).offset);
    }

    #[test]
    fn far_side_scans_count_from_the_last_pixel() {
        // 20 black columns on the left, 19 on the right (621..=639); 30 black
        // rows on top, 29 at the bottom (771..=799).
        let image = tilted_page(640, 800, 600, 740, 0.0);
        let analyzer = Analyzer::new(AnalysisConfig::new(12.0, 0.1, 40)).unwrap();
        let source = PixelSource::new(&image);

        // Sample 20 scans column 320 and row 400, both well inside the page.
        let [top, right, bottom, left] = analyzer.probe(&source, 20).unwrap();
        assert!(top > 0.0 && left > 0.0);
        assert_eq!(right, left - 1.0);
        assert_eq!(bottom, top - 1.0);
    }

    #[test]
    fn zero_samples_is_rejected() {
        let image = tilted_page(256, 256, 200, 200, 0.0);
        let err = analyze(&image, 12.0, 0.1, 0).unwrap_err();
        assert!(matches!(err, AutocropError::InvalidConfig(_)), "{err}");
    }

    #[test]
    fn tiny_image_is_rejected() {
        let image = DynamicImage::ImageLuma8(GrayImage::new(31, 400));
        let err = analyze(&image, 12.0, 0.1, 10).unwrap_err();
        assert!(matches!(
            err,
            AutocropError::ImageTooSmall {
                width: 31,
                height: 400
            }
        ));
    }

    #[test]
    fn blank_scan_reports_degenerate_side() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(320, 320, Luma([0u8])));
        let err = analyze(&image, 12.0, 0.1, 32).unwrap_err();
        assert!(matches!(
            err,
            AutocropError::DegenerateSide {
                side: Side::Top,
                reason: Degeneracy::TooFewSamples { usable: 0 }
            }
        ));
    }

    #[test]
    fn colour_scan_matches_grayscale_scan() {
        let gray = tilted_page(CANVAS, CANVAS, PAGE, PAGE, -2.0);
        let colour = DynamicImage::ImageRgb8(gray.to_rgb8());

        let from_gray = analyze(&gray, 12.0, 0.1, 50).unwrap();
        let from_colour = analyze(&colour, 12.0, 0.1, 50).unwrap();
        assert_eq!(from_gray, from_colour);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let image = tilted_page(CANVAS, CANVAS, PAGE, PAGE, 1.0);
        let analyzer = Analyzer::new(AnalysisConfig::new(12.0, 0.1, 120)).unwrap();
        let first = analyzer.run(&image).unwrap();
        let second = analyzer.run(&image).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn page_analysis_exposes_side_details() {
        let image = tilted_page(CANVAS, CANVAS, PAGE, PAGE, -2.0);
        let analysis = Analyzer::new(AnalysisConfig::new(12.0, 0.1, 50))
            .unwrap()
            .run(&image)
            .unwrap();

        for side in Side::ALL {
            let estimate = analysis.side(side);
            assert_eq!(estimate.side, side);
            assert_eq!(estimate.confidence(), analysis.transform.confidence_for(side));
            assert!(estimate.detected > 40, "{estimate:?}");
            assert!(!estimate.window.is_empty());
        }
        assert!(analysis.low_confidence_sides().is_empty());
    }

    #[test]
    fn weighted_aggregation_agrees_on_clean_page() {
        let image = tilted_page(CANVAS, CANVAS, PAGE, PAGE, -2.0);
        let mut config = AnalysisConfig::new(12.0, 0.1, 50);
        let plain = Analyzer::new(config.clone()).unwrap().run(&image).unwrap();
        config.aggregation = AngleAggregation::ConfidenceWeighted;
        let weighted = Analyzer::new(config).unwrap().run(&image).unwrap();

        assert!((plain.transform.degrees() - weighted.transform.degrees()).abs() < 0.1);
        assert_eq!(plain.transform.bounds, weighted.transform.bounds);
    }

    fn estimate(side: Side, angle: f64, r_squared: f64) -> SideEstimate {
        SideEstimate {
            side,
            angle,
            offset: 0,
            fit: LineFit {
                intercept: 0.0,
                slope: 0.0,
                r_squared,
                samples: 10,
            },
            quality: FitQuality::Confident,
            detected: 10,
            window: 0..10,
        }
    }

    #[test]
    fn weighting_discounts_unreliable_sides() {
        let sides = [
            estimate(Side::Top, 0.02, 1.0),
            estimate(Side::Right, 0.02, 1.0),
            estimate(Side::Bottom, 0.02, 1.0),
            estimate(Side::Left, 0.30, 0.0),
        ];
        let plain = combine_angles(&sides, AngleAggregation::Mean);
        let weighted = combine_angles(&sides, AngleAggregation::ConfidenceWeighted);

        assert!((plain - 0.09).abs() < 1e-12);
        assert!((weighted - 0.02).abs() < 1e-12);
    }

    #[test]
    fn weighting_falls_back_to_mean_without_confidence() {
        let sides = [
            estimate(Side::Top, 0.1, 0.0),
            estimate(Side::Right, 0.2, 0.0),
            estimate(Side::Bottom, 0.3, 0.0),
            estimate(Side::Left, 0.4, 0.0),
        ];
        let weighted = combine_angles(&sides, AngleAggregation::ConfidenceWeighted);
        assert!((weighted - 0.25).abs() < 1e-12);
    }

    #[test]
    fn file_and_bytes_entry_points_match_in_memory_analysis() {
        let image = tilted_page(CANVAS, CANVAS, PAGE, PAGE, -2.0);
        let config = AnalysisConfig::new(12.0, 0.1, 50);
        let expected = analyze(&image, 12.0, 0.1, 50).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        image.save_with_format(&path, ImageFormat::Png).unwrap();
        assert_eq!(analyze_file(&path, &config).unwrap(), expected);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(analyze_bytes(&bytes, &config).unwrap(), expected);
    }

    #[test]
    fn undecodable_input_is_an_image_error() {
        let config = AnalysisConfig::default();
        let err = analyze_bytes(b"definitely not a png", &config).unwrap_err();
        assert!(matches!(err, AutocropError::ImageError(_)));

        let err = analyze_file("/nonexistent/page.png", &config).unwrap_err();
        assert!(matches!(err, AutocropError::ImageError(_)));
    }
}
