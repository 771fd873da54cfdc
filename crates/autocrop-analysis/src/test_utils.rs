// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic scan fixtures for unit tests.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

/// Black canvas with a white page centred on it, turned by
/// `clockwise_degrees` about the canvas centre (clockwise as displayed, with
/// y pointing down).
pub(crate) fn tilted_page(
    canvas_width: u32,
    canvas_height: u32,
    page_width: u32,
    page_height: u32,
    clockwise_degrees: f64,
) -> DynamicImage {
    let mut canvas = GrayImage::from_pixel(canvas_width, canvas_height, Luma([0u8]));

    let cx = f64::from(canvas_width) / 2.0;
    let cy = f64::from(canvas_height) / 2.0;
    let hw = f64::from(page_width) / 2.0;
    let hh = f64::from(page_height) / 2.0;
    let (sin, cos) = clockwise_degrees.to_radians().sin_cos();

    let corners = [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(dx, dy)| {
        Point::new(
            (cx + dx * cos - dy * sin).round() as i32,
            (cy + dx * sin + dy * cos).round() as i32,
        )
    });
    draw_polygon_mut(&mut canvas, &corners, Luma([255u8]));

    DynamicImage::ImageLuma8(canvas)
}
