//! Page boundary detection and perspective rectification.
//!
//! Grayscale -> Gaussian blur -> Canny -> external contours, sorted by area
//! descending; the first contour whose polygonal approximation has exactly
//! four vertices and whose area falls inside a plausible page band wins.
//! Detection parameters come from an ordered list of named strategies, so a
//! new fallback is a data change rather than a control-flow rewrite.

use anyhow::{anyhow, Result};
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use tracing::debug;

use crate::domain::Quad;

/// One named set of detection parameters.
#[derive(Debug, Clone, Copy)]
pub struct DetectStrategy {
    /// Strategy name, for logs.
    pub name: &'static str,
    /// Gaussian blur sigma applied before edge detection.
    pub blur_sigma: f32,
    /// Canny low threshold.
    pub canny_low: f32,
    /// Canny high threshold.
    pub canny_high: f32,
    /// Minimum accepted page area, as a fraction of the frame.
    pub min_area_frac: f32,
    /// Maximum accepted page area, as a fraction of the frame.
    pub max_area_frac: f32,
}

/// Detection strategies, tried in order until one yields a page boundary.
pub const DETECT_STRATEGIES: &[DetectStrategy] = &[
    DetectStrategy {
        name: "standard",
        blur_sigma: 1.4,
        canny_low: 75.0,
        canny_high: 200.0,
        min_area_frac: 0.25,
        max_area_frac: 0.99,
    },
    DetectStrategy {
        name: "soft-edges",
        blur_sigma: 2.4,
        canny_low: 30.0,
        canny_high: 100.0,
        min_area_frac: 0.40,
        max_area_frac: 0.97,
    },
];

/// Locates the page boundary, trying every strategy in
/// [`DETECT_STRATEGIES`] in order.
#[must_use]
pub fn find_document(gray: &GrayImage) -> Option<Quad> {
    for strategy in DETECT_STRATEGIES {
        if let Some(quad) = find_document_with(gray, strategy) {
            debug!(strategy = strategy.name, "document boundary found");
            return Some(quad);
        }
        debug!(strategy = strategy.name, "strategy found no boundary");
    }
    None
}

/// Runs one detection strategy against a grayscale capture.
#[must_use]
pub fn find_document_with(gray: &GrayImage, strategy: &DetectStrategy) -> Option<Quad> {
    let (w, h) = gray.dimensions();
    if w < 16 || h < 16 {
        return None;
    }

    let blurred = gaussian_blur_f32(gray, strategy.blur_sigma);
    let edges = canny(&blurred, strategy.canny_low, strategy.canny_high);

    let mut contours: Vec<Contour<i32>> = find_contours(&edges)
        .into_iter()
        .filter(|c: &Contour<i32>| c.border_type == BorderType::Outer)
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let frame_area = (w * h) as f64;
    contours.sort_by(|a, b| {
        contour_area(&b.points)
            .partial_cmp(&contour_area(&a.points))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for contour in &contours {
        if contour.points.len() < 4 {
            continue;
        }
        let peri = arc_length(&contour.points, true);
        let approx = approximate_polygon_dp(&contour.points, 0.02 * peri, true);
        if approx.len() != 4 {
            continue;
        }
        let area_frac = contour_area(&approx) / frame_area;
        if area_frac < f64::from(strategy.min_area_frac)
            || area_frac > f64::from(strategy.max_area_frac)
        {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let corners = [
            (approx[0].x as f32, approx[0].y as f32),
            (approx[1].x as f32, approx[1].y as f32),
            (approx[2].x as f32, approx[2].y as f32),
            (approx[3].x as f32, approx[3].y as f32),
        ];
        return Some(Quad::from_unordered(corners));
    }
    None
}

/// Warps the detected quad onto a `width` x `height` canonical rectangle.
///
/// # Errors
///
/// Fails when the quad is degenerate (collinear corners) and no projective
/// mapping exists.
pub fn rectify(gray: &GrayImage, quad: &Quad, width: u32, height: u32) -> Result<GrayImage> {
    #[allow(clippy::cast_precision_loss)]
    let to = [
        (0.0, 0.0),
        ((width - 1) as f32, 0.0),
        ((width - 1) as f32, (height - 1) as f32),
        (0.0, (height - 1) as f32),
    ];
    let from = [quad.tl, quad.tr, quad.br, quad.bl];
    let projection = Projection::from_control_points(from, to)
        .ok_or_else(|| anyhow!("page quad is degenerate, no perspective mapping exists"))?;

    let mut out = GrayImage::new(width, height);
    warp_into(
        gray,
        &projection,
        Interpolation::Bilinear,
        Luma([255]),
        &mut out,
    );
    Ok(out)
}

/// Shoelace area of a closed contour.
fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for i in 0..points.len() {
        let p0 = points[i];
        let p1 = points[(i + 1) % points.len()];
        twice += i64::from(p0.x) * i64::from(p1.y) - i64::from(p1.x) * i64::from(p0.y);
    }
    #[allow(clippy::cast_precision_loss)]
    let area = (twice as f64 / 2.0).abs();
    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_polygon_mut;

    fn staged_page(canvas_w: u32, canvas_h: u32, corners: [(i32, i32); 4]) -> GrayImage {
        let mut img = GrayImage::from_pixel(canvas_w, canvas_h, Luma([25u8]));
        let poly: Vec<Point<i32>> = corners.iter().map(|&(x, y)| Point::new(x, y)).collect();
        draw_polygon_mut(&mut img, &poly, Luma([235u8]));
        img
    }

    #[test]
    fn test_detects_axis_aligned_page() {
        let img = staged_page(800, 1000, [(100, 100), (700, 100), (700, 900), (100, 900)]);
        let quad = find_document(&img).expect("page should be detected");
        assert!((quad.tl.0 - 100.0).abs() < 6.0, "tl.x = {}", quad.tl.0);
        assert!((quad.br.1 - 900.0).abs() < 6.0, "br.y = {}", quad.br.1);
    }

    #[test]
    fn test_detects_skewed_page() {
        let img = staged_page(800, 1000, [(140, 90), (720, 140), (680, 920), (90, 860)]);
        let quad = find_document(&img).expect("skewed page should be detected");
        let (w, h) = quad.extent();
        assert!(w > 500.0 && h > 700.0);
    }

    #[test]
    fn test_no_document_in_flat_image() {
        let img = GrayImage::from_pixel(400, 400, Luma([128u8]));
        assert!(find_document(&img).is_none());
    }

    #[test]
    fn test_small_contour_rejected_by_area_band() {
        // A tiny card occupying ~1% of the frame is not a page.
        let img = staged_page(800, 1000, [(390, 490), (470, 490), (470, 570), (390, 570)]);
        assert!(find_document(&img).is_none());
    }

    #[test]
    fn test_rectified_aspect_matches_canonical() {
        // Page staged with the canonical A4 aspect; after rectification the
        // output must have exactly the requested canonical dimensions and
        // preserve bright page content.
        let img = staged_page(1600, 2000, [(200, 150), (1400, 190), (1370, 1870), (170, 1820)]);
        let quad = find_document(&img).expect("page detected");
        let rect = rectify(&img, &quad, 620, 877).expect("projective mapping exists");
        assert_eq!(rect.dimensions(), (620, 877));
        // Center of the rectified page is paper, not canvas background.
        assert!(rect.get_pixel(310, 438).0[0] > 200);
    }

    #[test]
    fn test_rectify_rejects_degenerate_quad() {
        let img = GrayImage::new(100, 100);
        let quad = Quad {
            tl: (0.0, 0.0),
            tr: (50.0, 0.0),
            br: (100.0, 0.0),
            bl: (25.0, 0.0),
        };
        assert!(rectify(&img, &quad, 64, 64).is_err());
    }

    #[test]
    fn test_detection_is_pure() {
        let img = staged_page(800, 1000, [(100, 100), (700, 100), (700, 900), (100, 900)]);
        let a = find_document(&img).expect("first run");
        let b = find_document(&img).expect("second run");
        assert_eq!(a, b);
    }
}
