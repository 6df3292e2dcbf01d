//! Captured sheet image and detected page geometry.

use image::DynamicImage;

/// One captured photo of a printed sheet.
///
/// Owned by a single grading request and dropped when it completes; nothing
/// in the pipeline caches or shares pixel data across requests.
#[derive(Debug, Clone)]
pub struct SheetImage {
    /// Where the capture came from (path or a synthetic tag).
    pub source: String,
    /// Decoded pixel data.
    pub image: DynamicImage,
}

impl SheetImage {
    /// Wraps a decoded image with its source tag.
    #[must_use]
    pub fn new(source: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            source: source.into(),
            image,
        }
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Four ordered page corners: top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// Top-left corner.
    pub tl: (f32, f32),
    /// Top-right corner.
    pub tr: (f32, f32),
    /// Bottom-right corner.
    pub br: (f32, f32),
    /// Bottom-left corner.
    pub bl: (f32, f32),
}

impl Quad {
    /// Orders four arbitrary corner points into reading order.
    ///
    /// Top-left minimizes x+y, bottom-right maximizes it; top-right
    /// minimizes y-x, bottom-left maximizes it.
    #[must_use]
    pub fn from_unordered(points: [(f32, f32); 4]) -> Self {
        let sum = |p: &(f32, f32)| p.0 + p.1;
        let diff = |p: &(f32, f32)| p.1 - p.0;

        let mut pts = points;
        pts.sort_by(|a, b| sum(a).total_cmp(&sum(b)));
        let tl = pts[0];
        let br = pts[3];

        let mid = [pts[1], pts[2]];
        let (tr, bl) = if diff(&mid[0]) <= diff(&mid[1]) {
            (mid[0], mid[1])
        } else {
            (mid[1], mid[0])
        };

        Self { tl, tr, br, bl }
    }

    /// Signed shoelace area of the quad, in square pixels.
    #[must_use]
    pub fn area(&self) -> f32 {
        let pts = [self.tl, self.tr, self.br, self.bl];
        let mut twice = 0.0;
        for i in 0..4 {
            let (x0, y0) = pts[i];
            let (x1, y1) = pts[(i + 1) % 4];
            twice += x0 * y1 - x1 * y0;
        }
        (twice / 2.0).abs()
    }

    /// Longest-side estimates of the quad's width and height.
    #[must_use]
    pub fn extent(&self) -> (f32, f32) {
        let dist = |a: (f32, f32), b: (f32, f32)| ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
        let width = dist(self.tl, self.tr).max(dist(self.bl, self.br));
        let height = dist(self.tl, self.bl).max(dist(self.tr, self.br));
        (width, height)
    }
}
