//! Layout-driven region extraction.
//!
//! The extractor trusts the print geometry the sheet was generated with
//! instead of re-detecting panels heuristically: each region from the
//! [`SheetLayout`] is cropped with a small jitter buffer to absorb
//! print/scan misalignment. One extractor covers single- and multi-panel
//! sheets; the layout's panel list is already in left-to-right order.

use image::{imageops, GrayImage};

use crate::domain::{Region, SheetLayout};

/// Crops bubble panels and the student-ID box from a rectified page.
pub struct RegionExtractor<'a> {
    layout: &'a SheetLayout,
}

impl<'a> RegionExtractor<'a> {
    /// Creates an extractor for one layout revision.
    #[must_use]
    pub const fn new(layout: &'a SheetLayout) -> Self {
        Self { layout }
    }

    /// Returns each bubble panel and its question count, left to right.
    #[must_use]
    pub fn bubble_panels(&self, rectified: &GrayImage) -> Vec<(GrayImage, usize)> {
        self.layout
            .panels
            .iter()
            .map(|panel| (self.crop(rectified, &panel.region), panel.questions))
            .collect()
    }

    /// Returns the student-ID box.
    #[must_use]
    pub fn id_box(&self, rectified: &GrayImage) -> GrayImage {
        self.crop(rectified, &self.layout.id_box)
    }

    /// Returns the QR code region.
    #[must_use]
    pub fn qr_region(&self, rectified: &GrayImage) -> GrayImage {
        self.crop(rectified, &self.layout.qr_region)
    }

    fn crop(&self, rectified: &GrayImage, region: &Region) -> GrayImage {
        let padded = region.padded(
            self.layout.jitter_px,
            rectified.width(),
            rectified.height(),
        );
        imageops::crop_imm(rectified, padded.x, padded.y, padded.width, padded.height).to_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PanelRegion, SheetLayout};
    use image::Luma;

    fn two_panel_layout() -> SheetLayout {
        let mut layout = SheetLayout::v1();
        layout.panels = vec![
            PanelRegion {
                region: Region {
                    x: 50,
                    y: 500,
                    width: 400,
                    height: 1000,
                },
                questions: 10,
            },
            PanelRegion {
                region: Region {
                    x: 700,
                    y: 500,
                    width: 400,
                    height: 1000,
                },
                questions: 10,
            },
        ];
        layout
    }

    #[test]
    fn test_panels_come_back_in_layout_order() {
        let layout = two_panel_layout();
        // Left half dark, right half bright, so the panels are tellable apart.
        let page = GrayImage::from_fn(1240, 1754, |x, _| {
            if x < 620 {
                Luma([40u8])
            } else {
                Luma([220u8])
            }
        });
        let panels = RegionExtractor::new(&layout).bubble_panels(&page);
        assert_eq!(panels.len(), 2);
        assert!(panels[0].0.get_pixel(100, 100).0[0] < 100, "left panel first");
        assert!(panels[1].0.get_pixel(100, 100).0[0] > 100, "right panel second");
        assert_eq!(panels[0].1, 10);
    }

    #[test]
    fn test_crops_include_jitter_buffer() {
        let layout = SheetLayout::v1();
        let page = GrayImage::new(layout.canonical_width, layout.canonical_height);
        let id_box = RegionExtractor::new(&layout).id_box(&page);
        assert_eq!(
            id_box.width(),
            layout.id_box.width + 2 * layout.jitter_px
        );
        assert_eq!(
            id_box.height(),
            layout.id_box.height + 2 * layout.jitter_px
        );
    }

    #[test]
    fn test_crop_clamped_at_page_edge() {
        let mut layout = SheetLayout::v1();
        layout.qr_region = Region {
            x: 0,
            y: 0,
            width: 100,
            height: 100,
        };
        let page = GrayImage::new(layout.canonical_width, layout.canonical_height);
        let qr = RegionExtractor::new(&layout).qr_region(&page);
        // Buffer cannot extend past the top-left corner.
        assert_eq!(qr.width(), 100 + layout.jitter_px);
        assert_eq!(qr.height(), 100 + layout.jitter_px);
    }
}
