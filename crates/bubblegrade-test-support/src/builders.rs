//! Synthetic sheet builders for testing.

use std::collections::BTreeMap;

use bubblegrade_core::{Region, SheetImage, SheetLayout};
use image::{imageops, DynamicImage, GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use qrcode::QrCode;

use crate::font;

/// Paper brightness of the rendered page.
const PAPER: Luma<u8> = Luma([250u8]);
/// Ink brightness of printed and "penciled" marks.
const INK: Luma<u8> = Luma([20u8]);
/// Background behind the page in photo renderings.
const DESK: Luma<u8> = Luma([40u8]);
/// Printed bubble radius in canonical pixels.
const BUBBLE_RADIUS: i32 = 22;
/// Identifier text scale in canonical pixels per font unit.
const ID_SCALE: u32 = 3;

/// Builder for rendering synthetic filled-in quiz sheets.
///
/// Renders a canonical-resolution page with a QR code, an identifier box,
/// and bubble panels, then optionally embeds it in a larger "photo" so the
/// full detection pipeline has a page to find.
pub struct SheetBuilder {
    layout: SheetLayout,
    quiz_id: String,
    student_id: Option<String>,
    marks: BTreeMap<usize, Vec<usize>>,
    omit_qr: bool,
}

impl SheetBuilder {
    /// Creates a builder for the current layout revision.
    #[must_use]
    pub fn new(quiz_id: impl Into<String>) -> Self {
        Self {
            layout: SheetLayout::v1(),
            quiz_id: quiz_id.into(),
            student_id: None,
            marks: BTreeMap::new(),
            omit_qr: false,
        }
    }

    /// Renders against a custom layout.
    #[must_use]
    pub fn with_layout(mut self, layout: SheetLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Writes `student_id` into the identifier box.
    #[must_use]
    pub fn with_student_id(mut self, student_id: impl Into<String>) -> Self {
        self.student_id = Some(student_id.into());
        self
    }

    /// Leaves the QR region blank.
    #[must_use]
    pub fn without_qr(mut self) -> Self {
        self.omit_qr = true;
        self
    }

    /// Fills the given options of `question` (zero-based, sheet-global).
    #[must_use]
    pub fn mark(mut self, question: usize, options: impl IntoIterator<Item = usize>) -> Self {
        self.marks.insert(question, options.into_iter().collect());
        self
    }

    /// Renders the canonical (already rectified) page.
    #[must_use]
    pub fn render(&self) -> GrayImage {
        let mut page = GrayImage::from_pixel(
            self.layout.canonical_width,
            self.layout.canonical_height,
            PAPER,
        );

        if !self.omit_qr {
            self.draw_qr(&mut page);
        }
        self.draw_id_box(&mut page);
        self.draw_panels(&mut page);

        page
    }

    /// Renders the page pasted into a darker photo canvas with `margin`
    /// pixels of desk around it.
    #[must_use]
    pub fn render_photo(&self, margin: u32) -> GrayImage {
        let page = self.render();
        let mut canvas = GrayImage::from_pixel(
            page.width() + 2 * margin,
            page.height() + 2 * margin,
            DESK,
        );
        imageops::overlay(&mut canvas, &page, i64::from(margin), i64::from(margin));
        canvas
    }

    /// Renders a photo and wraps it as a pipeline input.
    #[must_use]
    pub fn to_sheet(&self, margin: u32) -> SheetImage {
        SheetImage::new(
            format!("synthetic://{}", self.quiz_id),
            DynamicImage::ImageLuma8(self.render_photo(margin)),
        )
    }

    fn draw_qr(&self, page: &mut GrayImage) {
        let region = &self.layout.qr_region;
        let code = match QrCode::new(self.quiz_id.as_bytes()) {
            Ok(code) => code,
            Err(e) => panic!("quiz id does not fit a QR code: {e}"),
        };
        let qr: GrayImage = code
            .render::<Luma<u8>>()
            .quiet_zone(true)
            .max_dimensions(region.width, region.height)
            .build();
        imageops::overlay(page, &qr, i64::from(region.x), i64::from(region.y));
    }

    fn draw_id_box(&self, page: &mut GrayImage) {
        let region = &self.layout.id_box;
        draw_border(page, region);

        if let Some(id) = &self.student_id {
            let text_h = font::GLYPH_H * ID_SCALE;
            let y = region.y + region.height.saturating_sub(text_h) / 2;
            font::draw_text(page, id, region.x + 12, y, ID_SCALE, INK);
        }
    }

    fn draw_panels(&self, page: &mut GrayImage) {
        let options = self.layout.options_per_question;
        let mut question_offset = 0usize;

        for panel in &self.layout.panels {
            let region = &panel.region;
            #[allow(clippy::cast_possible_truncation)]
            let row_h = region.height / panel.questions as u32;
            #[allow(clippy::cast_possible_truncation)]
            let pitch = region.width / options as u32;

            for q in 0..panel.questions {
                let marked = self.marks.get(&(question_offset + q));
                for o in 0..options {
                    #[allow(clippy::cast_possible_truncation)]
                    let cx = region.x + o as u32 * pitch + pitch / 2;
                    #[allow(clippy::cast_possible_truncation)]
                    let cy = region.y + q as u32 * row_h + row_h / 2;
                    #[allow(clippy::cast_possible_wrap)]
                    let center = (cx as i32, cy as i32);
                    if marked.is_some_and(|opts| opts.contains(&o)) {
                        draw_filled_circle_mut(page, center, BUBBLE_RADIUS, INK);
                    } else {
                        draw_hollow_circle_mut(page, center, BUBBLE_RADIUS, INK);
                    }
                }
            }
            question_offset += panel.questions;
        }
    }
}

/// Draws a two-pixel printed border along a region's bounds.
fn draw_border(page: &mut GrayImage, region: &Region) {
    #[allow(clippy::cast_possible_wrap)]
    let outer = Rect::at(region.x as i32, region.y as i32).of_size(region.width, region.height);
    #[allow(clippy::cast_possible_wrap)]
    let inner = Rect::at(region.x as i32 + 1, region.y as i32 + 1)
        .of_size(region.width - 2, region.height - 2);
    draw_hollow_rect_mut(page, outer, INK);
    draw_hollow_rect_mut(page, inner, INK);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_matches_canonical_size() {
        let page = SheetBuilder::new("quiz-1").render();
        let layout = SheetLayout::v1();
        assert_eq!(
            page.dimensions(),
            (layout.canonical_width, layout.canonical_height)
        );
    }

    #[test]
    fn test_qr_region_carries_ink() {
        let layout = SheetLayout::v1();
        let with_qr = SheetBuilder::new("quiz-1").render();
        let without = SheetBuilder::new("quiz-1").without_qr().render();

        let ink = |img: &GrayImage| {
            let mut count = 0usize;
            for y in layout.qr_region.y..layout.qr_region.y + layout.qr_region.height {
                for x in layout.qr_region.x..layout.qr_region.x + layout.qr_region.width {
                    if img.get_pixel(x, y).0[0] < 128 {
                        count += 1;
                    }
                }
            }
            count
        };
        assert!(ink(&with_qr) > 100);
        assert_eq!(ink(&without), 0);
    }

    #[test]
    fn test_marked_bubble_darker_than_blank() {
        let layout = SheetLayout::v1();
        let page = SheetBuilder::new("quiz-1").mark(0, [0]).render();
        let region = &layout.panels[0].region;
        #[allow(clippy::cast_possible_truncation)]
        let pitch = region.width / layout.options_per_question as u32;
        #[allow(clippy::cast_possible_truncation)]
        let row_h = region.height / layout.panels[0].questions as u32;

        // Center of question 0 option 0 is filled, option 1 is paper.
        let filled = page.get_pixel(region.x + pitch / 2, region.y + row_h / 2).0[0];
        let blank = page
            .get_pixel(region.x + pitch + pitch / 2, region.y + row_h / 2)
            .0[0];
        assert!(filled < 128);
        assert!(blank > 128);
    }

    #[test]
    fn test_photo_surrounds_page_with_desk() {
        let photo = SheetBuilder::new("quiz-1").render_photo(100);
        let layout = SheetLayout::v1();
        assert_eq!(photo.width(), layout.canonical_width + 200);
        assert_eq!(photo.get_pixel(5, 5).0[0], 40);
        assert_eq!(photo.get_pixel(1100, 200).0[0], 250);
    }
}
