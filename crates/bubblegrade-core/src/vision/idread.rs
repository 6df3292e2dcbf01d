//! Student-identifier reading.
//!
//! The ID box is optionally re-rectified (the box has its own printed
//! border, so local skew can be corrected independently of the page), then
//! thresholded and dilated until each handwritten character consolidates
//! into one connected blob. Blobs are filtered by a plausible character
//! size/aspect band, normalized to the classifier input size, classified,
//! and reassembled left to right. A box with no valid blobs yields an
//! empty identifier, not an error.

use anyhow::Result;
use image::{imageops, GrayImage, Luma};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, dilate};
use imageproc::region_labelling::{connected_components, Connectivity};
use imageproc::rect::Rect;
use tracing::debug;

use super::geometry::{find_document_with, rectify, DetectStrategy};
use crate::ports::{CharModel, GLYPH_SIZE};

/// Strategy for re-detecting the ID box border inside its crop.
const BOX_STRATEGY: DetectStrategy = DetectStrategy {
    name: "id-box",
    blur_sigma: 1.0,
    canny_low: 50.0,
    canny_high: 150.0,
    min_area_frac: 0.5,
    max_area_frac: 0.995,
};

/// Tuning for identifier segmentation.
#[derive(Debug, Clone, Copy)]
pub struct IdReadConfig {
    /// Fixed threshold level separating ink from paper in the ID box.
    pub ink_level: u8,
    /// Minimum character blob side, in pixels.
    pub min_size: u32,
    /// Maximum character blob side, in pixels.
    pub max_size: u32,
    /// Minimum width/height ratio of a character blob.
    pub min_aspect: f32,
    /// Maximum width/height ratio of a character blob.
    pub max_aspect: f32,
    /// Margin added around each blob before resizing, in pixels.
    pub margin: u32,
}

impl Default for IdReadConfig {
    fn default() -> Self {
        Self {
            ink_level: 160,
            min_size: 10,
            max_size: 120,
            min_aspect: 0.5,
            max_aspect: 2.0,
            margin: 4,
        }
    }
}

/// Reads the handwritten identifier from the cropped ID box.
pub struct IdentifierReader {
    config: IdReadConfig,
}

impl IdentifierReader {
    /// Creates a reader with the given tuning.
    #[must_use]
    pub const fn new(config: IdReadConfig) -> Self {
        Self { config }
    }

    /// Recognizes the identifier string; empty when no characters are found.
    ///
    /// # Errors
    ///
    /// Returns an error if glyph classification fails.
    pub fn read(&self, id_box: &GrayImage, model: &dyn CharModel) -> Result<String> {
        let boxed = self.rectify_box(id_box);

        let thresh = threshold(&boxed, self.config.ink_level, ThresholdType::BinaryInverted);
        let closed = close(&thresh, Norm::LInf, 1);
        let dilated = dilate(&closed, Norm::LInf, 1);

        let mut glyph_boxes = self.character_boxes(&dilated);
        debug!(glyphs = glyph_boxes.len(), "character blobs segmented");
        if glyph_boxes.is_empty() {
            return Ok(String::new());
        }
        glyph_boxes.sort_by_key(Rect::left);

        let mut identifier = String::with_capacity(glyph_boxes.len());
        for glyph_box in glyph_boxes {
            let glyph = normalize_glyph(&dilated, &glyph_box, self.config.margin);
            identifier.push(model.classify_glyph(&glyph)?);
        }
        Ok(identifier)
    }

    /// Corrects local skew by warping the box's own printed border flat.
    /// Falls back to the crop unchanged when no border is found.
    fn rectify_box(&self, id_box: &GrayImage) -> GrayImage {
        let Some(quad) = find_document_with(id_box, &BOX_STRATEGY) else {
            return id_box.clone();
        };
        let (w, h) = quad.extent();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (w, h) = (w.round() as u32, h.round() as u32);
        if w < 8 || h < 8 {
            return id_box.clone();
        }
        match rectify(id_box, &quad, w, h) {
            Ok(flat) => flat,
            Err(_) => id_box.clone(),
        }
    }

    /// Connected components filtered to plausible character blobs.
    fn character_boxes(&self, dilated: &GrayImage) -> Vec<Rect> {
        let labels = connected_components(dilated, Connectivity::Eight, Luma([0u8]));

        // label -> (min_x, min_y, max_x, max_y)
        let mut bounds: std::collections::HashMap<u32, (u32, u32, u32, u32)> =
            std::collections::HashMap::new();
        for (x, y, pixel) in labels.enumerate_pixels() {
            let label = pixel.0[0];
            if label == 0 {
                continue;
            }
            let entry = bounds.entry(label).or_insert((x, y, x, y));
            entry.0 = entry.0.min(x);
            entry.1 = entry.1.min(y);
            entry.2 = entry.2.max(x);
            entry.3 = entry.3.max(y);
        }

        bounds
            .into_values()
            .filter_map(|(min_x, min_y, max_x, max_y)| {
                let w = max_x - min_x + 1;
                let h = max_y - min_y + 1;
                #[allow(clippy::cast_precision_loss)]
                let aspect = w as f32 / h as f32;
                let plausible = w >= self.config.min_size
                    && w <= self.config.max_size
                    && h >= self.config.min_size
                    && h <= self.config.max_size
                    && aspect >= self.config.min_aspect
                    && aspect <= self.config.max_aspect;
                plausible.then(|| {
                    #[allow(clippy::cast_possible_wrap)]
                    Rect::at(min_x as i32, min_y as i32).of_size(w, h)
                })
            })
            .collect()
    }
}

/// Crops a blob with margin, resizes it to 20x20, and pads it onto the
/// classifier's 28x28 input canvas.
fn normalize_glyph(dilated: &GrayImage, glyph_box: &Rect, margin: u32) -> GrayImage {
    #[allow(clippy::cast_sign_loss)]
    let x = (glyph_box.left() as u32).saturating_sub(margin);
    #[allow(clippy::cast_sign_loss)]
    let y = (glyph_box.top() as u32).saturating_sub(margin);
    let w = (glyph_box.width() + 2 * margin).min(dilated.width() - x);
    let h = (glyph_box.height() + 2 * margin).min(dilated.height() - y);

    let crop = imageops::crop_imm(dilated, x, y, w, h).to_image();
    let inner = GLYPH_SIZE - 8;
    let resized = imageops::resize(&crop, inner, inner, imageops::FilterType::Triangle);

    let mut canvas = GrayImage::new(GLYPH_SIZE, GLYPH_SIZE);
    imageops::overlay(&mut canvas, &resized, 4, 4);
    canvas
}
