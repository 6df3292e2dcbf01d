//! Glyph classification seam.

use image::GrayImage;

/// Side length of the classifier input, in pixels.
pub const GLYPH_SIZE: u32 = 28;

/// Port for classifying one segmented, normalized glyph image.
///
/// The production implementation is the candle CNN in
/// [`crate::inference::GlyphCnn`]; tests substitute a deterministic
/// template matcher. Implementations must be safe for concurrent read-only
/// use: the model is loaded once per process and never mutated.
pub trait CharModel: Send + Sync {
    /// Classifies a 28x28 grayscale glyph (ink bright on dark).
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the input has the wrong size.
    fn classify_glyph(&self, glyph: &GrayImage) -> anyhow::Result<char>;
}
