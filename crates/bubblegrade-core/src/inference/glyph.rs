//! Glyph classifier for the handwritten student identifier.
//!
//! A small CNN over 28x28 grayscale glyph crops with a 36-way output:
//! digits 0-9 followed by letters A-Z in a contiguous label space.

// Common ML casting patterns.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder};
use image::GrayImage;

use crate::ports::{CharModel, GLYPH_SIZE};

/// Size of the label space: 10 digits + 26 letters.
pub const NUM_CLASSES: usize = 36;

/// Maps a class index to its character.
///
/// # Panics
///
/// Panics if `label >= NUM_CLASSES`; callers clamp via argmax over the
/// model's 36 logits.
#[must_use]
pub fn label_to_char(label: usize) -> char {
    assert!(label < NUM_CLASSES, "glyph label out of range: {label}");
    if label < 10 {
        char::from(b'0' + label as u8)
    } else {
        char::from(b'A' + (label - 10) as u8)
    }
}

/// Convolutional glyph classifier.
///
/// Architecture: two conv layers (3x3, pad 1) with ReLU + 2x2 max pooling,
/// then two fully connected layers.
/// Input: `(1, 1, 28, 28)` normalized to `[0, 1]`. Output: 36 logits.
pub struct GlyphCnn {
    conv1: Conv2d,
    conv2: Conv2d,
    fc1: Linear,
    fc2: Linear,
    device: Device,
}

impl GlyphCnn {
    /// Builds the classifier from loaded weights.
    ///
    /// # Errors
    ///
    /// Returns an error if the weight tensors are missing or mis-shaped.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let device = vb.device().clone();

        let conv1 = conv2d(
            1,
            32,
            3,
            Conv2dConfig {
                padding: 1,
                ..Conv2dConfig::default()
            },
            vb.pp("conv1"),
        )?;
        let conv2 = conv2d(
            32,
            64,
            3,
            Conv2dConfig {
                padding: 1,
                ..Conv2dConfig::default()
            },
            vb.pp("conv2"),
        )?;

        // After two 2x2 max pools: 28 -> 14 -> 7. Flattened: 64 * 7 * 7.
        let fc1 = linear(3136, 128, vb.pp("fc1"))?;
        let fc2 = linear(128, NUM_CLASSES, vb.pp("fc2"))?;

        Ok(Self {
            conv1,
            conv2,
            fc1,
            fc2,
            device,
        })
    }

    /// Converts a 28x28 glyph crop to a normalized input tensor.
    ///
    /// # Errors
    ///
    /// Returns an error if the crop has the wrong dimensions.
    pub fn preprocess(&self, glyph: &GrayImage) -> Result<Tensor> {
        anyhow::ensure!(
            glyph.dimensions() == (GLYPH_SIZE, GLYPH_SIZE),
            "glyph crop must be {GLYPH_SIZE}x{GLYPH_SIZE}, got {}x{}",
            glyph.width(),
            glyph.height()
        );
        let data: Vec<f32> = glyph.pixels().map(|p| f32::from(p[0]) / 255.0).collect();
        Tensor::from_vec(
            data,
            (1, 1, GLYPH_SIZE as usize, GLYPH_SIZE as usize),
            &self.device,
        )
        .context("failed to create glyph tensor")
    }
}

impl Module for GlyphCnn {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let x = self.conv1.forward(x)?;
        let x = x.relu()?;
        let x = x.max_pool2d(2)?;

        let x = self.conv2.forward(&x)?;
        let x = x.relu()?;
        let x = x.max_pool2d(2)?;

        let x = x.flatten_from(1)?;
        let x = self.fc1.forward(&x)?;
        let x = x.relu()?;
        self.fc2.forward(&x)
    }
}

impl CharModel for GlyphCnn {
    fn classify_glyph(&self, glyph: &GrayImage) -> Result<char> {
        let input = self.preprocess(glyph)?;
        let logits = self.forward(&input).context("glyph inference failed")?;
        let label = logits
            .squeeze(0)?
            .argmax(0)?
            .to_scalar::<u32>()
            .context("glyph argmax failed")?;
        Ok(label_to_char(label as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_space_covers_digits_then_letters() {
        assert_eq!(label_to_char(0), '0');
        assert_eq!(label_to_char(9), '9');
        assert_eq!(label_to_char(10), 'A');
        assert_eq!(label_to_char(35), 'Z');
    }

    #[test]
    #[should_panic(expected = "glyph label out of range")]
    fn test_label_out_of_range_panics() {
        let _ = label_to_char(36);
    }

    #[test]
    fn test_pool_arithmetic_matches_fc_input() {
        // 28 -> 14 -> 7 after two pools; fc1 expects 64 * 7 * 7.
        assert_eq!(GLYPH_SIZE / 2 / 2, 7);
        assert_eq!(64 * 7 * 7, 3136);
    }
}
