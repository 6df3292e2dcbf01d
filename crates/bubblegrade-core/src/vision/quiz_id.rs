//! Quiz identification from the printed QR code.
//!
//! Decoding a photographed, tilted or unevenly lit QR code is unreliable, so
//! the scan is retried up to a fixed budget per image representation. The
//! scan itself is a pure function of the pixel data and safe to repeat.

use image::{imageops, GrayImage};
use tracing::debug;

/// Retry budget for QR decoding.
#[derive(Debug, Clone, Copy)]
pub struct QuizIdConfig {
    /// Maximum decode attempts per image representation.
    pub max_attempts: usize,
}

impl Default for QuizIdConfig {
    fn default() -> Self {
        Self { max_attempts: 10 }
    }
}

/// Attempts to decode the quiz id from a rectified page.
///
/// Tries the full page at native scale, then a 2x upscale of the layout's
/// QR crop (small or low-resolution QR modules often only decode after
/// upscaling). Each representation gets at most `config.max_attempts`
/// scans; the routine always terminates.
#[must_use]
pub fn decode_quiz_id(
    gray: &GrayImage,
    qr_crop: &GrayImage,
    config: &QuizIdConfig,
) -> Option<String> {
    if let Some(id) = decode_frame(gray, config) {
        return Some(id);
    }

    let upscaled = imageops::resize(
        qr_crop,
        qr_crop.width() * 2,
        qr_crop.height() * 2,
        imageops::FilterType::Triangle,
    );
    decode_with(&upscaled, config, scan_once)
}

/// Bounded decode of a single representation at native scale.
#[must_use]
pub fn decode_frame(gray: &GrayImage, config: &QuizIdConfig) -> Option<String> {
    decode_with(gray, config, scan_once)
}

/// Runs the bounded retry loop with a caller-supplied scan function.
///
/// Exposed for tests that need to count attempts.
pub fn decode_with<F>(gray: &GrayImage, config: &QuizIdConfig, mut scan: F) -> Option<String>
where
    F: FnMut(&GrayImage) -> Option<String>,
{
    for attempt in 1..=config.max_attempts {
        if let Some(content) = scan(gray) {
            debug!(attempt, "quiz QR decoded");
            return Some(content);
        }
    }
    None
}

/// One rqrr scan over the whole image; returns the first decodable grid.
fn scan_once(gray: &GrayImage) -> Option<String> {
    let mut prepared = rqrr::PreparedImage::prepare(gray.clone());
    prepared
        .detect_grids()
        .into_iter()
        .find_map(|grid| grid.decode().ok().map(|(_, content)| content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_bound_is_exact() {
        let config = QuizIdConfig { max_attempts: 10 };
        let gray = GrayImage::new(32, 32);
        let mut attempts = 0usize;
        let result = decode_with(&gray, &config, |_| {
            attempts += 1;
            None
        });
        assert!(result.is_none());
        assert_eq!(attempts, 10);
    }

    #[test]
    fn test_stops_on_first_success() {
        let config = QuizIdConfig { max_attempts: 10 };
        let gray = GrayImage::new(32, 32);
        let mut attempts = 0usize;
        let result = decode_with(&gray, &config, |_| {
            attempts += 1;
            (attempts == 3).then(|| "quiz-7".to_string())
        });
        assert_eq!(result.as_deref(), Some("quiz-7"));
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_blank_image_never_decodes_and_terminates() {
        let gray = GrayImage::from_pixel(200, 200, image::Luma([255u8]));
        let crop = GrayImage::from_pixel(64, 64, image::Luma([255u8]));
        let config = QuizIdConfig { max_attempts: 3 };
        assert!(decode_quiz_id(&gray, &crop, &config).is_none());
        assert!(decode_frame(&gray, &config).is_none());
    }
}
