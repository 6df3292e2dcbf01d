//! Mock implementations of core port traits.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use bubblegrade_core::{
    AnswerKey, AnswerKeyStore, CharModel, Notifier, StudentDirectory, StudentRecord,
};
use image::{imageops, GrayImage, Luma};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, dilate};

use crate::font;

/// In-memory answer key store.
pub struct MemoryKeyStore {
    keys: HashMap<String, AnswerKey>,
}

impl MemoryKeyStore {
    /// Creates a store holding the given keys.
    #[must_use]
    pub fn new(keys: impl IntoIterator<Item = AnswerKey>) -> Self {
        Self {
            keys: keys
                .into_iter()
                .map(|k| (k.quiz_id.clone(), k))
                .collect(),
        }
    }

    /// Creates an empty store.
    #[must_use]
    pub fn empty() -> Self {
        Self::new([])
    }
}

impl AnswerKeyStore for MemoryKeyStore {
    fn answer_key(&self, quiz_id: &str) -> Result<Option<AnswerKey>> {
        Ok(self.keys.get(quiz_id).cloned())
    }
}

/// In-memory student directory.
pub struct MemoryStudentDirectory {
    students: Vec<StudentRecord>,
}

impl MemoryStudentDirectory {
    /// Creates a directory holding the given students.
    #[must_use]
    pub fn new(students: Vec<StudentRecord>) -> Self {
        Self { students }
    }

    /// Single-student convenience constructor.
    #[must_use]
    pub fn single(identifier: &str, name: &str, email: &str) -> Self {
        Self::new(vec![StudentRecord {
            identifier: identifier.to_string(),
            name: name.to_string(),
            email: email.to_string(),
        }])
    }
}

impl StudentDirectory for MemoryStudentDirectory {
    fn find_by_identifier(&self, identifier: &str) -> Result<Option<StudentRecord>> {
        Ok(self
            .students
            .iter()
            .find(|s| s.identifier.eq_ignore_ascii_case(identifier))
            .cloned())
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Recipient address.
    pub to: String,
    /// Message subject.
    pub subject: String,
    /// Message body.
    pub body: String,
}

/// Notifier that records every message for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingNotifier {
    /// Creates a notifier with an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured messages.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        Ok(())
    }
}

/// Character classifier that template-matches against the stencil font.
///
/// Templates are rendered through the same binarize/crop/resize steps the
/// identifier reader applies, so glyphs printed by
/// [`crate::SheetBuilder`] classify exactly without any trained weights.
pub struct StencilCharModel {
    templates: Vec<(char, GrayImage)>,
}

impl StencilCharModel {
    /// Builds templates for the full identifier alphabet.
    #[must_use]
    pub fn new() -> Self {
        let templates = font::alphabet()
            .into_iter()
            .map(|c| (c, render_template(c)))
            .collect();
        Self { templates }
    }
}

impl Default for StencilCharModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CharModel for StencilCharModel {
    fn classify_glyph(&self, glyph: &GrayImage) -> Result<char> {
        let best = self
            .templates
            .iter()
            .min_by_key(|(_, template)| pixel_distance(glyph, template));
        match best {
            Some((c, _)) => Ok(*c),
            None => anyhow::bail!("no templates available"),
        }
    }
}

/// Renders one font glyph through the reader's normalization steps.
fn render_template(c: char) -> GrayImage {
    const SCALE: u32 = 3;
    let mut canvas = GrayImage::from_pixel(
        font::GLYPH_W * SCALE + 24,
        font::GLYPH_H * SCALE + 24,
        Luma([250u8]),
    );
    font::draw_char(&mut canvas, c, 12, 12, SCALE, Luma([20u8]));

    let thresh = threshold(&canvas, 160, ThresholdType::BinaryInverted);
    let closed = close(&thresh, Norm::LInf, 1);
    let dilated = dilate(&closed, Norm::LInf, 1);

    let (min_x, min_y, max_x, max_y) = ink_bounds(&dilated);
    let margin = 4u32;
    let x = min_x.saturating_sub(margin);
    let y = min_y.saturating_sub(margin);
    let w = (max_x - min_x + 1 + 2 * margin).min(dilated.width() - x);
    let h = (max_y - min_y + 1 + 2 * margin).min(dilated.height() - y);

    let crop = imageops::crop_imm(&dilated, x, y, w, h).to_image();
    let resized = imageops::resize(&crop, 20, 20, imageops::FilterType::Triangle);
    let mut glyph = GrayImage::new(28, 28);
    imageops::overlay(&mut glyph, &resized, 4, 4);
    glyph
}

fn ink_bounds(img: &GrayImage) -> (u32, u32, u32, u32) {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel.0[0] == 0 {
            continue;
        }
        let b = bounds.get_or_insert((x, y, x, y));
        b.0 = b.0.min(x);
        b.1 = b.1.min(y);
        b.2 = b.2.max(x);
        b.3 = b.3.max(y);
    }
    bounds.unwrap_or((0, 0, 0, 0))
}

fn pixel_distance(a: &GrayImage, b: &GrayImage) -> u64 {
    a.pixels()
        .zip(b.pixels())
        .map(|(pa, pb)| u64::from(pa.0[0].abs_diff(pb.0[0])))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stencil_model_recovers_its_own_templates() {
        let model = StencilCharModel::new();
        for c in ['0', '7', 'A', 'K', 'Z'] {
            let glyph = render_template(c);
            assert_eq!(model.classify_glyph(&glyph).ok(), Some(c));
        }
    }

    #[test]
    fn test_recording_notifier_captures_in_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify("a@example.edu", "s1", "b1").ok();
        notifier.notify("b@example.edu", "s2", "b2").ok();
        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "a@example.edu");
        assert_eq!(sent[1].subject, "s2");
    }

    #[test]
    fn test_memory_key_store_lookup() {
        let key = AnswerKey {
            quiz_id: "quiz-9".to_string(),
            title: "History".to_string(),
            questions: vec![],
        };
        let store = MemoryKeyStore::new([key]);
        assert!(matches!(store.answer_key("quiz-9"), Ok(Some(_))));
        assert!(matches!(store.answer_key("other"), Ok(None)));
    }
}
