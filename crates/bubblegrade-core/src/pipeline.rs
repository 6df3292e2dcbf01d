//! One-request grading pipeline.
//!
//! Runs the full sequence synchronously for a single captured sheet:
//! geometry normalization, quiz identification, region extraction, fill
//! detection, scoring, identifier reading, and best-effort notification.
//! Requests are independent; the only shared state is the read-only glyph
//! model behind [`crate::ports::CharModel`].

use tracing::{debug, info, warn};

use crate::domain::{GradeError, GradingOutcome, MarkedAnswers, SheetImage, SheetLayout};
use crate::ports::{AnswerKeyStore, CharModel, Notifier, StudentDirectory};
use crate::vision::{
    decode_frame, decode_quiz_id, find_document, geometry, score, BubbleConfig, FillDetector,
    IdReadConfig, IdentifierReader, QuizIdConfig, RegionExtractor,
};

/// Tuning for every pipeline stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraderConfig {
    /// QR decode retry budget.
    pub quiz_id: QuizIdConfig,
    /// Bubble detection tuning.
    pub bubbles: BubbleConfig,
    /// Identifier segmentation tuning.
    pub id_read: IdReadConfig,
}

/// Grades captured bubble sheets against stored answer keys.
pub struct Grader<'a> {
    layout: SheetLayout,
    config: GraderConfig,
    keys: &'a dyn AnswerKeyStore,
    chars: Option<&'a dyn CharModel>,
    students: Option<&'a dyn StudentDirectory>,
    notifier: Option<&'a dyn Notifier>,
}

impl<'a> Grader<'a> {
    /// Creates a grader for one layout revision.
    #[must_use]
    pub fn new(layout: SheetLayout, config: GraderConfig, keys: &'a dyn AnswerKeyStore) -> Self {
        Self {
            layout,
            config,
            keys,
            chars: None,
            students: None,
            notifier: None,
        }
    }

    /// Attaches the glyph classifier; without one the identifier is skipped.
    #[must_use]
    pub fn with_char_model(mut self, model: &'a dyn CharModel) -> Self {
        self.chars = Some(model);
        self
    }

    /// Attaches the student directory for post-grading lookup.
    #[must_use]
    pub fn with_student_directory(mut self, directory: &'a dyn StudentDirectory) -> Self {
        self.students = Some(directory);
        self
    }

    /// Attaches a notifier for score delivery. Failures never fail grading.
    #[must_use]
    pub fn with_notifier(mut self, notifier: &'a dyn Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Grades one sheet photo.
    ///
    /// # Errors
    ///
    /// Returns a categorized [`GradeError`]; see the error taxonomy for
    /// which stages abort grading. An unreadable student identifier is not
    /// an error.
    pub fn grade(&self, sheet: &SheetImage) -> Result<GradingOutcome, GradeError> {
        if sheet.width() < 16 || sheet.height() < 16 {
            return Err(GradeError::InvalidImage {
                reason: format!("{}x{} is too small", sheet.width(), sheet.height()),
            });
        }
        let gray = sheet.image.to_luma8();

        let quad = find_document(&gray).ok_or(GradeError::DocumentNotFound)?;
        let rectified = geometry::rectify(
            &gray,
            &quad,
            self.layout.canonical_width,
            self.layout.canonical_height,
        )
        .map_err(|_| GradeError::DocumentNotFound)?;
        debug!(source = %sheet.source, "page rectified");

        let extractor = RegionExtractor::new(&self.layout);

        // Rectified page first (known QR position, normalized lighting),
        // then the raw capture as a last resort.
        let quiz_id = decode_quiz_id(
            &rectified,
            &extractor.qr_region(&rectified),
            &self.config.quiz_id,
        )
        .or_else(|| decode_frame(&gray, &self.config.quiz_id))
        .ok_or(GradeError::QuizIdNotDecoded)?;
        info!(quiz_id, "quiz identified");

        let key = self
            .keys
            .answer_key(&quiz_id)?
            .ok_or_else(|| GradeError::AnswerKeyNotFound {
                quiz_id: quiz_id.clone(),
            })?;

        let detector = FillDetector::new(self.config.bubbles);

        let mut marked = MarkedAnswers::new();
        let mut question_offset = 0usize;
        for (panel, questions) in extractor.bubble_panels(&rectified) {
            let panel_marks = detector
                .detect(&panel, self.layout.options_per_question, questions)
                .map_err(GradeError::Internal)?;
            for (question, options) in panel_marks {
                marked.insert(question_offset + question, options);
            }
            question_offset += questions;
        }

        let summary = score(&marked, &key);
        info!(
            correct = summary.correct,
            total = summary.total,
            percent = summary.percent,
            "sheet scored"
        );

        let student_id = self.read_identifier(&extractor, &rectified)?;
        if let Some(id) = &student_id {
            self.notify_student(id, &key.title, summary.percent);
        }

        Ok(GradingOutcome {
            quiz_id,
            score: summary.percent,
            correct: summary.correct,
            total: summary.total,
            student_id,
            answers: marked,
        })
    }

    /// Reads the student identifier; `None` when no classifier is attached
    /// or the box yields no characters.
    fn read_identifier(
        &self,
        extractor: &RegionExtractor<'_>,
        rectified: &image::GrayImage,
    ) -> Result<Option<String>, GradeError> {
        let Some(model) = self.chars else {
            return Ok(None);
        };
        let id_box = extractor.id_box(rectified);
        let reader = IdentifierReader::new(self.config.id_read);
        let identifier = reader.read(&id_box, model).map_err(GradeError::Internal)?;
        if identifier.is_empty() {
            debug!("no characters detected in the ID box");
            Ok(None)
        } else {
            Ok(Some(identifier))
        }
    }

    /// Best-effort score notification; all failures are logged and dropped.
    fn notify_student(&self, identifier: &str, quiz_title: &str, percent: f32) {
        let Some(directory) = self.students else {
            return;
        };
        let student = match directory.find_by_identifier(identifier) {
            Ok(Some(student)) => student,
            Ok(None) => {
                debug!(identifier, "no student matches the recognized identifier");
                return;
            }
            Err(e) => {
                warn!(identifier, error = %e, "student directory lookup failed");
                return;
            }
        };
        let Some(notifier) = self.notifier else {
            return;
        };
        let body =
            format!("Congratulations! You scored {percent:.1} on the {quiz_title} quiz");
        if let Err(e) = notifier.notify(&student.email, "Quiz Results", &body) {
            warn!(email = student.email, error = %e, "score notification failed");
        }
    }
}
