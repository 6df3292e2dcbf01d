//! Error taxonomy for the grading pipeline.
//!
//! The caller always receives either a valid [`super::GradingOutcome`] or one
//! of these categories. A student-ID box that yields no characters is not an
//! error: the outcome simply carries no identifier.

use thiserror::Error;

/// Categorized failure of a grading request.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GradeError {
    /// No four-corner page boundary was found after all detection strategies.
    #[error("no document boundary detected in the photo")]
    DocumentNotFound,

    /// The quiz QR code could not be decoded within the attempt budget.
    #[error("quiz identifier could not be decoded")]
    QuizIdNotDecoded,

    /// The decoded quiz id has no stored answer key.
    #[error("no answer key found for quiz '{quiz_id}'")]
    AnswerKeyNotFound {
        /// The quiz id that was decoded from the sheet.
        quiz_id: String,
    },

    /// The input image is unusable (tiny dimensions, empty buffer).
    #[error("input image is not a usable photo: {reason}")]
    InvalidImage {
        /// Human-readable description of what was wrong.
        reason: String,
    },

    /// Unexpected internal failure (collaborator I/O, inference).
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GradeError {
    /// Stable machine-readable code for the error category.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DocumentNotFound => "document_not_found",
            Self::QuizIdNotDecoded => "quiz_id_not_decoded",
            Self::AnswerKeyNotFound { .. } => "answer_key_not_found",
            Self::InvalidImage { .. } => "invalid_image",
            Self::Internal(_) => "internal",
        }
    }
}
