//! Answer-key lookup port.

use crate::domain::AnswerKey;

/// Port for resolving a quiz id to its stored answer key.
pub trait AnswerKeyStore: Send + Sync {
    /// Looks up the answer key for a quiz.
    ///
    /// Returns `Ok(None)` when the quiz id is unknown; the pipeline turns
    /// that into [`crate::domain::GradeError::AnswerKeyNotFound`] rather
    /// than guessing.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn answer_key(&self, quiz_id: &str) -> anyhow::Result<Option<AnswerKey>>;
}
