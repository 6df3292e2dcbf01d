//! Answer scoring against the stored key.
//!
//! Exact-set-match policy: a question is correct iff the marked option set
//! equals the correct set. Blank, partially filled, and over-filled
//! questions all score zero; do not loosen this to partial credit.

use std::collections::BTreeSet;

use crate::domain::{AnswerKey, MarkedAnswers};

/// Aggregate score for one graded sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    /// Fully correct questions.
    pub correct: usize,
    /// Total questions in the key.
    pub total: usize,
    /// Percentage, 0.0 to 100.0.
    pub percent: f32,
}

/// Scores marked answers against the key.
///
/// Questions with no detected marks (including questions beyond the
/// detected batches) count as unanswered and therefore incorrect.
#[must_use]
pub fn score(marked: &MarkedAnswers, key: &AnswerKey) -> ScoreSummary {
    let total = key.questions.len();
    let correct = key
        .questions
        .iter()
        .enumerate()
        .filter(|(question, key_question)| {
            marked
                .get(question)
                .map(|options| options.iter().copied().collect::<BTreeSet<_>>())
                .is_some_and(|marked_set| marked_set == key_question.correct)
        })
        .count();

    #[allow(clippy::cast_precision_loss)]
    let percent = if total == 0 {
        0.0
    } else {
        correct as f32 / total as f32 * 100.0
    };
    ScoreSummary {
        correct,
        total,
        percent,
    }
}
