//! Answer key types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One question's correct option set.
///
/// Multi-correct questions are supported; a question is graded correct only
/// when the marked set equals this set exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyQuestion {
    /// Zero-based indices of the correct options.
    pub correct: BTreeSet<usize>,
}

impl KeyQuestion {
    /// Single-answer question.
    #[must_use]
    pub fn single(option: usize) -> Self {
        Self {
            correct: BTreeSet::from([option]),
        }
    }

    /// Multi-answer question.
    #[must_use]
    pub fn multi(options: impl IntoIterator<Item = usize>) -> Self {
        Self {
            correct: options.into_iter().collect(),
        }
    }
}

/// The authoritative answer key for one quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerKey {
    /// Quiz identifier, as printed in the sheet's QR code.
    pub quiz_id: String,
    /// Quiz title, used for notification messages.
    pub title: String,
    /// Ordered list of questions.
    pub questions: Vec<KeyQuestion>,
}

impl AnswerKey {
    /// Number of questions in the key.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// True when the key has no questions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_and_multi_constructors() {
        let q = KeyQuestion::single(3);
        assert_eq!(q.correct, BTreeSet::from([3]));

        let q = KeyQuestion::multi([1, 2, 3, 4]);
        assert_eq!(q.correct.len(), 4);
    }

    #[test]
    fn test_key_roundtrips_through_json() {
        let key = AnswerKey {
            quiz_id: "quiz-1".into(),
            title: "Sample Quiz".into(),
            questions: vec![KeyQuestion::single(0), KeyQuestion::multi([1, 2])],
        };
        let json = serde_json::to_string(&key).expect("serialize");
        let back: AnswerKey = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.quiz_id, "quiz-1");
        assert_eq!(back.questions[1].correct, BTreeSet::from([1, 2]));
    }
}
