//! Grading result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Question index mapped to the option indices that were marked.
///
/// Multiple marks per question are preserved so over-marking can be
/// penalized; an absent entry means the question was left blank.
pub type MarkedAnswers = BTreeMap<usize, Vec<usize>>;

/// Final result of grading one sheet photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingOutcome {
    /// Quiz identifier decoded from the sheet.
    pub quiz_id: String,
    /// Percentage score, 0.0 to 100.0.
    pub score: f32,
    /// Number of fully correct questions.
    pub correct: usize,
    /// Total number of questions in the answer key.
    pub total: usize,
    /// Recognized student identifier, if any characters were read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    /// Per-question marked options (may be sparse).
    pub answers: MarkedAnswers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_omits_absent_student_id() {
        let outcome = GradingOutcome {
            quiz_id: "q".into(),
            score: 70.0,
            correct: 7,
            total: 10,
            student_id: None,
            answers: MarkedAnswers::new(),
        };
        let json = serde_json::to_string(&outcome).expect("serialize");
        assert!(!json.contains("student_id"));
    }

    #[test]
    fn test_outcome_keeps_multiple_marks() {
        let mut answers = MarkedAnswers::new();
        answers.insert(2, vec![1, 3]);
        let outcome = GradingOutcome {
            quiz_id: "q".into(),
            score: 0.0,
            correct: 0,
            total: 1,
            student_id: Some("AB12".into()),
            answers,
        };
        let json = serde_json::to_string(&outcome).expect("serialize");
        let back: GradingOutcome = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.answers.get(&2), Some(&vec![1, 3]));
        assert_eq!(back.student_id.as_deref(), Some("AB12"));
    }
}
