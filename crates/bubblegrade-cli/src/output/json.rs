//! JSON output of per-sheet grading records.

use anyhow::Result;
use bubblegrade_core::GradingOutcome;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Mutex;

/// Why a sheet failed to grade.
#[derive(Debug, Clone, Serialize)]
pub struct GradeIssue {
    /// Stable error category.
    pub code: String,
    /// Human-readable detail.
    pub message: String,
}

/// One line of grading output: either an outcome or an issue, never both.
#[derive(Debug, Serialize)]
pub struct GradeRecord {
    /// Sheet photo the record refers to.
    pub source: String,
    /// Grading result, when the sheet graded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GradingOutcome>,
    /// Failure category and detail, when it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<GradeIssue>,
}

impl GradeRecord {
    /// A successful record.
    #[must_use]
    pub fn graded(source: impl Into<String>, outcome: GradingOutcome) -> Self {
        Self {
            source: source.into(),
            outcome: Some(outcome),
            error: None,
        }
    }

    /// A failed record.
    #[must_use]
    pub fn failed(source: impl Into<String>, code: &str, message: String) -> Self {
        Self {
            source: source.into(),
            outcome: None,
            error: Some(GradeIssue {
                code: code.to_string(),
                message,
            }),
        }
    }
}

/// JSON Lines output adapter.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Creates a new JSON output writing to the given writer.
    #[allow(dead_code)] // API for programmatic use
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Writes one record as a JSON line.
    #[allow(clippy::significant_drop_tightening)]
    pub fn write(&self, record: &GradeRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }

    /// Writes a batch of records as a JSON array.
    #[allow(clippy::significant_drop_tightening)]
    pub fn write_array(&self, records: &[GradeRecord], pretty: bool) -> Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(records)?
        } else {
            serde_json::to_string(records)?
        };
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use bubblegrade_core::MarkedAnswers;

    fn sample_outcome() -> GradingOutcome {
        let mut answers = MarkedAnswers::new();
        answers.insert(0, vec![2]);
        GradingOutcome {
            quiz_id: "quiz-1".to_string(),
            score: 90.0,
            correct: 9,
            total: 10,
            student_id: Some("A173".to_string()),
            answers,
        }
    }

    #[test]
    fn test_graded_record_omits_error() {
        let record = GradeRecord::graded("a.png", sample_outcome());
        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.contains("\"quiz_id\":\"quiz-1\""));
        assert!(json.contains("\"student_id\":\"A173\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_failed_record_omits_outcome() {
        let record = GradeRecord::failed("b.png", "document_not_found", "no page".to_string());
        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.contains("\"code\":\"document_not_found\""));
        assert!(!json.contains("\"outcome\""));
    }
}
