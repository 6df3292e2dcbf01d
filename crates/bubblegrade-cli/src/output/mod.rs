//! Output adapters for grading results.

mod json;

pub use json::{GradeIssue, GradeRecord, JsonOutput};
