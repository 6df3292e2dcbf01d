//! Bubblegrade Core - Bubble-sheet grading engine
//!
//! This crate contains the domain types, the vision pipeline (page
//! rectification, quiz identification, bubble mark detection, scoring,
//! student-identifier OCR), the candle-based glyph classifier, and the
//! port traits that bound the engine against external collaborators.

pub mod domain;
pub mod inference;
pub mod pipeline;
pub mod ports;
pub mod vision;

pub use domain::{
    AnswerKey, GradeError, GradingOutcome, KeyQuestion, MarkedAnswers, PanelRegion, Quad, Region,
    SheetImage, SheetLayout,
};
pub use pipeline::{Grader, GraderConfig};
pub use ports::{AnswerKeyStore, CharModel, Notifier, StudentDirectory, StudentRecord};
