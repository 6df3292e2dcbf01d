//! Core domain types for bubble-sheet grading.

mod error;
mod key;
mod layout;
mod outcome;
mod sheet;

pub use error::GradeError;
pub use key::{AnswerKey, KeyQuestion};
pub use layout::{PanelRegion, Region, SheetLayout};
pub use outcome::{GradingOutcome, MarkedAnswers};
pub use sheet::{Quad, SheetImage};
