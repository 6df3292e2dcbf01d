//! Port definitions for hexagonal architecture.
//!
//! These traits bound the grading core against its external collaborators:
//! answer-key storage, the student directory, notification delivery, and
//! the trained glyph classifier.

mod answer_key;
mod char_model;
mod notify;
mod students;

pub use answer_key::AnswerKeyStore;
pub use char_model::{CharModel, GLYPH_SIZE};
pub use notify::Notifier;
pub use students::{StudentDirectory, StudentRecord};
