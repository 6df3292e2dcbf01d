//! Test support utilities for bubblegrade.
//!
//! Provides mocks for the core ports, a synthetic sheet builder, and a
//! stencil-font character classifier so the full grading pipeline can be
//! exercised without photos or trained weights.
//!
//! # Example
//!
//! ```
//! use bubblegrade_test_support::{MemoryKeyStore, SheetBuilder};
//!
//! // A filled-in sheet photographed on a desk.
//! let sheet = SheetBuilder::new("quiz-1")
//!     .mark(0, [2])
//!     .to_sheet(100);
//!
//! let keys = MemoryKeyStore::empty();
//! # let _ = (sheet, keys);
//! ```

pub mod font;

mod builders;
mod mocks;

pub use builders::SheetBuilder;
pub use mocks::{
    MemoryKeyStore, MemoryStudentDirectory, RecordingNotifier, SentMessage, StencilCharModel,
};
