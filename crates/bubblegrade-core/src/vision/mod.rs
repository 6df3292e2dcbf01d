//! Vision pipeline stages.
//!
//! Each stage is a pure function of pixel data: page detection and
//! rectification, QR-based quiz identification, layout-driven region
//! extraction, bubble mark detection, scoring, and student-identifier
//! reading.

pub mod bubbles;
pub mod geometry;
pub mod idread;
pub mod quiz_id;
pub mod regions;
pub mod scoring;

pub use bubbles::{BubbleConfig, FillDetector};
pub use geometry::{find_document, rectify, DetectStrategy, DETECT_STRATEGIES};
pub use idread::{IdReadConfig, IdentifierReader};
pub use quiz_id::{decode_frame, decode_quiz_id, QuizIdConfig};
pub use regions::RegionExtractor;
pub use scoring::{score, ScoreSummary};
