//! Bubblegrade Adapters - External adapters for bubblegrade.
//!
//! This crate provides adapters for:
//! - Filesystem sheet-photo source
//! - JSON answer-key store and student directory
//! - Notification outbox
//! - Model downloading and caching

pub mod fs;
pub mod keys;
pub mod models;
pub mod notify;
pub mod students;

pub use fs::FsSheetSource;
pub use keys::{load_all_keys, JsonKeyStore};
pub use models::{model_path, models_dir, set_models_dir};
pub use notify::OutboxNotifier;
pub use students::JsonStudentDirectory;
