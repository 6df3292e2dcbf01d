//! JSON-file answer key store.
//!
//! Keys live in one directory, one file per quiz: `<quiz_id>.json`
//! containing a serialized [`AnswerKey`].

use anyhow::{Context, Result};
use bubblegrade_core::{AnswerKey, AnswerKeyStore};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Answer key store backed by a directory of JSON files.
pub struct JsonKeyStore {
    dir: PathBuf,
}

impl JsonKeyStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, quiz_id: &str) -> Option<PathBuf> {
        // Decoded quiz IDs come from arbitrary QR payloads; refuse anything
        // that could escape the key directory.
        let safe = !quiz_id.is_empty()
            && quiz_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        safe.then(|| self.dir.join(format!("{quiz_id}.json")))
    }
}

impl AnswerKeyStore for JsonKeyStore {
    fn answer_key(&self, quiz_id: &str) -> Result<Option<AnswerKey>> {
        let Some(path) = self.key_path(quiz_id) else {
            debug!(quiz_id, "refusing unsafe quiz id");
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read answer key: {}", path.display()))?;
        let key: AnswerKey = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse answer key: {}", path.display()))?;
        Ok(Some(key))
    }
}

/// Loads every answer key in a directory, skipping non-JSON entries.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or a key fails to parse.
pub fn load_all_keys(dir: &Path) -> Result<Vec<AnswerKey>> {
    let mut keys = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read key directory: {}", dir.display()))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read answer key: {}", path.display()))?;
        let key: AnswerKey = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse answer key: {}", path.display()))?;
        keys.push(key);
    }
    keys.sort_by(|a, b| a.quiz_id.cmp(&b.quiz_id));
    Ok(keys)
}
