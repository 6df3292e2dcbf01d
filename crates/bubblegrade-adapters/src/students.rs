//! JSON-file student directory.

use anyhow::{Context, Result};
use bubblegrade_core::{StudentDirectory, StudentRecord};
use serde::Deserialize;
use std::path::Path;

/// On-disk student row. Kept separate from the domain record so the file
/// format can grow fields without touching the core crate.
#[derive(Debug, Clone, Deserialize)]
struct StudentRow {
    identifier: String,
    name: String,
    email: String,
}

/// Student directory loaded from a JSON array file.
pub struct JsonStudentDirectory {
    rows: Vec<StudentRow>,
}

impl JsonStudentDirectory {
    /// Loads the directory from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read student directory: {}", path.display()))?;
        let rows: Vec<StudentRow> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse student directory: {}", path.display()))?;
        Ok(Self { rows })
    }

    /// Number of loaded students.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the directory holds no students.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl StudentDirectory for JsonStudentDirectory {
    fn find_by_identifier(&self, identifier: &str) -> Result<Option<StudentRecord>> {
        // Identifiers are written by hand and classified case-insensitively.
        let found = self
            .rows
            .iter()
            .find(|row| row.identifier.eq_ignore_ascii_case(identifier));
        Ok(found.map(|row| StudentRecord {
            identifier: row.identifier.clone(),
            name: row.name.clone(),
            email: row.email.clone(),
        }))
    }
}
