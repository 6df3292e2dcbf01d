//! Student directory lookup port.

/// A student record resolved from a recognized identifier.
#[derive(Debug, Clone)]
pub struct StudentRecord {
    /// The identifier as written on the sheet.
    pub identifier: String,
    /// Student display name.
    pub name: String,
    /// Notification address.
    pub email: String,
}

/// Port for resolving a recognized identifier to a student record.
pub trait StudentDirectory: Send + Sync {
    /// Finds the student matching `identifier`.
    ///
    /// Zero matches is a normal, non-fatal outcome and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be queried.
    fn find_by_identifier(&self, identifier: &str) -> anyhow::Result<Option<StudentRecord>>;
}
