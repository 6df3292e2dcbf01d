//! Notification delivery port.

/// Port for fire-and-forget message delivery.
///
/// Delivery failure must never fail a grading request; the pipeline logs
/// the error and carries on.
pub trait Notifier: Send + Sync {
    /// Sends a message to `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be handed off.
    fn notify(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}
