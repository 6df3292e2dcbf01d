//! Notification outbox adapter.
//!
//! Score notifications are appended to a JSON Lines outbox file that an
//! external mailer drains. Grading never blocks on delivery.

use anyhow::{Context, Result};
use bubblegrade_core::Notifier;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

/// One queued notification.
#[derive(Debug, Serialize)]
struct OutboxMessage<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Notifier that appends messages to a JSONL outbox file.
pub struct OutboxNotifier {
    path: Mutex<PathBuf>,
}

impl OutboxNotifier {
    /// Creates a notifier appending to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Mutex::new(path.into()),
        }
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = OutboxMessage { to, subject, body };
        let json = serde_json::to_string(&message)?;

        let path = self
            .path
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&*path)
            .with_context(|| format!("Failed to open outbox: {}", path.display()))?;
        writeln!(file, "{json}")?;
        debug!(to, "notification queued");
        Ok(())
    }
}
