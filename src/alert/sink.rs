/// Append-only alert log.
///
/// The sink is the only persistence in the service: one timestamped
/// line per alert, appended when a cycle produces a non-empty batch.
/// Lines are never rewritten or rotated here.
///
/// # Clock injection
/// `append_batch_at` takes `now` as a parameter so tests can pin the
/// timestamp; `append_batch` is the convenience wrapper over the real
/// clock.

use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::model::Alert;

/// Handle to the append-only alert log file.
#[derive(Debug, Clone)]
pub struct AlertLog {
    path: PathBuf,
}

impl AlertLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line per alert, stamped with `now`.
    ///
    /// An empty batch is a no-op: the file is not created or touched,
    /// so quiet cycles leave no trace.
    pub fn append_batch_at(
        &self,
        alerts: &[Alert],
        now: DateTime<Utc>,
    ) -> std::io::Result<()> {
        if alerts.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let timestamp = now.format("%Y-%m-%d %H:%M:%S UTC");
        for alert in alerts {
            writeln!(file, "{}: {}", timestamp, alert.message)?;
        }
        Ok(())
    }

    /// Convenience wrapper that stamps with the real current time.
    pub fn append_batch(&self, alerts: &[Alert]) -> std::io::Result<()> {
        self.append_batch_at(alerts, Utc::now())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
