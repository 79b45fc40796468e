//! Status sink persisting the last reported status

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tsdb_core::{StatusSink, UnitStatus};
use tsdb_fs::DocumentStore;

/// File name of the status document inside the state directory
pub const STATUS_FILE: &str = "status.json";

/// Last reported status and when it was reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: UnitStatus,
    pub reported_at: DateTime<Utc>,
}

/// Logs every status and writes it to `status.json`
#[derive(Debug, Clone)]
pub struct StatusFile {
    path: PathBuf,
}

impl StatusFile {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(STATUS_FILE),
        }
    }

    /// Read the last record, if any was ever written
    pub fn read(&self) -> tsdb_fs::Result<Option<StatusRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        DocumentStore::new().load(&self.path).map(Some)
    }
}

impl StatusSink for StatusFile {
    fn report(&self, status: &UnitStatus) {
        tracing::info!(state = status.state(), message = status.message(), "Status");

        let record = StatusRecord {
            status: status.clone(),
            reported_at: Utc::now(),
        };
        // Reporting must not fail the event
        if let Err(e) = DocumentStore::new().save(&self.path, &record) {
            tracing::warn!(error = %e, path = %self.path.display(), "Could not persist status");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn report_then_read_returns_last() {
        let temp = TempDir::new().unwrap();
        let sink = StatusFile::new(temp.path());
        assert_eq!(sink.read().unwrap(), None);

        sink.report(&UnitStatus::maintenance("installing TimescaleDB"));
        sink.report(&UnitStatus::Active);

        assert_eq!(sink.read().unwrap().unwrap().status, UnitStatus::Active);
    }

    #[test]
    fn report_into_unwritable_location_does_not_panic() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        // Parent is a regular file, so the write fails
        StatusFile::new(&blocker).report(&UnitStatus::Active);
    }
}
