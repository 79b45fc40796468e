//! Persisted applied state
//!
//! The state document records what was last applied successfully. It is
//! read at the start of every event and written once, at the end of a
//! successful one.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tsdb_fs::{DocumentFormat, DocumentStore};

use crate::artifact::Fingerprints;
use crate::config::{DesiredConfiguration, SourceMode};
use crate::{Error, Result};

/// File name of the state document inside the state directory
pub const STATE_FILE: &str = "state.toml";

/// Current state document format version
pub const STATE_FORMAT_VERSION: &str = "1";

/// What the unit last applied successfully
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppliedState {
    /// Installation has completed at least once
    pub installed: bool,
    /// Strategy used by the last successful apply
    pub source_mode: SourceMode,
    /// Options snapshot at the last successful apply
    pub last_applied: Option<DesiredConfiguration>,
    /// Content fingerprints of installed artifacts (artifact mode only)
    pub fingerprints: Fingerprints,
    /// When the last successful apply finished
    pub applied_at: Option<DateTime<Utc>>,
}

impl AppliedState {
    /// State after a successful artifact-based install
    pub fn from_artifacts(desired: &DesiredConfiguration, fingerprints: Fingerprints) -> Self {
        Self {
            installed: true,
            source_mode: SourceMode::FromArtifacts,
            last_applied: Some(desired.clone()),
            fingerprints,
            applied_at: Some(Utc::now()),
        }
    }

    /// State after a successful repository-based install
    pub fn from_repository(desired: &DesiredConfiguration) -> Self {
        Self {
            installed: true,
            source_mode: SourceMode::FromRepository,
            last_applied: Some(desired.clone()),
            fingerprints: Fingerprints::new(),
            applied_at: Some(Utc::now()),
        }
    }

    /// Fingerprints that count as "already installed"
    pub fn installed_fingerprints(&self) -> Option<&Fingerprints> {
        (self.installed && self.source_mode == SourceMode::FromArtifacts).then_some(&self.fingerprints)
    }
}

/// Durable storage for [`AppliedState`]
pub trait StateStore {
    /// Read the current state; a store that was never written is empty
    fn load(&self) -> Result<AppliedState>;

    /// Replace the stored state
    fn commit(&self, state: &AppliedState) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StateDocument {
    version: String,
    installed: bool,
    source_mode: SourceMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    applied_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_applied: Option<DesiredConfiguration>,
    #[serde(default)]
    fingerprints: Fingerprints,
}

impl From<&AppliedState> for StateDocument {
    fn from(state: &AppliedState) -> Self {
        Self {
            version: STATE_FORMAT_VERSION.to_string(),
            installed: state.installed,
            source_mode: state.source_mode,
            applied_at: state.applied_at,
            last_applied: state.last_applied.clone(),
            fingerprints: state.fingerprints.clone(),
        }
    }
}

impl From<StateDocument> for AppliedState {
    fn from(doc: StateDocument) -> Self {
        Self {
            installed: doc.installed,
            source_mode: doc.source_mode,
            last_applied: doc.last_applied,
            fingerprints: doc.fingerprints,
            applied_at: doc.applied_at,
        }
    }
}

/// [`StateStore`] backed by a TOML document.
///
/// Loads take a shared lock; commits take an exclusive lock and replace
/// the document through a temp file and rename.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
    documents: DocumentStore,
}

impl FileStateStore {
    /// Store `state.toml` inside `state_dir`
    pub fn new(state_dir: &Path) -> Self {
        Self::at(state_dir.join(STATE_FILE))
    }

    /// Store at an explicit document path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            documents: DocumentStore::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<AppliedState> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No state document, starting empty");
            return Ok(AppliedState::default());
        }

        let content = tsdb_fs::io::read_text_locked(&self.path)?;
        if content.trim().is_empty() {
            tracing::warn!(path = %self.path.display(), "Empty state document, starting empty");
            return Ok(AppliedState::default());
        }

        let doc: StateDocument = self
            .documents
            .parse(&self.path, DocumentFormat::Toml, &content)?;
        if doc.version != STATE_FORMAT_VERSION {
            return Err(Error::StateCorrupt {
                path: self.path.clone(),
                message: format!("unsupported format version '{}'", doc.version),
            });
        }
        if doc.installed
            && doc.source_mode == SourceMode::FromRepository
            && doc.last_applied.is_none()
        {
            return Err(Error::StateCorrupt {
                path: self.path.clone(),
                message: "installed from repository without a last-applied snapshot".into(),
            });
        }
        Ok(doc.into())
    }

    fn commit(&self, state: &AppliedState) -> Result<()> {
        self.documents.save(&self.path, &StateDocument::from(state))?;
        tracing::info!(
            path = %self.path.display(),
            installed = state.installed,
            source_mode = %state.source_mode,
            "Committed applied state"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_document_is_empty_state() {
        let temp = TempDir::new().unwrap();
        let store = FileStateStore::new(temp.path());
        assert_eq!(store.load().unwrap(), AppliedState::default());
    }

    #[test]
    fn document_carries_version_and_tables() {
        let temp = TempDir::new().unwrap();
        let store = FileStateStore::new(temp.path());

        let mut fingerprints = Fingerprints::new();
        fingerprints.insert("loader".into(), "sha256:00".into());
        let state = AppliedState::from_artifacts(&DesiredConfiguration::default(), fingerprints);
        store.commit(&state).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("version = \"1\""));
        assert!(raw.contains("source_mode = \"from-artifacts\""));
        assert!(raw.contains("[fingerprints]"));
        assert!(raw.contains("loader = \"sha256:00\""));
    }

    #[test]
    fn empty_document_is_empty_state() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(STATE_FILE);
        std::fs::write(&path, " \n").unwrap();

        assert_eq!(FileStateStore::at(&path).load().unwrap(), AppliedState::default());
    }

    #[test]
    fn rejects_unknown_format_version() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(STATE_FILE);
        std::fs::write(
            &path,
            "version = \"9\"\ninstalled = false\nsource_mode = \"from-repository\"\n",
        )
        .unwrap();

        let err = FileStateStore::at(&path).load().unwrap_err();
        assert!(matches!(err, Error::StateCorrupt { .. }));
    }

    #[test]
    fn installed_fingerprints_only_for_artifact_installs() {
        let repo = AppliedState::from_repository(&DesiredConfiguration::default());
        assert!(repo.installed_fingerprints().is_none());
        assert!(AppliedState::default().installed_fingerprints().is_none());

        let artifacts = AppliedState::from_artifacts(&DesiredConfiguration::default(), Fingerprints::new());
        assert!(artifacts.installed_fingerprints().is_some());
    }
}
