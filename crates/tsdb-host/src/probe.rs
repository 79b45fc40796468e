//! On-disk markers for the host database engine

use std::path::{Path, PathBuf};

/// Data directory the database engine creates on install, relative to the
/// host root. Each installed major version gets a subdirectory.
pub const POSTGRESQL_DATA_DIR: &str = "var/lib/postgresql";

/// Filesystem checks answering "is the database engine here, and which
/// major version?"
pub trait HostProbe {
    /// Whether the database engine installation marker exists
    fn database_installed(&self) -> bool;

    /// Whether the marker for the given major version exists
    fn has_major_version(&self, major: u32) -> bool;
}

/// [`HostProbe`] backed by the real filesystem under a root directory
#[derive(Debug, Clone)]
pub struct FsHostProbe {
    root: PathBuf,
}

impl Default for FsHostProbe {
    fn default() -> Self {
        Self::new("/")
    }
}

impl FsHostProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_dir(&self) -> PathBuf {
        self.root.join(POSTGRESQL_DATA_DIR)
    }
}

impl HostProbe for FsHostProbe {
    fn database_installed(&self) -> bool {
        let path = self.data_dir();
        let found = path.exists();
        tracing::debug!(path = %path.display(), found, "Probed database marker");
        found
    }

    fn has_major_version(&self, major: u32) -> bool {
        let path = self.data_dir().join(major.to_string());
        let found = path.exists();
        tracing::debug!(path = %path.display(), found, "Probed version marker");
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_data_dir() {
        let temp = TempDir::new().unwrap();
        let probe = FsHostProbe::new(temp.path());
        assert!(!probe.database_installed());
        assert!(!probe.has_major_version(14));
    }

    #[test]
    fn test_data_dir_and_version_marker() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("var/lib/postgresql/14")).unwrap();

        let probe = FsHostProbe::new(temp.path());
        assert!(probe.database_installed());
        assert!(probe.has_major_version(14));
        assert!(!probe.has_major_version(12));
    }
}
