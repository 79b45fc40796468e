//! Error types for tsdb-core

use std::path::PathBuf;

/// Result type for tsdb-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while evaluating a lifecycle event
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required configuration option was not supplied
    #[error("missing required option '{name}'")]
    MissingOption { name: String },

    /// A configuration option has a value that cannot be used
    #[error("invalid value for option '{name}': {reason}")]
    InvalidOption { name: String, reason: String },

    /// One or more required resources were not supplied
    #[error("resource missing: {}", .names.join(", "))]
    MissingArtifacts { names: Vec<String> },

    /// None of the supported database major versions is present
    #[error("failed to find a compatible version of postgresql ({})", join_versions(.attempted))]
    UnsupportedHostVersion { attempted: Vec<u32> },

    /// The source-mode toggle was changed after an artifact install
    #[error("cannot change from-resources after TimescaleDB was set up")]
    SourceModeChanged,

    /// The persisted state document exists but is unusable
    #[error("state document {path} is unusable: {message}")]
    StateCorrupt { path: PathBuf, message: String },

    /// Error from a host collaborator
    #[error(transparent)]
    Host(#[from] tsdb_host::Error),

    /// Filesystem error from tsdb-fs
    #[error(transparent)]
    Fs(#[from] tsdb_fs::Error),
}

impl Error {
    /// Whether an operator can fix this by changing options or resources
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingOption { .. }
                | Self::InvalidOption { .. }
                | Self::MissingArtifacts { .. }
                | Self::UnsupportedHostVersion { .. }
                | Self::SourceModeChanged
        )
    }
}

fn join_versions(versions: &[u32]) -> String {
    versions
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
