//! Error types for host operations

use std::path::PathBuf;

/// Errors that can occur while talking to the host
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The command could not be started at all
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// Rendered command line
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited non-zero
    #[error("`{command}` failed (exit code {code}): {stderr}")]
    CommandFailed {
        /// Rendered command line
        command: String,
        /// Exit code, -1 when terminated by a signal
        code: i32,
        /// Captured diagnostic text
        stderr: String,
    },

    /// An artifact exists but could not be read
    #[error("cannot read resource {name} at {path}: {source}")]
    ArtifactRead {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Direct filesystem write failed
    #[error(transparent)]
    Fs(#[from] tsdb_fs::Error),

    /// Command produced output that could not be interpreted
    #[error("unexpected output from `{command}`: {output}")]
    UnexpectedOutput { command: String, output: String },
}

/// Result type alias for host operations
pub type Result<T> = std::result::Result<T, Error>;
