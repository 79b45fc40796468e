//! Out-of-band package artifacts supplied to the unit

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A package file delivered alongside the unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Resource name the artifact was requested under
    pub name: String,
    /// Location on disk, used for point installs
    pub path: PathBuf,
    /// Raw bytes, used for fingerprinting
    pub content: Vec<u8>,
}

/// Lookup of artifacts by resource name
pub trait ArtifactSource {
    /// Fetch an artifact. `Ok(None)` means the resource was never supplied.
    fn fetch(&self, name: &str) -> Result<Option<Artifact>>;
}

/// [`ArtifactSource`] backed by a directory holding one file per resource
#[derive(Debug, Clone)]
pub struct DirArtifactSource {
    dir: PathBuf,
}

impl DirArtifactSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSource for DirArtifactSource {
    fn fetch(&self, name: &str) -> Result<Option<Artifact>> {
        let path = self.dir.join(name);
        match fs::read(&path) {
            Ok(content) => {
                tracing::debug!(resource = name, bytes = content.len(), "Found resource");
                Ok(Some(Artifact {
                    name: name.to_string(),
                    path,
                    content,
                }))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::ArtifactRead {
                name: name.to_string(),
                path,
                source,
            }),
        }
    }
}
