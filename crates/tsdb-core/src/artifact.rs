//! The fixed set of artifacts needed for an artifact-based install

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tsdb_host::{Artifact, ArtifactSource};

use crate::{Error, Result};

/// Artifact-name to content-fingerprint mapping
pub type Fingerprints = BTreeMap<String, String>;

/// One of the three packages an artifact install needs.
///
/// Declaration order is install order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactName {
    Loader,
    Tools,
    Core,
}

impl ArtifactName {
    /// All required artifacts, in install order
    pub const ALL: [ArtifactName; 3] = [Self::Loader, Self::Tools, Self::Core];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loader => "loader",
            Self::Tools => "tools",
            Self::Core => "core",
        }
    }

    /// Name of the resource the artifact is supplied under
    pub fn resource_name(self) -> &'static str {
        match self {
            Self::Loader => "loader-deb",
            Self::Tools => "tools-deb",
            Self::Core => "deb",
        }
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete set of required artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    artifacts: BTreeMap<ArtifactName, Artifact>,
}

impl ArtifactSet {
    /// Iterate in install order
    pub fn iter(&self) -> impl Iterator<Item = (ArtifactName, &Artifact)> {
        self.artifacts.iter().map(|(name, artifact)| (*name, artifact))
    }
}

/// What the artifact source could provide
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactAvailability {
    /// Nothing was supplied
    None,
    /// Some but not all; the named ones are missing
    Partial { missing: Vec<ArtifactName> },
    /// Everything was supplied
    Complete(ArtifactSet),
}

impl ArtifactAvailability {
    /// Ask the source for every required artifact.
    ///
    /// Read failures are errors; a resource that was never supplied is not.
    pub fn gather(source: &dyn ArtifactSource) -> Result<Self> {
        let mut found = BTreeMap::new();
        let mut missing = Vec::new();

        for name in ArtifactName::ALL {
            match source.fetch(name.resource_name())? {
                Some(artifact) => {
                    found.insert(name, artifact);
                }
                None => missing.push(name),
            }
        }

        tracing::debug!(found = found.len(), ?missing, "Gathered resources");
        if found.is_empty() {
            Ok(Self::None)
        } else if missing.is_empty() {
            Ok(Self::Complete(ArtifactSet { artifacts: found }))
        } else {
            Ok(Self::Partial { missing })
        }
    }

    /// The complete set, or an error naming every missing resource
    pub fn require_complete(self) -> Result<ArtifactSet> {
        match self {
            Self::Complete(set) => Ok(set),
            Self::Partial { missing } => Err(missing_artifacts(&missing)),
            Self::None => Err(missing_artifacts(&ArtifactName::ALL)),
        }
    }
}

/// Configuration error naming the given artifacts by resource name
pub fn missing_artifacts(names: &[ArtifactName]) -> Error {
    Error::MissingArtifacts {
        names: names
            .iter()
            .map(|name| name.resource_name().to_string())
            .collect(),
    }
}
