//! Setup strategy selection
//!
//! A pure function of the applied state, the desired configuration and
//! what the artifact source can provide. It never touches the host.

use crate::artifact::{ArtifactAvailability, ArtifactName, ArtifactSet, missing_artifacts};
use crate::config::{DesiredConfiguration, SourceMode};
use crate::state::AppliedState;
use crate::Result;

/// What an event should do to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing to apply
    None,
    /// Point-install the supplied artifacts whose content changed
    SetupFromArtifacts(ArtifactSet),
    /// Register the package source, then install
    SetupRepositoryAndInstall,
    /// Install from the already registered source
    InstallOnly,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::SetupFromArtifacts(_) => "setup-from-artifacts",
            Self::SetupRepositoryAndInstall => "setup-repository-and-install",
            Self::InstallOnly => "install-only",
        }
    }
}

/// Pick the action for an event.
///
/// A partially supplied artifact set is an error regardless of anything
/// else, as is asking for artifact mode with nothing supplied. A complete
/// set wins unless the unit was already installed from the repository,
/// in which case it is ignored.
pub fn select(
    current: &AppliedState,
    desired: &DesiredConfiguration,
    availability: ArtifactAvailability,
) -> Result<Action> {
    match availability {
        ArtifactAvailability::Partial { missing } => Err(missing_artifacts(&missing)),
        ArtifactAvailability::Complete(set) => {
            if current.installed && current.source_mode == SourceMode::FromRepository {
                tracing::warn!("Resources supplied after a repository install, ignoring them");
                Ok(select_repository(current, desired))
            } else {
                Ok(Action::SetupFromArtifacts(set))
            }
        }
        ArtifactAvailability::None => {
            if desired.source_mode == SourceMode::FromArtifacts {
                return Err(missing_artifacts(&ArtifactName::ALL));
            }
            Ok(select_repository(current, desired))
        }
    }
}

fn select_repository(current: &AppliedState, desired: &DesiredConfiguration) -> Action {
    if !current.installed {
        return Action::SetupRepositoryAndInstall;
    }
    if current.source_mode == SourceMode::FromArtifacts {
        return Action::None;
    }

    match &current.last_applied {
        None => Action::SetupRepositoryAndInstall,
        Some(previous) if desired.source_differs(previous) => Action::SetupRepositoryAndInstall,
        Some(previous) if desired.pin_differs(previous) => Action::InstallOnly,
        Some(_) => Action::None,
    }
}
