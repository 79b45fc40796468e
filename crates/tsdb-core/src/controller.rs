//! Lifecycle controller
//!
//! Maps one lifecycle event plus the current applied state to a
//! [`Transition`]. The controller never persists anything and never
//! fails: every error becomes a blocked status with a deferred event.

use tsdb_host::{ArtifactSource, HostProbe, PackageManager, ServiceControl, SourceRegistry};

use crate::artifact::{ArtifactAvailability, Fingerprints};
use crate::backend::{ArtifactInstaller, RepositoryInstaller, install_shared_dependencies};
use crate::config::{DesiredConfiguration, OptionMap, SourceMode, requested_source_mode};
use crate::selector::{Action, select};
use crate::state::AppliedState;
use crate::status::{
    Disposition, MSG_INSTALLING, MSG_RECONFIGURING, MSG_UPGRADING, MSG_WAITING_FOR_DATABASE,
    StatusSink, UnitStatus,
};
use crate::{Error, Result};

/// Kind of lifecycle event delivered by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Install,
    ConfigChanged,
    UpgradeCharm,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::ConfigChanged => "config-changed",
            Self::UpgradeCharm => "upgrade-charm",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event together with the options delivered alongside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub options: OptionMap,
}

impl Event {
    pub fn new(kind: EventKind, options: OptionMap) -> Self {
        Self { kind, options }
    }
}

/// Outcome of handling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Final status to report, `None` to leave the current one
    pub status: Option<UnitStatus>,
    pub disposition: Disposition,
    /// State to commit; only set after a backend call succeeded
    pub next: Option<AppliedState>,
}

impl Transition {
    /// Nothing to do and nothing to report
    pub fn noop() -> Self {
        Self {
            status: None,
            disposition: Disposition::Resolved,
            next: None,
        }
    }

    pub fn resolved(status: UnitStatus) -> Self {
        Self {
            status: Some(status),
            disposition: Disposition::Resolved,
            next: None,
        }
    }

    pub fn defer(status: UnitStatus) -> Self {
        Self {
            status: Some(status),
            disposition: Disposition::Defer,
            next: None,
        }
    }

    pub fn with_next(mut self, next: AppliedState) -> Self {
        self.next = Some(next);
        self
    }
}

/// Borrowed host collaborators
#[derive(Clone, Copy)]
pub struct HostServices<'a> {
    pub probe: &'a dyn HostProbe,
    pub packages: &'a dyn PackageManager,
    pub sources: &'a dyn SourceRegistry,
    pub service: &'a dyn ServiceControl,
    pub artifacts: &'a dyn ArtifactSource,
}

impl<'a> HostServices<'a> {
    fn artifact_installer(&self) -> ArtifactInstaller<'a> {
        ArtifactInstaller::new(self.packages, self.service)
    }

    fn repository_installer(&self) -> RepositoryInstaller<'a> {
        RepositoryInstaller::new(self.sources, self.packages, self.service, self.probe)
    }
}

/// The install/configure/upgrade state machine
pub struct Controller<'a> {
    host: HostServices<'a>,
    status: &'a dyn StatusSink,
}

impl<'a> Controller<'a> {
    pub fn new(host: HostServices<'a>, status: &'a dyn StatusSink) -> Self {
        Self { host, status }
    }

    /// Handle one event against the current state
    pub fn handle(&self, state: &AppliedState, event: &Event) -> Transition {
        tracing::debug!(event = %event.kind, installed = state.installed, "Handling event");
        match event.kind {
            EventKind::Install => self.on_install(state, &event.options),
            EventKind::ConfigChanged => self.on_config_changed(state, &event.options),
            EventKind::UpgradeCharm => self.on_upgrade(state, &event.options),
        }
    }

    fn on_install(&self, state: &AppliedState, options: &OptionMap) -> Transition {
        if state.installed {
            tracing::debug!("Already installed");
            return Transition::noop();
        }
        if !self.host.probe.database_installed() {
            tracing::info!("Database not installed yet, deferring");
            return Transition::defer(UnitStatus::waiting(MSG_WAITING_FOR_DATABASE));
        }

        self.status.report(&UnitStatus::maintenance(MSG_INSTALLING));
        match self.install(state, options) {
            Ok(next) => Transition::resolved(UnitStatus::Active).with_next(next),
            Err(e) => installation_failed(&e),
        }
    }

    fn install(&self, state: &AppliedState, options: &OptionMap) -> Result<AppliedState> {
        let desired = DesiredConfiguration::from_options(options)?;
        let availability = ArtifactAvailability::gather(self.host.artifacts)?;
        let action = select(state, &desired, availability)?;
        install_shared_dependencies(self.host.packages)?;
        self.apply(state, &desired, action)
    }

    fn on_config_changed(&self, state: &AppliedState, options: &OptionMap) -> Transition {
        if !state.installed {
            return self.on_install(state, options);
        }

        let requested = match requested_source_mode(options) {
            Ok(mode) => mode,
            Err(e) => return installation_failed(&e),
        };
        let applied_mode = state.last_applied.as_ref().map(|c| c.source_mode);
        if applied_mode.is_some_and(|mode| mode != requested) {
            tracing::warn!(
                installed = %state.source_mode,
                requested = %requested,
                "Changing from-resources after setup is not supported"
            );
            return Transition::defer(UnitStatus::blocked(format!(
                "config failed: {}",
                Error::SourceModeChanged
            )));
        }

        match state.source_mode {
            SourceMode::FromArtifacts => {
                tracing::warn!("Installed from resources, ignoring repository options");
                Transition::resolved(UnitStatus::Active)
            }
            SourceMode::FromRepository => {
                let result = DesiredConfiguration::from_options(options)
                    .and_then(|desired| self.reconfigure(state, &desired));
                match result {
                    Ok(Some(next)) => Transition::resolved(UnitStatus::Active).with_next(next),
                    Ok(None) => Transition::resolved(UnitStatus::Active),
                    Err(e) => installation_failed(&e),
                }
            }
        }
    }

    fn reconfigure(
        &self,
        state: &AppliedState,
        desired: &DesiredConfiguration,
    ) -> Result<Option<AppliedState>> {
        let availability = ArtifactAvailability::gather(self.host.artifacts)?;
        let action = select(state, desired, availability)?;
        if action == Action::None {
            tracing::debug!("Configuration unchanged");
            return Ok(None);
        }

        self.status.report(&UnitStatus::maintenance(MSG_RECONFIGURING));
        self.apply(state, desired, action).map(Some)
    }

    fn on_upgrade(&self, state: &AppliedState, options: &OptionMap) -> Transition {
        if !state.installed {
            return self.on_install(state, options);
        }

        self.status.report(&UnitStatus::maintenance(MSG_UPGRADING));
        match self.upgrade(state) {
            Ok(next) => Transition {
                next,
                ..Transition::resolved(UnitStatus::Active)
            },
            Err(e) => Transition::defer(UnitStatus::blocked(format!("upgrade failed: {}", e))),
        }
    }

    fn upgrade(&self, state: &AppliedState) -> Result<Option<AppliedState>> {
        match state.source_mode {
            SourceMode::FromArtifacts => {
                let set = ArtifactAvailability::gather(self.host.artifacts)?.require_complete()?;
                let fingerprints = self
                    .host
                    .artifact_installer()
                    .install(&set, &state.fingerprints)?;
                if fingerprints == state.fingerprints {
                    return Ok(None);
                }
                let desired = state.last_applied.clone().unwrap_or_default();
                Ok(Some(AppliedState::from_artifacts(&desired, fingerprints)))
            }
            SourceMode::FromRepository => {
                self.host.repository_installer().upgrade()?;
                Ok(None)
            }
        }
    }

    fn apply(
        &self,
        state: &AppliedState,
        desired: &DesiredConfiguration,
        action: Action,
    ) -> Result<AppliedState> {
        tracing::info!(action = action.name(), "Applying");
        match action {
            Action::None => Ok(state.clone()),
            Action::SetupFromArtifacts(set) => {
                let empty = Fingerprints::new();
                let previous = state.installed_fingerprints().unwrap_or(&empty);
                let fingerprints = self.host.artifact_installer().install(&set, previous)?;
                Ok(AppliedState::from_artifacts(desired, fingerprints))
            }
            Action::SetupRepositoryAndInstall => {
                self.host.repository_installer().setup_and_install(desired)?;
                Ok(AppliedState::from_repository(desired))
            }
            Action::InstallOnly => {
                self.host.repository_installer().install_only(desired)?;
                Ok(AppliedState::from_repository(desired))
            }
        }
    }
}

fn installation_failed(error: &Error) -> Transition {
    tracing::warn!(
        error = %error,
        configuration = error.is_configuration(),
        "Installation failed"
    );
    Transition::defer(UnitStatus::blocked(format!("installation failed: {}", error)))
}
