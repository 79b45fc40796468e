//! [`FakeHost`]: a recording host for state machine tests.
//!
//! Every command-like call (package manager, source registry, service
//! control) is appended to a call log in order. Queries (prerequisite
//! and version probes, artifact fetches) are answered from configurable
//! fixtures and not logged.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use tsdb_core::{Controller, HostServices, StateStore, StatusSink, Unit, UnitStatus};
use tsdb_host::{
    Artifact, ArtifactSource, HostProbe, PackageManager, PackageSpec, ServiceControl,
    SourceRegistry,
};

/// Directory fake artifacts claim to live in
pub const FAKE_RESOURCES_DIR: &str = "/resources";

/// One recorded host interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    RefreshIndex,
    /// Rendered package specs (`name` or `name=pin`)
    Install(Vec<String>),
    InstallLocal(PathBuf),
    DistUpgrade,
    ReleaseCodename,
    RegisterSource(String),
    ImportKey(String),
    Tune,
    Restart(String),
}

impl HostCall {
    /// Whether this call went to the package manager
    pub fn is_package_manager(&self) -> bool {
        matches!(
            self,
            Self::RefreshIndex | Self::Install(_) | Self::InstallLocal(_) | Self::DistUpgrade
        )
    }
}

impl fmt::Display for HostCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RefreshIndex => write!(f, "apt-get update -qq"),
            Self::Install(specs) => write!(f, "apt-get install -y {}", specs.join(" ")),
            Self::InstallLocal(path) => write!(f, "dpkg -i {}", path.display()),
            Self::DistUpgrade => write!(f, "apt-get dist-upgrade -y"),
            Self::ReleaseCodename => write!(f, "lsb_release -c -s"),
            Self::RegisterSource(line) => write!(f, "register {}", line),
            Self::ImportKey(url) => write!(f, "apt-key add {}", url),
            Self::Tune => write!(f, "timescaledb-tune -yes"),
            Self::Restart(service) => write!(f, "systemctl restart {}", service),
        }
    }
}

type FailurePredicate = Box<dyn Fn(&HostCall) -> bool>;

/// Recording fake implementing every host trait and [`StatusSink`].
pub struct FakeHost {
    database_installed: Cell<bool>,
    versions: RefCell<BTreeSet<u32>>,
    artifacts: RefCell<BTreeMap<String, Vec<u8>>>,
    codename: String,
    fail_when: RefCell<Option<FailurePredicate>>,
    calls: RefCell<Vec<HostCall>>,
    statuses: RefCell<Vec<UnitStatus>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    /// Database installed, major version 14 present, release `focal`,
    /// no artifacts.
    pub fn new() -> Self {
        Self {
            database_installed: Cell::new(true),
            versions: RefCell::new(BTreeSet::from([14])),
            artifacts: RefCell::new(BTreeMap::new()),
            codename: "focal".to_string(),
            fail_when: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
            statuses: RefCell::new(Vec::new()),
        }
    }

    pub fn without_database(self) -> Self {
        self.database_installed.set(false);
        self
    }

    pub fn with_versions(self, versions: &[u32]) -> Self {
        *self.versions.borrow_mut() = versions.iter().copied().collect();
        self
    }

    pub fn with_codename(mut self, codename: &str) -> Self {
        self.codename = codename.to_string();
        self
    }

    /// Supply an artifact under its resource name
    pub fn with_artifact(self, resource: &str, content: &[u8]) -> Self {
        self.set_artifact(resource, content);
        self
    }

    /// Supply all three artifacts with distinct content
    pub fn with_all_artifacts(self) -> Self {
        self.with_artifact("loader-deb", b"loader v1")
            .with_artifact("tools-deb", b"tools v1")
            .with_artifact("deb", b"core v1")
    }

    pub fn set_database_installed(&self, installed: bool) {
        self.database_installed.set(installed);
    }

    pub fn set_artifact(&self, resource: &str, content: &[u8]) {
        self.artifacts
            .borrow_mut()
            .insert(resource.to_string(), content.to_vec());
    }

    pub fn remove_artifact(&self, resource: &str) {
        self.artifacts.borrow_mut().remove(resource);
    }

    /// Fail every call matching `predicate` with a command failure
    pub fn fail_when(&self, predicate: impl Fn(&HostCall) -> bool + 'static) {
        *self.fail_when.borrow_mut() = Some(Box::new(predicate));
    }

    pub fn stop_failing(&self) {
        *self.fail_when.borrow_mut() = None;
    }

    /// Path a fake artifact is reported at
    pub fn artifact_path(resource: &str) -> PathBuf {
        Path::new(FAKE_RESOURCES_DIR).join(resource)
    }

    /// Calls recorded so far
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    /// Drain the call log
    pub fn take_calls(&self) -> Vec<HostCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    /// Calls that went to the package manager
    pub fn package_calls(&self) -> Vec<HostCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.is_package_manager())
            .cloned()
            .collect()
    }

    /// Every status reported, intermediate ones included
    pub fn statuses(&self) -> Vec<UnitStatus> {
        self.statuses.borrow().clone()
    }

    pub fn take_statuses(&self) -> Vec<UnitStatus> {
        std::mem::take(&mut *self.statuses.borrow_mut())
    }

    pub fn services(&self) -> HostServices<'_> {
        HostServices {
            probe: self,
            packages: self,
            sources: self,
            service: self,
            artifacts: self,
        }
    }

    /// Controller reporting intermediate statuses to this host
    pub fn controller(&self) -> Controller<'_> {
        Controller::new(self.services(), self)
    }

    /// Unit over `store` reporting to this host
    pub fn unit<'a>(&'a self, store: &'a dyn StateStore) -> Unit<'a> {
        Unit::new(store, self.controller(), self)
    }

    fn record(&self, call: HostCall) -> tsdb_host::Result<()> {
        let fail = self
            .fail_when
            .borrow()
            .as_ref()
            .is_some_and(|predicate| predicate(&call));
        let command = call.to_string();
        self.calls.borrow_mut().push(call);

        if fail {
            return Err(tsdb_host::Error::CommandFailed {
                command,
                code: 100,
                stderr: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

impl HostProbe for FakeHost {
    fn database_installed(&self) -> bool {
        self.database_installed.get()
    }

    fn has_major_version(&self, major: u32) -> bool {
        self.versions.borrow().contains(&major)
    }
}

impl PackageManager for FakeHost {
    fn refresh_index(&self) -> tsdb_host::Result<()> {
        self.record(HostCall::RefreshIndex)
    }

    fn install(&self, packages: &[PackageSpec]) -> tsdb_host::Result<()> {
        self.record(HostCall::Install(
            packages.iter().map(ToString::to_string).collect(),
        ))
    }

    fn install_local(&self, path: &Path) -> tsdb_host::Result<()> {
        self.record(HostCall::InstallLocal(path.to_path_buf()))
    }

    fn dist_upgrade(&self) -> tsdb_host::Result<()> {
        self.record(HostCall::DistUpgrade)
    }
}

impl SourceRegistry for FakeHost {
    fn release_codename(&self) -> tsdb_host::Result<String> {
        self.record(HostCall::ReleaseCodename)?;
        Ok(self.codename.clone())
    }

    fn register_source(&self, line: &str) -> tsdb_host::Result<()> {
        self.record(HostCall::RegisterSource(line.to_string()))
    }

    fn import_key(&self, url: &str) -> tsdb_host::Result<()> {
        self.record(HostCall::ImportKey(url.to_string()))
    }
}

impl ServiceControl for FakeHost {
    fn restart(&self, service: &str) -> tsdb_host::Result<()> {
        self.record(HostCall::Restart(service.to_string()))
    }

    fn tune(&self) -> tsdb_host::Result<()> {
        self.record(HostCall::Tune)
    }
}

impl ArtifactSource for FakeHost {
    fn fetch(&self, name: &str) -> tsdb_host::Result<Option<Artifact>> {
        Ok(self.artifacts.borrow().get(name).map(|content| Artifact {
            name: name.to_string(),
            path: Self::artifact_path(name),
            content: content.clone(),
        }))
    }
}

impl StatusSink for FakeHost {
    fn report(&self, status: &UnitStatus) {
        self.statuses.borrow_mut().push(status.clone());
    }
}
