use tsdb_host::{
    HostProbe, PackageManager, PackageSpec, ServiceControl, SourceRegistry,
    service::DATABASE_SERVICE,
};

use crate::config::DesiredConfiguration;
use crate::{Error, Result};

/// Database major versions the extension packages exist for, in probe order
pub const SUPPORTED_HOST_VERSIONS: [u32; 2] = [12, 14];

/// First supported major version with an on-disk marker
pub fn probe_host_version(probe: &dyn HostProbe) -> Result<u32> {
    SUPPORTED_HOST_VERSIONS
        .iter()
        .copied()
        .find(|major| probe.has_major_version(*major))
        .ok_or_else(|| Error::UnsupportedHostVersion {
            attempted: SUPPORTED_HOST_VERSIONS.to_vec(),
        })
}

/// Extension and loader packages for a database major version
pub fn package_specs(major: u32, pin: Option<&str>) -> Vec<PackageSpec> {
    vec![
        PackageSpec::new(format!("timescaledb-2-postgresql-{}", major), pin),
        PackageSpec::new(format!("timescaledb-2-loader-postgresql-{}", major), pin),
    ]
}

/// Installs from a package repository.
///
/// Every host command is a hard dependency; the first failure aborts.
pub struct RepositoryInstaller<'a> {
    sources: &'a dyn SourceRegistry,
    packages: &'a dyn PackageManager,
    service: &'a dyn ServiceControl,
    probe: &'a dyn HostProbe,
}

impl<'a> RepositoryInstaller<'a> {
    pub fn new(
        sources: &'a dyn SourceRegistry,
        packages: &'a dyn PackageManager,
        service: &'a dyn ServiceControl,
        probe: &'a dyn HostProbe,
    ) -> Self {
        Self {
            sources,
            packages,
            service,
            probe,
        }
    }

    /// Register the source (and key), then install.
    pub fn setup_and_install(&self, desired: &DesiredConfiguration) -> Result<()> {
        let url = desired.require_repository_url()?;

        let codename = self.sources.release_codename()?;
        self.sources
            .register_source(&format!("deb {} {} main", url, codename))?;
        if let Some(key) = desired.signing_key_url.as_deref() {
            self.sources.import_key(key)?;
        }

        self.install_only(desired)
    }

    /// Install from the registered source without touching it.
    pub fn install_only(&self, desired: &DesiredConfiguration) -> Result<()> {
        self.packages.refresh_index()?;

        let major = probe_host_version(self.probe)?;
        tracing::info!(major, pin = ?desired.version_pin, "Installing packages");
        self.packages
            .install(&package_specs(major, desired.version_pin.as_deref()))?;

        self.service.tune()?;
        self.service.restart(DATABASE_SERVICE)?;
        Ok(())
    }

    /// Upgrade everything the package manager knows about
    pub fn upgrade(&self) -> Result<()> {
        self.packages.refresh_index()?;
        self.packages.dist_upgrade()?;
        Ok(())
    }
}
