//! Installer backends
//!
//! Both backends are idempotent and can be retried from scratch after a
//! failure. Neither touches the persisted state; the caller commits the
//! result.

mod artifacts;
mod repository;

pub use artifacts::ArtifactInstaller;
pub use repository::{
    RepositoryInstaller, SUPPORTED_HOST_VERSIONS, package_specs, probe_host_version,
};

use tsdb_host::{PackageManager, PackageSpec};

use crate::Result;

/// Packages either backend needs before it can run
pub const BOOTSTRAP_PACKAGES: [&str; 4] = ["coreutils", "apt-transport-https", "lsb-release", "wget"];

/// Refresh the index and install the bootstrap packages
pub fn install_shared_dependencies(packages: &dyn PackageManager) -> Result<()> {
    packages.refresh_index()?;
    let specs: Vec<PackageSpec> = BOOTSTRAP_PACKAGES
        .iter()
        .map(|name| PackageSpec::new(*name, None))
        .collect();
    packages.install(&specs)?;
    tracing::debug!("Installed shared dependencies");
    Ok(())
}
