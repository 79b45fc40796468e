use tsdb_fs::compute_bytes_checksum;
use tsdb_host::{PackageManager, ServiceControl, service::DATABASE_SERVICE};

use crate::Result;
use crate::artifact::{ArtifactSet, Fingerprints};

/// Installs supplied package files, skipping those already installed
/// with identical content.
pub struct ArtifactInstaller<'a> {
    packages: &'a dyn PackageManager,
    service: &'a dyn ServiceControl,
}

impl<'a> ArtifactInstaller<'a> {
    pub fn new(packages: &'a dyn PackageManager, service: &'a dyn ServiceControl) -> Self {
        Self { packages, service }
    }

    /// Point-install every artifact whose fingerprint differs from
    /// `previous`, then tune and restart if anything was installed.
    ///
    /// Returns the fingerprints of the full set. When nothing changed no
    /// host command runs at all.
    pub fn install(&self, set: &ArtifactSet, previous: &Fingerprints) -> Result<Fingerprints> {
        let mut fingerprints = Fingerprints::new();
        let mut installed = 0usize;

        for (name, artifact) in set.iter() {
            let fingerprint = compute_bytes_checksum(&artifact.content);
            if previous.get(name.as_str()) == Some(&fingerprint) {
                tracing::debug!(artifact = %name, "Unchanged, skipping");
            } else {
                tracing::info!(artifact = %name, path = %artifact.path.display(), "Installing resource");
                self.packages.install_local(&artifact.path)?;
                installed += 1;
            }
            fingerprints.insert(name.as_str().to_string(), fingerprint);
        }

        if installed > 0 {
            self.service.tune()?;
            self.service.restart(DATABASE_SERVICE)?;
        }
        tracing::info!(installed, "Resource install finished");

        Ok(fingerprints)
    }
}
