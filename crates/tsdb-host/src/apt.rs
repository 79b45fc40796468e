//! Debian package manager and package sources

use std::fmt;
use std::path::{Path, PathBuf};

use crate::command::{CommandRunner, HostCommand};
use crate::error::{Error, Result};

/// Source descriptor file owned by this unit
pub const SOURCES_LIST_FILE: &str = "/etc/apt/sources.list.d/timescaledb.list";

/// A package name with an optional version pin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub version: Option<String>,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>, version: Option<&str>) -> Self {
        Self {
            name: name.into(),
            version: version.filter(|v| !v.is_empty()).map(str::to_string),
        }
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}={}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Host package manager operations. Each call is all-or-nothing.
pub trait PackageManager {
    /// Refresh the package index
    fn refresh_index(&self) -> Result<()>;

    /// Install packages by name, honouring version pins
    fn install(&self, packages: &[PackageSpec]) -> Result<()>;

    /// Install a package from a local file
    fn install_local(&self, path: &Path) -> Result<()>;

    /// Upgrade everything installed
    fn dist_upgrade(&self) -> Result<()>;
}

/// [`PackageManager`] over `apt-get` and `dpkg`
#[derive(Debug, Clone, Copy, Default)]
pub struct Apt {
    runner: CommandRunner,
}

impl Apt {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    pub fn update_command() -> HostCommand {
        HostCommand::privileged("apt-get", ["update", "-qq"])
    }

    pub fn install_command(packages: &[PackageSpec]) -> HostCommand {
        let mut args = vec!["install".to_string(), "-y".to_string()];
        args.extend(packages.iter().map(ToString::to_string));
        HostCommand::privileged("apt-get", args)
    }

    pub fn install_local_command(path: &Path) -> HostCommand {
        HostCommand::privileged("dpkg", ["-i".to_string(), path.display().to_string()])
    }

    pub fn dist_upgrade_command() -> HostCommand {
        HostCommand::privileged("apt-get", ["dist-upgrade", "-y"])
    }
}

impl PackageManager for Apt {
    fn refresh_index(&self) -> Result<()> {
        self.runner.run(&Self::update_command())?;
        Ok(())
    }

    fn install(&self, packages: &[PackageSpec]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        self.runner.run(&Self::install_command(packages))?;
        Ok(())
    }

    fn install_local(&self, path: &Path) -> Result<()> {
        self.runner.run(&Self::install_local_command(path))?;
        Ok(())
    }

    fn dist_upgrade(&self) -> Result<()> {
        self.runner.run(&Self::dist_upgrade_command())?;
        Ok(())
    }
}

/// Package source registration
pub trait SourceRegistry {
    /// Release codename of the host distribution (e.g. `focal`)
    fn release_codename(&self) -> Result<String>;

    /// Replace the unit's source descriptor with a single line
    fn register_source(&self, line: &str) -> Result<()>;

    /// Fetch a key from `url` and add it to the trusted keyring
    fn import_key(&self, url: &str) -> Result<()>;
}

/// [`SourceRegistry`] over `lsb_release`, `tee`, `wget` and `apt-key`
#[derive(Debug, Clone)]
pub struct AptSources {
    runner: CommandRunner,
    sources_file: PathBuf,
}

impl Default for AptSources {
    fn default() -> Self {
        Self::new(CommandRunner::default())
    }
}

impl AptSources {
    pub fn new(runner: CommandRunner) -> Self {
        Self {
            runner,
            sources_file: PathBuf::from(SOURCES_LIST_FILE),
        }
    }

    /// Use a different descriptor path
    pub fn with_sources_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources_file = path.into();
        self
    }

    pub fn sources_file(&self) -> &Path {
        &self.sources_file
    }
}

impl SourceRegistry for AptSources {
    fn release_codename(&self) -> Result<String> {
        let command = HostCommand::new("lsb_release", ["-c", "-s"]);
        let output = self.runner.run(&command)?;
        let codename = output.stdout.trim().to_string();
        if codename.is_empty() {
            return Err(Error::UnexpectedOutput {
                command: command.to_string(),
                output: output.stdout,
            });
        }
        Ok(codename)
    }

    fn register_source(&self, line: &str) -> Result<()> {
        let content = format!("{}\n", line);

        if self.runner.uses_sudo() {
            let command = HostCommand::privileged(
                "tee",
                [self.sources_file.display().to_string()],
            );
            self.runner.run_with_stdin(&command, Some(content.as_bytes()))?;
        } else {
            // Already privileged; no need to spawn tee
            tsdb_fs::io::write_text(&self.sources_file, &content)?;
        }

        tracing::info!(file = %self.sources_file.display(), "Registered package source");
        Ok(())
    }

    fn import_key(&self, url: &str) -> Result<()> {
        let fetch = HostCommand::new("wget", ["--quiet", "-O", "-", url]);
        let key = self.runner.run(&fetch)?;

        let add = HostCommand::privileged("apt-key", ["add", "-"]);
        self.runner.run_with_stdin(&add, Some(key.stdout.as_bytes()))?;

        tracing::info!(url, "Imported package signing key");
        Ok(())
    }
}
