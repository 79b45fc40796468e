//! Host collaborators for the TimescaleDB unit manager
//!
//! Every interaction with the machine the unit runs on goes through one
//! of the narrow capability traits defined here:
//!
//! - [`HostProbe`]: prerequisite and per-version on-disk markers
//! - [`PackageManager`]: index refresh, installs, point installs, upgrades
//! - [`SourceRegistry`]: package source descriptor and trust keys
//! - [`ServiceControl`]: database restart and the tuning utility
//! - [`ArtifactSource`]: out-of-band package files
//!
//! The real implementations shell out through [`CommandRunner`]. Tests
//! substitute recording fakes for the traits.

pub mod apt;
pub mod artifact;
pub mod command;
pub mod error;
pub mod probe;
pub mod service;

pub use apt::{Apt, AptSources, PackageManager, PackageSpec, SourceRegistry};
pub use artifact::{Artifact, ArtifactSource, DirArtifactSource};
pub use command::{CommandOutput, CommandRunner, HostCommand};
pub use error::{Error, Result};
pub use probe::{FsHostProbe, HostProbe};
pub use service::{ServiceControl, Systemd};
