//! Lifecycle core for the TimescaleDB unit manager
//!
//! Decides, for each lifecycle event, which installation path applies
//! and drives the host through it:
//!
//! - **Configuration**: option map parsing and validation
//! - **Selector**: pure choice between artifact install, repository
//!   setup, package-only install or nothing
//! - **Backends**: artifact and repository installers over the host traits
//! - **Controller**: event handling, status and defer decisions
//! - **Unit**: load, handle, commit, report
//!
//! # Architecture
//!
//! ```text
//!            tsdb-cli
//!               |
//!           tsdb-core
//!               |
//!       +-------+-------+
//!       |               |
//!    tsdb-fs        tsdb-host
//! ```

pub mod artifact;
pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod selector;
pub mod state;
pub mod status;
pub mod unit;

pub use artifact::{ArtifactAvailability, ArtifactName, ArtifactSet, Fingerprints};
pub use config::{DesiredConfiguration, OptionMap, SourceMode};
pub use controller::{Controller, Event, EventKind, HostServices, Transition};
pub use error::{Error, Result};
pub use selector::{Action, select};
pub use state::{AppliedState, FileStateStore, StateStore};
pub use status::{Disposition, StatusSink, UnitStatus};
pub use unit::{Outcome, Unit};
