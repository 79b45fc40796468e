//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tsdb_core::EventKind;

/// TimescaleDB unit manager - install, configure and upgrade the extension
/// in response to lifecycle events
#[derive(Parser, Debug)]
#[command(name = "tsdb-unit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the persisted unit state
    #[arg(long, global = true, env = "TSDB_UNIT_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Directory holding supplied package resources [default: <state-dir>/resources]
    #[arg(long, global = true, env = "TSDB_UNIT_RESOURCES_DIR")]
    pub resources_dir: Option<PathBuf>,

    /// Root of the host filesystem to probe and write under
    #[arg(long, global = true, env = "TSDB_UNIT_HOST_ROOT", default_value = "/")]
    pub host_root: PathBuf,

    /// Run privileged commands directly instead of through sudo
    #[arg(long, global = true, env = "TSDB_UNIT_NO_SUDO")]
    pub no_sudo: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the option map comes from
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionArgs {
    /// Options document (.yaml, .yml, .json or .toml)
    #[arg(long = "options", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Override a single option, applied after the file
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Handle one lifecycle event
    ///
    /// Exits 0 when the event is resolved and 75 when it should be
    /// redelivered later.
    Hook {
        /// Lifecycle event to handle
        #[arg(value_enum)]
        event: HookEvent,

        #[command(flatten)]
        options: OptionArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show persisted state and the last reported status
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate options without touching the host
    CheckOptions {
        #[command(flatten)]
        options: OptionArgs,
    },
}

/// Lifecycle events accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    Install,
    ConfigChanged,
    UpgradeCharm,
}

impl From<HookEvent> for EventKind {
    fn from(event: HookEvent) -> Self {
        match event {
            HookEvent::Install => EventKind::Install,
            HookEvent::ConfigChanged => EventKind::ConfigChanged,
            HookEvent::UpgradeCharm => EventKind::UpgradeCharm,
        }
    }
}
