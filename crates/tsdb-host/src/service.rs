//! Database service control

use crate::command::{CommandRunner, HostCommand};
use crate::error::Result;

/// Name of the database service unit
pub const DATABASE_SERVICE: &str = "postgresql";

/// Restarting the database and running the extension's tuning utility
pub trait ServiceControl {
    /// Restart a service by name
    fn restart(&self, service: &str) -> Result<()>;

    /// Run the one-shot tuning utility shipped with the extension
    fn tune(&self) -> Result<()>;
}

/// [`ServiceControl`] over `systemctl` and `timescaledb-tune`
#[derive(Debug, Clone, Copy, Default)]
pub struct Systemd {
    runner: CommandRunner,
}

impl Systemd {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    pub fn restart_command(service: &str) -> HostCommand {
        HostCommand::privileged("systemctl", ["restart", service])
    }

    pub fn tune_command() -> HostCommand {
        HostCommand::new("timescaledb-tune", ["-yes"])
    }
}

impl ServiceControl for Systemd {
    fn restart(&self, service: &str) -> Result<()> {
        self.runner.run(&Self::restart_command(service))?;
        Ok(())
    }

    fn tune(&self) -> Result<()> {
        self.runner.run(&Self::tune_command())?;
        Ok(())
    }
}
