//! Synchronous external command execution
//!
//! Commands block until they exit. There is no timeout: a hung package
//! manager hangs the caller.

use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// A command line to run on the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    /// Program name or path
    pub program: String,
    /// Arguments passed verbatim
    pub args: Vec<String>,
    /// Whether the command needs root and should go through `sudo`
    pub privileged: bool,
}

impl HostCommand {
    /// An unprivileged command
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            privileged: false,
        }
    }

    /// A command that needs root
    pub fn privileged<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            privileged: true,
            ..Self::new(program, args)
        }
    }

    /// The full argv as it will be executed
    pub fn argv(&self, use_sudo: bool) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        if self.privileged && use_sudo {
            argv.push("sudo".to_string());
        }
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured output of a successful command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs [`HostCommand`]s, prefixing privileged ones with `sudo` unless
/// disabled.
#[derive(Debug, Clone, Copy)]
pub struct CommandRunner {
    use_sudo: bool,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self { use_sudo: true }
    }
}

impl CommandRunner {
    pub fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    /// Whether privileged commands are wrapped in `sudo`
    pub fn uses_sudo(&self) -> bool {
        self.use_sudo
    }

    /// Run a command to completion.
    ///
    /// Non-zero exit is an [`Error::CommandFailed`] carrying stderr (or
    /// stdout when stderr is empty).
    pub fn run(&self, command: &HostCommand) -> Result<CommandOutput> {
        self.run_with_stdin(command, None)
    }

    /// Run a command, feeding `stdin` to it when given.
    pub fn run_with_stdin(
        &self,
        command: &HostCommand,
        stdin: Option<&[u8]>,
    ) -> Result<CommandOutput> {
        let argv = command.argv(self.use_sudo);
        let rendered = argv.join(" ");
        tracing::debug!(command = %rendered, "Running host command");

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            command: rendered.clone(),
            source,
        })?;

        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input).map_err(|source| Error::Spawn {
                    command: rendered.clone(),
                    source,
                })?;
                // Dropping the pipe closes it so the child sees EOF
            }
        }

        let output = child.wait_with_output().map_err(|source| Error::Spawn {
            command: rendered.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            let diagnostic = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            tracing::debug!(command = %rendered, code = ?output.status.code(), "Host command failed");
            Err(Error::CommandFailed {
                command: rendered,
                code: output.status.code().unwrap_or(-1),
                stderr: diagnostic,
            })
        }
    }
}
