//! Status command implementation

use colored::Colorize;
use serde::Serialize;
use tsdb_core::{DesiredConfiguration, FileStateStore, Fingerprints, SourceMode, StateStore};

use crate::context::Context;
use crate::error::Result;
use crate::status_file::{StatusFile, StatusRecord};

#[derive(Debug, Serialize)]
struct StatusView {
    state_dir: String,
    installed: bool,
    source_mode: Option<SourceMode>,
    applied_at: Option<String>,
    last_applied: Option<DesiredConfiguration>,
    fingerprints: Fingerprints,
    last_status: Option<StatusRecord>,
}

/// Show persisted state and the last reported status
pub fn run_status(ctx: &Context, json: bool) -> Result<()> {
    let state = FileStateStore::new(&ctx.state_dir).load()?;
    let last_status = StatusFile::new(&ctx.state_dir).read()?;

    let view = StatusView {
        state_dir: ctx.state_dir.display().to_string(),
        installed: state.installed,
        source_mode: state.installed.then_some(state.source_mode),
        applied_at: state.applied_at.map(|t| t.to_rfc3339()),
        last_applied: state.last_applied,
        fingerprints: state.fingerprints,
        last_status,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", "TimescaleDB Unit Status".bold());
    println!();
    println!("{}:  {}", "State".dimmed(), view.state_dir);

    if !view.installed {
        println!("{}:  {}", "Setup".dimmed(), "not installed".yellow());
    } else {
        let mode = view.source_mode.map(|m| m.to_string()).unwrap_or_default();
        println!("{}:  {} ({})", "Setup".dimmed(), "installed".green(), mode.cyan());
        if let Some(at) = &view.applied_at {
            println!("{}:  {}", "Since".dimmed(), at);
        }
    }

    if let Some(config) = &view.last_applied {
        if let Some(url) = &config.repository_url {
            println!("{}:   {}", "Repo".dimmed(), url);
        }
        if let Some(pin) = &config.version_pin {
            println!("{}:    {}", "Pin".dimmed(), pin);
        }
    }

    if !view.fingerprints.is_empty() {
        println!();
        println!("{}:", "Resources".bold());
        for (name, fingerprint) in &view.fingerprints {
            println!("  {} {} {}", "+".green(), name.cyan(), fingerprint.dimmed());
        }
    }

    println!();
    match &view.last_status {
        Some(record) => println!(
            "{}: {} ({})",
            "Last status".bold(),
            record.status,
            record.reported_at.to_rfc3339()
        ),
        None => println!("{}: {}", "Last status".bold(), "none reported".dimmed()),
    }

    Ok(())
}
