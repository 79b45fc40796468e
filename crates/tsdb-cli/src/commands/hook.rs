//! Hook command implementation

use colored::Colorize;
use serde_json::json;
use tsdb_core::{
    Controller, Disposition, Event, EventKind, FileStateStore, HostServices, Outcome, Unit,
    UnitStatus,
};
use tsdb_host::apt::SOURCES_LIST_FILE;
use tsdb_host::{Apt, AptSources, CommandRunner, DirArtifactSource, FsHostProbe, Systemd};

use crate::context::{Context, load_options};
use crate::cli::OptionArgs;
use crate::error::Result;
use crate::status_file::StatusFile;

/// Dispatch one lifecycle event against the real host
pub fn run_hook(ctx: &Context, kind: EventKind, args: &OptionArgs, json: bool) -> Result<Outcome> {
    let options = load_options(args)?;

    let runner = CommandRunner::new(ctx.use_sudo);
    let probe = FsHostProbe::new(&ctx.host_root);
    let packages = Apt::new(runner);
    let sources = AptSources::new(runner).with_sources_file(ctx.host_path(SOURCES_LIST_FILE));
    let service = Systemd::new(runner);
    let artifacts = DirArtifactSource::new(&ctx.resources_dir);

    let store = FileStateStore::new(&ctx.state_dir);
    let sink = StatusFile::new(&ctx.state_dir);

    let host = HostServices {
        probe: &probe,
        packages: &packages,
        sources: &sources,
        service: &service,
        artifacts: &artifacts,
    };
    let unit = Unit::new(&store, Controller::new(host, &sink), &sink);

    let outcome = unit.dispatch(&Event::new(kind, options));
    print_outcome(kind, &outcome, json)?;
    Ok(outcome)
}

fn print_outcome(kind: EventKind, outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        let value = json!({
            "event": kind.as_str(),
            "status": outcome.status,
            "disposition": outcome.disposition,
            "committed": outcome.committed,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let line = match &outcome.status {
        None => "no change".dimmed().to_string(),
        Some(status) => colorize(status),
    };
    match outcome.disposition {
        Disposition::Resolved => println!("{} {}", kind.as_str().cyan(), line),
        Disposition::Defer => println!("{} {} {}", kind.as_str().cyan(), line, "(deferred)".yellow()),
    }
    Ok(())
}

fn colorize(status: &UnitStatus) -> String {
    let text = status.to_string();
    match status {
        UnitStatus::Active => text.green().to_string(),
        UnitStatus::Maintenance(_) => text.cyan().to_string(),
        UnitStatus::Waiting(_) => text.yellow().to_string(),
        UnitStatus::Blocked(_) => text.red().bold().to_string(),
    }
}
