//! Check-options command implementation

use colored::Colorize;
use tsdb_core::DesiredConfiguration;

use crate::cli::OptionArgs;
use crate::context::load_options;
use crate::error::Result;

/// Parse and validate the option map, printing the resulting configuration
pub fn run_check_options(args: &OptionArgs) -> Result<()> {
    let options = load_options(args)?;
    let desired = DesiredConfiguration::from_options(&options)?;

    println!("{}", "Options valid".green().bold());
    println!();
    println!("{}:   {}", "Source".dimmed(), desired.source_mode.to_string().cyan());
    println!("{}:     {}", "Repo".dimmed(), show(desired.repository_url.as_deref()));
    println!("{}:      {}", "Key".dimmed(), show(desired.signing_key_url.as_deref()));
    println!("{}:  {}", "Version".dimmed(), show(desired.version_pin.as_deref()));
    Ok(())
}

fn show(value: Option<&str>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "(not set)".dimmed().to_string(),
    }
}
