//! Runtime context resolved from global flags
//!
//! Turns the raw command line into concrete directories, a command
//! runner setting and the option map for the event.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tsdb_core::OptionMap;
use tsdb_core::config::OPT_VERSION;
use tsdb_fs::DocumentStore;

use crate::cli::{Cli, OptionArgs};
use crate::error::{CliError, Result};

/// Directory name under the platform data dir
const APP_DIR: &str = "tsdb-unit";

/// Resolved locations and settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub state_dir: PathBuf,
    pub resources_dir: PathBuf,
    pub host_root: PathBuf,
    pub use_sudo: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let state_dir = match &cli.state_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_local_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| {
                    CliError::user("cannot determine a state directory, pass --state-dir")
                })?,
        };
        let resources_dir = cli
            .resources_dir
            .clone()
            .unwrap_or_else(|| state_dir.join("resources"));

        Ok(Self {
            state_dir,
            resources_dir,
            host_root: cli.host_root.clone(),
            use_sudo: !cli.no_sudo,
        })
    }

    /// An absolute host path re-rooted under `host_root`
    pub fn host_path(&self, absolute: &str) -> PathBuf {
        self.host_root.join(absolute.trim_start_matches('/'))
    }
}

/// Build the option map from an optional document plus `KEY=VALUE` overrides
pub fn load_options(args: &OptionArgs) -> Result<OptionMap> {
    let mut options = match &args.file {
        Some(path) => read_options_file(path)?,
        None => OptionMap::new(),
    };

    for assignment in &args.overrides {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            CliError::user(format!("invalid --set '{}', expected KEY=VALUE", assignment))
        })?;
        options.insert(key.trim().to_string(), value.to_string());
    }

    tracing::debug!(count = options.len(), "Loaded options");
    Ok(options)
}

fn read_options_file(path: &Path) -> Result<OptionMap> {
    let raw: BTreeMap<String, Value> = DocumentStore::new().load(path)?;
    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                // Parsed as a float, so "2.10" would silently become "2.1"
                Value::Number(n) if key == OPT_VERSION => {
                    return Err(CliError::user(format!(
                        "option '{}' in {} must be a quoted string, got number {}",
                        key,
                        path.display(),
                        n
                    )));
                }
                Value::Number(n) => n.to_string(),
                Value::Null => String::new(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(CliError::user(format!(
                        "option '{}' in {} must be a scalar",
                        key,
                        path.display()
                    )));
                }
            };
            Ok((key, text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("options.yaml", "from-resources: true\napt-repository: https://a.example/\nversion: \"2.10\"\n")]
    #[case("options.json", r#"{"from-resources": true, "apt-repository": "https://a.example/", "version": "2.10"}"#)]
    #[case("options.toml", "from-resources = true\napt-repository = \"https://a.example/\"\nversion = \"2.10\"\n")]
    fn scalar_values_become_strings(#[case] name: &str, #[case] content: &str) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(name);
        std::fs::write(&path, content).unwrap();

        let options = load_options(&OptionArgs {
            file: Some(path),
            overrides: vec![],
        })
        .unwrap();

        assert_eq!(options["from-resources"], "true");
        assert_eq!(options["apt-repository"], "https://a.example/");
        assert_eq!(options["version"], "2.10");
    }

    #[rstest]
    #[case("options.yaml", "version: 2.10\n")]
    #[case("options.json", r#"{"version": 2.10}"#)]
    #[case("options.toml", "version = 2.10\n")]
    fn unquoted_numeric_version_is_rejected(#[case] name: &str, #[case] content: &str) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(name);
        std::fs::write(&path, content).unwrap();

        let err = load_options(&OptionArgs {
            file: Some(path),
            overrides: vec![],
        })
        .unwrap_err();

        assert!(matches!(err, CliError::User { .. }));
        assert!(err.to_string().contains("must be a quoted string"));
    }

    #[test]
    fn overrides_apply_after_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("options.yaml");
        std::fs::write(&path, "apt-key: https://a.example/key\n").unwrap();

        let options = load_options(&OptionArgs {
            file: Some(path),
            overrides: vec!["apt-key=".into(), "version=2.12.0=1".into()],
        })
        .unwrap();

        assert_eq!(options["apt-key"], "");
        assert_eq!(options["version"], "2.12.0=1");
    }

    #[test]
    fn override_without_equals_is_user_error() {
        let err = load_options(&OptionArgs {
            file: None,
            overrides: vec!["version".into()],
        })
        .unwrap_err();
        assert!(matches!(err, CliError::User { .. }));
    }

    #[test]
    fn nested_values_are_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("options.yaml");
        std::fs::write(&path, "apt-repository:\n  url: https://a.example/\n").unwrap();

        assert!(
            load_options(&OptionArgs {
                file: Some(path),
                overrides: vec![],
            })
            .is_err()
        );
    }

    #[test]
    fn host_path_is_rerooted() {
        let ctx = Context {
            state_dir: PathBuf::from("/state"),
            resources_dir: PathBuf::from("/state/resources"),
            host_root: PathBuf::from("/tmp/root"),
            use_sudo: false,
        };
        assert_eq!(
            ctx.host_path("/etc/apt/sources.list.d/timescaledb.list"),
            PathBuf::from("/tmp/root/etc/apt/sources.list.d/timescaledb.list")
        );
    }
}
