//! Desired configuration parsed from the flat option map
//!
//! Options arrive fresh with every event as plain strings. Parsing
//! normalises empty strings to "not set" and rejects values that would
//! be unsafe to pass to the package manager.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Toggle selecting artifact-based installation
pub const OPT_FROM_RESOURCES: &str = "from-resources";
/// Package repository URL
pub const OPT_APT_REPOSITORY: &str = "apt-repository";
/// Signing key URL, empty for none
pub const OPT_APT_KEY: &str = "apt-key";
/// Package version pin, empty for latest
pub const OPT_VERSION: &str = "version";

/// Every option name the unit understands
pub const KNOWN_OPTIONS: [&str; 4] = [OPT_FROM_RESOURCES, OPT_APT_REPOSITORY, OPT_APT_KEY, OPT_VERSION];

/// Flat option map as delivered with an event
pub type OptionMap = BTreeMap<String, String>;

// Debian version alphabet; also keeps pins from being read as flags
static VERSION_PIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9][A-Za-z0-9.+~:-]*$").expect("version pin pattern"));

/// Which installation strategy is in effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceMode {
    /// Packages supplied out-of-band as resources
    FromArtifacts,
    /// Packages pulled from a configured repository
    #[default]
    FromRepository,
}

impl SourceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FromArtifacts => "from-artifacts",
            Self::FromRepository => "from-repository",
        }
    }
}

impl std::fmt::Display for SourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration the operator wants applied
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DesiredConfiguration {
    pub source_mode: SourceMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_pin: Option<String>,
}

impl DesiredConfiguration {
    /// Parse and validate an option map.
    ///
    /// A missing repository URL is not an error here; it only matters
    /// once the repository path is chosen (see [`Self::require_repository_url`]).
    /// Unknown options are ignored with a warning.
    pub fn from_options(options: &OptionMap) -> Result<Self> {
        for name in options.keys() {
            if !KNOWN_OPTIONS.contains(&name.as_str()) {
                tracing::warn!(option = %name, "Ignoring unknown option");
            }
        }

        let source_mode = requested_source_mode(options)?;
        let repository_url = non_empty(options, OPT_APT_REPOSITORY)
            .map(|url| validate_url(OPT_APT_REPOSITORY, url))
            .transpose()?;
        let signing_key_url = non_empty(options, OPT_APT_KEY)
            .map(|url| validate_url(OPT_APT_KEY, url))
            .transpose()?;
        let version_pin = non_empty(options, OPT_VERSION)
            .map(validate_pin)
            .transpose()?;

        Ok(Self {
            source_mode,
            repository_url,
            signing_key_url,
            version_pin,
        })
    }

    /// The repository URL, or a configuration error naming the option.
    pub fn require_repository_url(&self) -> Result<&str> {
        self.repository_url
            .as_deref()
            .ok_or_else(|| Error::MissingOption {
                name: OPT_APT_REPOSITORY.to_string(),
            })
    }

    /// Whether the package source (repository or key) differs from `other`
    pub fn source_differs(&self, other: &Self) -> bool {
        self.repository_url != other.repository_url || self.signing_key_url != other.signing_key_url
    }

    /// Whether the version pin differs from `other`
    pub fn pin_differs(&self, other: &Self) -> bool {
        self.version_pin != other.version_pin
    }
}

/// Source mode selected by the `from-resources` toggle alone.
///
/// Other options are neither read nor validated.
pub fn requested_source_mode(options: &OptionMap) -> Result<SourceMode> {
    match non_empty(options, OPT_FROM_RESOURCES) {
        None => Ok(SourceMode::default()),
        Some(value) if parse_bool(OPT_FROM_RESOURCES, value)? => Ok(SourceMode::FromArtifacts),
        Some(_) => Ok(SourceMode::FromRepository),
    }
}

fn non_empty<'a>(options: &'a OptionMap, name: &str) -> Option<&'a str> {
    options
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::InvalidOption {
            name: name.to_string(),
            reason: format!("expected true or false, got '{}'", value),
        }),
    }
}

fn validate_url(name: &str, value: &str) -> Result<String> {
    let has_scheme = value.starts_with("http://") || value.starts_with("https://");
    if !has_scheme || value.chars().any(char::is_whitespace) {
        return Err(Error::InvalidOption {
            name: name.to_string(),
            reason: format!("'{}' is not an http(s) URL", value),
        });
    }
    Ok(value.to_string())
}

fn validate_pin(value: &str) -> Result<String> {
    if !VERSION_PIN.is_match(value) {
        return Err(Error::InvalidOption {
            name: OPT_VERSION.to_string(),
            reason: format!("'{}' is not a package version", value),
        });
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn options(pairs: &[(&str, &str)]) -> OptionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_map_is_repository_mode_with_nothing_set() {
        let desired = DesiredConfiguration::from_options(&OptionMap::new()).unwrap();
        assert_eq!(desired, DesiredConfiguration::default());
        assert_eq!(desired.source_mode, SourceMode::FromRepository);
    }

    #[test]
    fn parses_all_options() {
        let desired = DesiredConfiguration::from_options(&options(&[
            (OPT_FROM_RESOURCES, "false"),
            (OPT_APT_REPOSITORY, "https://packagecloud.io/timescale/timescaledb/ubuntu/"),
            (OPT_APT_KEY, "https://packagecloud.io/timescale/timescaledb/gpgkey"),
            (OPT_VERSION, "2.11.2~ubuntu20.04"),
        ]))
        .unwrap();

        assert_eq!(
            desired,
            DesiredConfiguration {
                source_mode: SourceMode::FromRepository,
                repository_url: Some("https://packagecloud.io/timescale/timescaledb/ubuntu/".into()),
                signing_key_url: Some("https://packagecloud.io/timescale/timescaledb/gpgkey".into()),
                version_pin: Some("2.11.2~ubuntu20.04".into()),
            }
        );
    }

    #[test]
    fn empty_strings_mean_unset() {
        let desired = DesiredConfiguration::from_options(&options(&[
            (OPT_APT_KEY, ""),
            (OPT_VERSION, "  "),
        ]))
        .unwrap();
        assert_eq!(desired.signing_key_url, None);
        assert_eq!(desired.version_pin, None);
    }

    #[rstest]
    #[case("true", SourceMode::FromArtifacts)]
    #[case("True", SourceMode::FromArtifacts)]
    #[case("false", SourceMode::FromRepository)]
    #[case("", SourceMode::FromRepository)]
    fn from_resources_toggle(#[case] value: &str, #[case] expected: SourceMode) {
        let desired =
            DesiredConfiguration::from_options(&options(&[(OPT_FROM_RESOURCES, value)])).unwrap();
        assert_eq!(desired.source_mode, expected);
    }

    #[test]
    fn toggle_is_read_without_validating_other_options() {
        let opts = options(&[
            (OPT_FROM_RESOURCES, "true"),
            (OPT_APT_REPOSITORY, "ftp://mirror.example/"),
            (OPT_VERSION, "--force"),
        ]);
        assert_eq!(requested_source_mode(&opts).unwrap(), SourceMode::FromArtifacts);
        assert!(DesiredConfiguration::from_options(&opts).is_err());
    }

    #[rstest]
    #[case(OPT_FROM_RESOURCES, "maybe")]
    #[case(OPT_APT_REPOSITORY, "ftp://example.com/")]
    #[case(OPT_APT_REPOSITORY, "https://example.com/ focal")]
    #[case(OPT_APT_KEY, "file:///etc/key")]
    #[case(OPT_VERSION, "--allow-downgrades")]
    #[case(OPT_VERSION, "2.11 ; rm -rf /")]
    fn rejects_invalid_values(#[case] name: &str, #[case] value: &str) {
        let err = DesiredConfiguration::from_options(&options(&[(name, value)])).unwrap_err();
        match err {
            Error::InvalidOption { name: got, .. } => assert_eq!(got, name),
            other => panic!("expected InvalidOption, got {:?}", other),
        }
    }

    #[test]
    fn missing_repository_is_reported_on_demand() {
        let desired = DesiredConfiguration::default();
        assert_eq!(
            desired.require_repository_url().unwrap_err().to_string(),
            "missing required option 'apt-repository'"
        );
    }

    #[test]
    fn change_detection() {
        let base = DesiredConfiguration {
            repository_url: Some("https://a.example/".into()),
            ..Default::default()
        };

        let key_changed = DesiredConfiguration {
            signing_key_url: Some("https://a.example/key".into()),
            ..base.clone()
        };
        assert!(key_changed.source_differs(&base));
        assert!(!key_changed.pin_differs(&base));

        let pin_changed = DesiredConfiguration {
            version_pin: Some("2.12.0".into()),
            ..base.clone()
        };
        assert!(!pin_changed.source_differs(&base));
        assert!(pin_changed.pin_differs(&base));
    }
}
