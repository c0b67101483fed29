use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cogscreen_core::{SettingOverride, TestConfiguration, TestVariant};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("override `{0}` is not of the form label=value")]
    Override(String),
}

/// Host configuration file.
///
/// ```toml
/// [run]
/// variant = "cpt"
/// seed = 7
///
/// [[overrides]]
/// label = "targetProbability"
/// value = 0.5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub run: RunSection,
    /// Applied in order; a later entry for the same label wins.
    #[serde(default)]
    pub overrides: Vec<OverrideEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    pub variant: TestVariant,
    /// Run against the wall clock instead of stepping a virtual one.
    pub realtime: bool,
    pub seed: Option<u64>,
    /// Where to write the JSON summary.
    pub output: Option<PathBuf>,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            variant: TestVariant::Cpt,
            realtime: false,
            seed: None,
            output: None,
        }
    }
}

/// One `{label, value}` pair. Values may be written as any TOML scalar or
/// array; the resolver infers the type from the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub label: String,
    pub value: toml::Value,
}

impl OverrideEntry {
    pub fn to_override(&self) -> SettingOverride {
        SettingOverride::new(self.label.clone(), value_text(&self.value))
    }
}

fn value_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

impl AppConfig {
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn setting_overrides(&self) -> Vec<SettingOverride> {
        self.overrides.iter().map(OverrideEntry::to_override).collect()
    }

    /// Resolves the overrides onto the variant defaults.
    pub fn test_configuration(&self) -> TestConfiguration {
        cogscreen_engine::resolve(self.run.variant, &self.setting_overrides())
    }
}

/// Parses a `--set label=value` argument.
pub fn parse_override(arg: &str) -> Result<SettingOverride, ConfigError> {
    match arg.split_once('=') {
        Some((label, value)) if !label.trim().is_empty() => {
            Ok(SettingOverride::new(label.trim(), value.trim()))
        }
        _ => Err(ConfigError::Override(arg.to_string())),
    }
}
