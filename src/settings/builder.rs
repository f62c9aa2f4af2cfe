use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::env::load_env_vars;
use super::SettingsError;
use crate::inject::ParameterValue;

/// A settings source in the loading pipeline.
#[derive(Debug)]
enum SettingsSource {
    File { path: PathBuf, required: bool },
    Env { prefix: String, separator: String },
}

#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    #[serde(default)]
    parameters: BTreeMap<String, toml::Value>,
}

/// Parameter values to bind at the root of a configuration.
///
/// Parameters live under a `[parameters]` table, keyed by qualifier name:
///
/// ```toml
/// [parameters]
/// constant_score = 3.5
/// min_common_users = 2
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    parameters: BTreeMap<String, ParameterValue>,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Parameters in name order.
    pub fn parameters(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.parameters.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// Loads settings from TOML files and environment variables.
///
/// Sources are merged in registration order, later ones overriding earlier
/// ones. Nested tables are merged recursively; other values are replaced.
///
/// ```no_run
/// use recgraph::settings::Settings;
///
/// let settings = Settings::builder()
///     .with_file("config/recommender.toml", true)
///     .with_env("RECSYS", "__")
///     .with_file("config/local.toml", false)
///     .build()?;
/// # Ok::<(), recgraph::settings::SettingsError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct SettingsBuilder {
    sources: Vec<SettingsSource>,
}

impl SettingsBuilder {
    /// Adds a TOML file. A missing required file fails the build; a missing
    /// optional file is skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.sources.push(SettingsSource::File {
            path: path.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// Adds environment variables named `PREFIX<sep>PARAMETERS<sep>NAME`.
    ///
    /// Path segments are lowercased; values are coerced to integer, float,
    /// boolean or string.
    pub fn with_env(mut self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.sources.push(SettingsSource::Env {
            prefix: prefix.into(),
            separator: separator.into(),
        });
        self
    }

    pub fn build(self) -> Result<Settings, SettingsError> {
        let mut merged = toml::Table::new();

        for source in self.sources {
            match source {
                SettingsSource::File { path, required } => {
                    if let Some(table) = load_settings_file(&path, required)? {
                        deep_merge(&mut merged, table);
                    }
                }
                SettingsSource::Env { prefix, separator } => {
                    load_env_vars(&mut merged, &prefix, &separator);
                }
            }
        }

        let raw: RawSettings = toml::Value::Table(merged).try_into()?;
        let mut parameters = BTreeMap::new();
        for (name, value) in raw.parameters {
            let value = scalar(&name, value)?;
            parameters.insert(name, value);
        }
        tracing::debug!(parameters = parameters.len(), "loaded settings");
        Ok(Settings { parameters })
    }
}

fn scalar(name: &str, value: toml::Value) -> Result<ParameterValue, SettingsError> {
    value
        .try_into::<ParameterValue>()
        .map_err(|_| SettingsError::NonScalarParameter(name.to_string()))
}

/// Returns `Ok(None)` if the file doesn't exist and `required` is false.
fn load_settings_file(path: &Path, required: bool) -> Result<Option<toml::Table>, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let table = toml::from_str(&contents).map_err(|e| SettingsError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
            Ok(Some(table))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(SettingsError::FileNotFound(path.to_path_buf()))
            } else {
                tracing::debug!(path = %path.display(), "optional settings file not found");
                Ok(None)
            }
        }
        Err(e) => Err(SettingsError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
