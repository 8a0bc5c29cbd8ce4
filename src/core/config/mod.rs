//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. `CLOCKIFY_<KEY>` environment variables
//! 4. CLI flags (applied with [`Config::apply_overrides`])
//!
//! # Config File Location
//!
//! `--config <path>` when given, otherwise the first of
//! `~/.clockify-cli.yaml`, `.yml`, `.json`, `.toml` that exists. New files
//! are written to `~/.clockify-cli.yaml`. The suffix selects the encoding.
//!
//! # Example
//!
//! ```no_run
//! use clockify_cli::core::config::Config;
//!
//! let mut config = Config::load(None).unwrap();
//! config.set("interactive", "true").unwrap();
//! config.save().unwrap();
//! println!("workspace: {:?}", config.workspace());
//! ```

pub mod schema;

pub use schema::{env_var_name, keys, ConfigLayer, KeyInfo, LogLevel};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Weekday;
use thiserror::Error;

use crate::core::timefmt::{parse_weekday, Zone};

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown config key '{0}'")]
    UnknownKey(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// File encodings, chosen by suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Format::Json,
            Some("toml") => Format::Toml,
            _ => Format::Yaml,
        }
    }
}

const FILE_STEM: &str = ".clockify-cli";
const SUFFIXES: [&str; 4] = ["yaml", "yml", "json", "toml"];

/// Resolved configuration for one command run.
///
/// The persisted layer is what [`save`](Config::save) writes; the overlay
/// holds environment and flag values, which are never persisted.
#[derive(Debug, Clone, Default)]
pub struct Config {
    file: ConfigLayer,
    overlay: ConfigLayer,
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the file and process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed, or
    /// an environment variable carries an invalid value. A missing file is
    /// not an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Self::discover()?,
        };
        Self::load_from(path, std::env::vars())
    }

    /// Load from a given path and environment. Used by [`load`](Self::load)
    /// and tests.
    pub fn load_from(
        path: Option<PathBuf>,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ConfigError> {
        let file = match &path {
            Some(p) if p.exists() => Self::read_layer(p)?,
            _ => ConfigLayer::default(),
        };

        let env: std::collections::HashMap<String, String> = env.into_iter().collect();
        let mut overlay = ConfigLayer::default();
        for key in keys().keys() {
            let name = env_var_name(key);
            if let Some(value) = env.get(&name) {
                overlay.set(key, value).map_err(|e| match e {
                    ConfigError::InvalidValue(msg) => {
                        ConfigError::InvalidValue(format!("{name}: {msg}"))
                    }
                    other => other,
                })?;
            }
        }

        Ok(Self {
            file,
            overlay,
            path,
        })
    }

    /// The first existing `~/.clockify-cli.<suffix>`, or the canonical
    /// write location when none exists.
    fn discover() -> Result<Option<PathBuf>, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        let existing = SUFFIXES
            .iter()
            .map(|s| home.join(format!("{FILE_STEM}.{s}")))
            .find(|p| p.is_file());
        Ok(Some(
            existing.unwrap_or_else(|| home.join(format!("{FILE_STEM}.yaml"))),
        ))
    }

    fn read_layer(path: &Path) -> Result<ConfigLayer, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let parse_err = |message: String| ConfigError::ParseError {
            path: path.to_path_buf(),
            message,
        };

        let layer: ConfigLayer = if contents.trim().is_empty() {
            ConfigLayer::default()
        } else {
            match Format::of(path) {
                Format::Json => serde_json::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
                Format::Toml => toml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
                Format::Yaml => serde_yaml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
            }
        };
        layer.validate()?;
        Ok(layer)
    }

    /// Overlay flag values. Flags win over file and environment.
    pub fn apply_overrides(&mut self, flags: ConfigLayer) {
        self.overlay.merge(flags);
    }

    /// Where the config file was read from, or will be written to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Set a key in the persisted layer. The new value also wins over any
    /// environment or flag value for the rest of the run.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.file.set(key, value)?;
        self.overlay.clear(key)
    }

    /// The resolved value of `key`, rendered as a string.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match self.overlay.get(key)? {
            Some(v) => Ok(Some(v)),
            None => self.file.get(key),
        }
    }

    /// Every key with its resolved value, sorted by key.
    pub fn entries(&self) -> Result<Vec<(&'static str, Option<String>)>, ConfigError> {
        keys()
            .keys()
            .map(|k| self.get(k).map(|v| (*k, v)))
            .collect()
    }

    /// Persist the file layer to [`path`](Self::path).
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = match &self.path {
            Some(p) => p.clone(),
            None => Self::discover()?.ok_or(ConfigError::NoHomeDir)?,
        };
        Self::write_config_atomic(&path, &self.file)?;
        Ok(path)
    }

    /// Write a config file atomically.
    fn write_config_atomic(path: &Path, layer: &ConfigLayer) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents = match Format::of(path) {
            Format::Json => serde_json::to_string_pretty(layer).map_err(|e| e.to_string()),
            Format::Toml => toml::to_string_pretty(layer).map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml::to_string(layer).map_err(|e| e.to_string()),
        }
        .map_err(ConfigError::InvalidValue)?;

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;
        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    fn pick<'a, T>(&'a self, f: impl Fn(&'a ConfigLayer) -> &'a Option<T>) -> Option<&'a T> {
        f(&self.overlay).as_ref().or_else(|| f(&self.file).as_ref())
    }

    pub fn token(&self) -> Option<&str> {
        self.pick(|l| &l.token).map(String::as_str)
    }

    pub fn workspace(&self) -> Option<&str> {
        self.pick(|l| &l.workspace).map(String::as_str)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.pick(|l| &l.user_id).map(String::as_str)
    }

    pub fn log_level(&self) -> LogLevel {
        self.pick(|l| &l.log_level).copied().unwrap_or_default()
    }

    /// Defaults to false.
    pub fn interactive(&self) -> bool {
        self.pick(|l| &l.interactive).copied().unwrap_or(false)
    }

    pub fn allow_name_for_id(&self) -> bool {
        self.pick(|l| &l.allow_name_for_id).copied().unwrap_or(false)
    }

    pub fn allow_incomplete(&self) -> bool {
        self.pick(|l| &l.allow_incomplete).copied().unwrap_or(false)
    }

    pub fn allow_archived_tags(&self) -> bool {
        self.pick(|l| &l.allow_archived_tags).copied().unwrap_or(false)
    }

    pub fn show_task(&self) -> bool {
        self.pick(|l| &l.show_task).copied().unwrap_or(false)
    }

    pub fn show_total_duration(&self) -> bool {
        self.pick(|l| &l.show_total_duration).copied().unwrap_or(false)
    }

    pub fn search_project_with_client(&self) -> bool {
        self.pick(|l| &l.search_project_with_client)
            .copied()
            .unwrap_or(false)
    }

    pub fn description_autocomplete_days(&self) -> u32 {
        self.pick(|l| &l.description_autocomplete_days)
            .copied()
            .unwrap_or(0)
    }

    pub fn interactive_page_size(&self) -> u32 {
        self.pick(|l| &l.interactive_page_size)
            .copied()
            .unwrap_or(schema::DEFAULT_PAGE_SIZE)
    }

    /// Validated on load, so a bad value here falls back to local time.
    pub fn time_zone(&self) -> Zone {
        self.pick(|l| &l.time_zone)
            .and_then(|z| Zone::parse(z).ok())
            .unwrap_or_default()
    }

    /// Monday to Friday unless configured.
    pub fn workweek_days(&self) -> Vec<Weekday> {
        match self.pick(|l| &l.workweek_days) {
            Some(days) => days.iter().filter_map(|d| parse_weekday(d).ok()).collect(),
            None => vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }

    pub fn lang(&self) -> &str {
        self.pick(|l| &l.lang).map(String::as_str).unwrap_or("en")
    }

    pub fn api_url(&self) -> &str {
        self.pick(|l| &l.api_url)
            .map(String::as_str)
            .unwrap_or(schema::DEFAULT_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn load_empty_defaults() {
        let config = Config::load_from(None, env(&[])).unwrap();
        assert!(config.token().is_none());
        assert!(!config.interactive());
        assert_eq!(config.interactive_page_size(), 7);
        assert_eq!(config.api_url(), schema::DEFAULT_API_URL);
        assert_eq!(config.time_zone(), Zone::Local);
        assert_eq!(config.workweek_days().len(), 5);
    }

    #[test]
    fn load_yaml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".clockify-cli.yaml");
        fs::write(
            &path,
            "token: abc\ninteractive: true\ntime-zone: UTC\nworkweek-days: [monday]\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path), env(&[])).unwrap();
        assert_eq!(config.token(), Some("abc"));
        assert!(config.interactive());
        assert_eq!(config.time_zone(), Zone::Utc);
        assert_eq!(config.workweek_days(), vec![Weekday::Mon]);
    }

    #[test]
    fn env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".clockify-cli.json");
        fs::write(&path, r#"{"token": "from-file", "show-task": false}"#).unwrap();

        let config = Config::load_from(
            Some(path),
            env(&[("CLOCKIFY_TOKEN", "from-env"), ("CLOCKIFY_SHOW_TASK", "1")]),
        )
        .unwrap();
        assert_eq!(config.token(), Some("from-env"));
        assert!(config.show_task());
    }

    #[test]
    fn flags_override_env() {
        let mut config =
            Config::load_from(None, env(&[("CLOCKIFY_INTERACTIVE", "true")])).unwrap();
        config.apply_overrides(ConfigLayer {
            interactive: Some(false),
            ..Default::default()
        });
        assert!(!config.interactive());
    }

    #[test]
    fn bad_env_value_names_variable() {
        let err = Config::load_from(None, env(&[("CLOCKIFY_INTERACTIVE", "sometimes")]))
            .unwrap_err();
        assert!(err.to_string().contains("CLOCKIFY_INTERACTIVE"));
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".clockify-cli.toml");
        fs::write(&path, "token = \"a\"\nunknown_field = true\n").unwrap();
        assert!(Config::load_from(Some(path), env(&[])).is_err());
    }

    #[test]
    fn set_and_save_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".clockify-cli.yaml");

        let mut config = Config::load_from(
            Some(path.clone()),
            env(&[("CLOCKIFY_ALLOW_NAME_FOR_ID", "false")]),
        )
        .unwrap();
        config.set("allow-name-for-id", "true").unwrap();
        config.set("workspace", "5f1d0ab2c3e4f5a6b7c8d9e0").unwrap();
        assert!(config.allow_name_for_id());

        let written = config.save().unwrap();
        assert_eq!(written, path);
        assert!(!temp.path().join(".clockify-cli.yaml.tmp").exists());

        let reloaded = Config::load_from(Some(path), env(&[])).unwrap();
        assert!(reloaded.allow_name_for_id());
        assert_eq!(reloaded.workspace(), Some("5f1d0ab2c3e4f5a6b7c8d9e0"));
    }

    #[test]
    fn entries_are_sorted() {
        let config = Config::load_from(None, env(&[])).unwrap();
        let entries = config.entries().unwrap();
        assert_eq!(entries.first().map(|e| e.0), Some("allow-archived-tags"));
        assert_eq!(entries.len(), keys().len());
    }
}
