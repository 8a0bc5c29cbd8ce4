//! core::config::schema
//!
//! Configuration schema types and the key registry.
//!
//! # Layers
//!
//! Every source (file, environment, flags) produces a [`ConfigLayer`]: the
//! same set of optional keys. Layers are overlaid in order and the resolved
//! values are read through [`Config`](super::Config) accessors.
//!
//! # Example
//!
//! ```yaml
//! token: abc123
//! workspace: 5f1d0ab2c3e4f5a6b7c8d9e0
//! interactive: true
//! allow-name-for-id: true
//! time-zone: "+02:00"
//! workweek-days: [monday, tuesday, wednesday, thursday, friday]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::timefmt::{parse_weekday, Zone};
use crate::core::types::EntityId;

/// Default service base URL.
pub const DEFAULT_API_URL: &str = "https://api.clockify.me/api/v1";

/// Default number of rows shown by select prompts.
pub const DEFAULT_PAGE_SIZE: u32 = 7;

/// Verbosity of diagnostic logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    None,
    Error,
    Info,
    Debug,
}

impl LogLevel {
    pub const NAMES: [&'static str; 4] = ["none", "error", "info", "debug"];

    /// The matching `tracing` filter directive, if any.
    pub fn directive(&self) -> Option<&'static str> {
        match self {
            LogLevel::None => None,
            LogLevel::Error => Some("error"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" | "" => Ok(LogLevel::None),
            "error" => Ok(LogLevel::Error),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(ConfigError::InvalidValue(format!(
                "invalid log level '{}', must be one of: {}",
                other,
                Self::NAMES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::None => "none",
            LogLevel::Error => "error",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(name)
    }
}

/// One source's view of the configuration. Absent keys defer to lower layers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConfigLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_name_for_id: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_incomplete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_archived_tags: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_task: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_total_duration: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_project_with_client: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_autocomplete_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive_page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workweek_days: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(format!(
            "{key} expects true or false, got '{value}'"
        ))),
    }
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{key} expects a number, got '{value}'")))
}

fn render_bool(v: Option<bool>) -> Option<String> {
    v.map(|b| b.to_string())
}

impl ConfigLayer {
    /// Set `key` from its string form.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownKey`] for keys outside the registry and
    /// [`ConfigError::InvalidValue`] when the value does not parse.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let text = || Some(value.trim().to_string()).filter(|s| !s.is_empty());
        match key {
            "token" => self.token = text(),
            "workspace" => self.workspace = text(),
            "user-id" => self.user_id = text(),
            "log-level" => self.log_level = Some(value.parse()?),
            "interactive" => self.interactive = Some(parse_bool(key, value)?),
            "allow-name-for-id" => self.allow_name_for_id = Some(parse_bool(key, value)?),
            "allow-incomplete" => self.allow_incomplete = Some(parse_bool(key, value)?),
            "allow-archived-tags" => self.allow_archived_tags = Some(parse_bool(key, value)?),
            "show-task" => self.show_task = Some(parse_bool(key, value)?),
            "show-total-duration" => self.show_total_duration = Some(parse_bool(key, value)?),
            "search-project-with-client" => {
                self.search_project_with_client = Some(parse_bool(key, value)?)
            }
            "description-autocomplete-days" => {
                self.description_autocomplete_days = Some(parse_u32(key, value)?)
            }
            "interactive-page-size" => self.interactive_page_size = Some(parse_u32(key, value)?),
            "time-zone" => self.time_zone = text(),
            "workweek-days" => {
                self.workweek_days = Some(
                    value
                        .split(|c: char| c == ',' || c.is_whitespace())
                        .filter(|s| !s.is_empty())
                        .map(|s| s.to_ascii_lowercase())
                        .collect(),
                )
            }
            "lang" => self.lang = text(),
            "api-url" => self.api_url = text(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        self.validate()
    }

    /// Render `key` as a string, `None` when unset in this layer.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            "token" => self.token.clone(),
            "workspace" => self.workspace.clone(),
            "user-id" => self.user_id.clone(),
            "log-level" => self.log_level.map(|l| l.to_string()),
            "interactive" => render_bool(self.interactive),
            "allow-name-for-id" => render_bool(self.allow_name_for_id),
            "allow-incomplete" => render_bool(self.allow_incomplete),
            "allow-archived-tags" => render_bool(self.allow_archived_tags),
            "show-task" => render_bool(self.show_task),
            "show-total-duration" => render_bool(self.show_total_duration),
            "search-project-with-client" => render_bool(self.search_project_with_client),
            "description-autocomplete-days" => {
                self.description_autocomplete_days.map(|n| n.to_string())
            }
            "interactive-page-size" => self.interactive_page_size.map(|n| n.to_string()),
            "time-zone" => self.time_zone.clone(),
            "workweek-days" => self.workweek_days.as_ref().map(|d| d.join(",")),
            "lang" => self.lang.clone(),
            "api-url" => self.api_url.clone(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        };
        Ok(value)
    }

    /// Unset `key` in this layer.
    pub fn clear(&mut self, key: &str) -> Result<(), ConfigError> {
        match key {
            "token" => self.token = None,
            "workspace" => self.workspace = None,
            "user-id" => self.user_id = None,
            "log-level" => self.log_level = None,
            "interactive" => self.interactive = None,
            "allow-name-for-id" => self.allow_name_for_id = None,
            "allow-incomplete" => self.allow_incomplete = None,
            "allow-archived-tags" => self.allow_archived_tags = None,
            "show-task" => self.show_task = None,
            "show-total-duration" => self.show_total_duration = None,
            "search-project-with-client" => self.search_project_with_client = None,
            "description-autocomplete-days" => self.description_autocomplete_days = None,
            "interactive-page-size" => self.interactive_page_size = None,
            "time-zone" => self.time_zone = None,
            "workweek-days" => self.workweek_days = None,
            "lang" => self.lang = None,
            "api-url" => self.api_url = None,
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Overlay every key set in `upper` onto `self`.
    pub fn merge(&mut self, upper: ConfigLayer) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if upper.$field.is_some() { self.$field = upper.$field; })*
            };
        }
        take!(
            token,
            workspace,
            user_id,
            log_level,
            interactive,
            allow_name_for_id,
            allow_incomplete,
            allow_archived_tags,
            show_task,
            show_total_duration,
            search_project_with_client,
            description_autocomplete_days,
            interactive_page_size,
            time_zone,
            workweek_days,
            lang,
            api_url,
        );
    }

    /// Validate the values that have a constrained shape.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, id) in [("workspace", &self.workspace), ("user-id", &self.user_id)] {
            if let Some(id) = id {
                if !EntityId::is_valid(id) {
                    return Err(ConfigError::InvalidValue(format!(
                        "{key} '{id}' is not a valid id"
                    )));
                }
            }
        }

        if let Some(zone) = &self.time_zone {
            Zone::parse(zone).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        }

        if let Some(days) = &self.workweek_days {
            for day in days {
                parse_weekday(day).map_err(|_| {
                    ConfigError::InvalidValue(format!("workweek-days: '{day}' is not a weekday"))
                })?;
            }
        }

        if let Some(size) = self.interactive_page_size {
            if size == 0 {
                return Err(ConfigError::InvalidValue(
                    "interactive-page-size must be at least 1".to_string(),
                ));
            }
        }

        if let Some(url) = &self.api_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "api-url '{url}' must start with http:// or https://"
                )));
            }
        }

        Ok(())
    }
}

/// Help and completion metadata for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    pub description: &'static str,
    pub sample: Option<&'static str>,
}

/// The environment variable that overrides `key`.
pub fn env_var_name(key: &str) -> String {
    format!("CLOCKIFY_{}", key.to_ascii_uppercase().replace('-', "_"))
}

/// Every configuration key, sorted by name.
pub fn keys() -> &'static BTreeMap<&'static str, KeyInfo> {
    static KEYS: OnceLock<BTreeMap<&'static str, KeyInfo>> = OnceLock::new();
    KEYS.get_or_init(|| {
        let entries: [(&str, &str, Option<&str>); 17] = [
            ("token", "API key used to authenticate", None),
            (
                "workspace",
                "workspace to operate on",
                Some("5f1d0ab2c3e4f5a6b7c8d9e0"),
            ),
            (
                "user-id",
                "user whose entries are managed",
                Some("5f1d0ab2c3e4f5a6b7c8d9e1"),
            ),
            ("log-level", "diagnostic logging (none, error, info, debug)", Some("debug")),
            ("interactive", "prompt for missing values", Some("true")),
            (
                "allow-name-for-id",
                "accept names where ids are expected",
                Some("true"),
            ),
            (
                "allow-incomplete",
                "skip required-field workspace policy checks",
                Some("false"),
            ),
            (
                "allow-archived-tags",
                "let archived tags be used on entries",
                Some("false"),
            ),
            ("show-task", "show the task column in entry tables", Some("true")),
            (
                "show-total-duration",
                "print the summed duration under entry tables",
                Some("true"),
            ),
            (
                "search-project-with-client",
                "match project names together with their client name",
                Some("true"),
            ),
            (
                "description-autocomplete-days",
                "days of past entries used to suggest descriptions (0 disables)",
                Some("14"),
            ),
            (
                "interactive-page-size",
                "rows shown by select prompts",
                Some("7"),
            ),
            (
                "time-zone",
                "zone for reading and showing times (Local, UTC, +02:00)",
                Some("Local"),
            ),
            (
                "workweek-days",
                "days counted as work days",
                Some("monday,tuesday,wednesday,thursday,friday"),
            ),
            ("lang", "language tag for number formatting", Some("en")),
            ("api-url", "service base URL", Some(DEFAULT_API_URL)),
        ];
        entries
            .into_iter()
            .map(|(key, description, sample)| (key, KeyInfo { description, sample }))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_sorted_and_complete() {
        let names: Vec<_> = keys().keys().copied().collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);

        let layer = ConfigLayer::default();
        for key in names {
            assert!(layer.get(key).is_ok(), "{key} not handled by get");
        }
    }

    #[test]
    fn set_parses_typed_values() {
        let mut layer = ConfigLayer::default();
        layer.set("interactive", "yes").unwrap();
        layer.set("interactive-page-size", "12").unwrap();
        layer.set("workweek-days", "monday, friday").unwrap();
        layer.set("log-level", "DEBUG").unwrap();

        assert_eq!(layer.interactive, Some(true));
        assert_eq!(layer.interactive_page_size, Some(12));
        assert_eq!(
            layer.workweek_days,
            Some(vec!["monday".to_string(), "friday".to_string()])
        );
        assert_eq!(layer.log_level, Some(LogLevel::Debug));
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut layer = ConfigLayer::default();
        assert!(layer.set("interactive", "maybe").is_err());
        assert!(layer.set("workspace", "not-an-id").is_err());
        assert!(layer.set("time-zone", "Mars").is_err());
        assert!(matches!(
            layer.set("colour", "red"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn merge_only_overrides_set_keys() {
        let mut base = ConfigLayer {
            token: Some("a".into()),
            interactive: Some(true),
            ..Default::default()
        };
        base.merge(ConfigLayer {
            interactive: Some(false),
            ..Default::default()
        });
        assert_eq!(base.token.as_deref(), Some("a"));
        assert_eq!(base.interactive, Some(false));
    }

    #[test]
    fn env_names() {
        assert_eq!(env_var_name("allow-name-for-id"), "CLOCKIFY_ALLOW_NAME_FOR_ID");
        assert_eq!(env_var_name("token"), "CLOCKIFY_TOKEN");
    }

    #[test]
    fn unknown_fields_rejected() {
        let parsed: Result<ConfigLayer, _> = serde_yaml::from_str("tokn: abc\n");
        assert!(parsed.is_err());
    }
}
