//! core::types
//!
//! Strong types for the time-tracking domain.
//!
//! # Types
//!
//! - [`EntityId`] - Validated remote entity identifier (24 hex characters)
//! - [`HexColor`] - Validated `#rrggbb` color, expanded from `#rgb`
//! - [`ValidationError`] - A field that failed a local rule before any request
//! - Entities: [`Workspace`], [`Client`], [`Project`], [`Task`], [`Tag`],
//!   [`User`], [`TimeEntry`], [`TimeEntryHydrated`]
//!
//! # Wire Format
//!
//! Entities deserialize directly from the service's camelCase JSON. Nullable
//! collections (`tagIds: null`) decode as empty vectors.
//!
//! # Examples
//!
//! ```
//! use clockify_cli::core::types::{EntityId, HexColor};
//!
//! let id = EntityId::parse("project", "5E4117FE8C625F38930D57B7").unwrap();
//! assert_eq!(id.as_str(), "5e4117fe8c625f38930d57b7");
//!
//! let color = HexColor::parse("#0f0").unwrap();
//! assert_eq!(color.as_str(), "#00ff00");
//!
//! assert!(EntityId::parse("project", "not-an-id").is_err());
//! assert!(HexColor::parse("#zzz").is_err());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A local validation failure: `field` broke `rule`.
///
/// Displayed as `"{field} {rule}"`, e.g. `color "#zzz" is not a hex string`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {rule}")]
pub struct ValidationError {
    /// The field or parameter name.
    pub field: String,
    /// The rule that was broken, phrased to follow the field name.
    pub rule: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
        }
    }

    /// Shorthand for a missing required value.
    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, "is required")
    }
}

/// A remote entity identifier.
///
/// Ids are opaque 24-character hexadecimal strings assigned by the service.
/// They are normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Length of every id issued by the service.
    pub const LEN: usize = 24;

    /// Parse and validate an id, naming `field` in the error.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the value is empty or not 24 hex digits.
    pub fn parse(field: &str, value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::required(field));
        }
        if !Self::is_valid(value) {
            return Err(ValidationError::new(
                field,
                format!("\"{value}\" is not a valid id"),
            ));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Check whether `value` has the shape of an id.
    pub fn is_valid(value: &str) -> bool {
        value.len() == Self::LEN && value.chars().all(|c| c.is_ascii_hexdigit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse("id", &s)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate every id in `values`, failing on the first malformed one.
pub fn validate_ids(field: &str, values: &[String]) -> Result<(), ValidationError> {
    for value in values {
        EntityId::parse(field, value)?;
    }
    Ok(())
}

/// A project color in `#rrggbb` form.
///
/// Three-digit inputs are expanded by doubling each nibble (`#0f0` → `#00ff00`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse a color, with or without the leading `#`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] on the `color` field if the value has
    /// non-hex characters or is not 3 or 6 digits long.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let digits = input.trim().trim_start_matches('#');
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::new(
                "color",
                format!("\"{input}\" is not a hex string"),
            ));
        }

        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits.to_string(),
            n => {
                return Err(ValidationError::new(
                    "color",
                    format!("\"{input}\" must have 3 or 6 hex digits, got {n}"),
                ))
            }
        };

        Ok(Self(format!("#{}", expanded.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for HexColor {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decode `null` as the type's default (the service sends `"tagIds": null`).
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// --------------------------------------------------------------------------
// Entities
// --------------------------------------------------------------------------

/// Workspace-level policy applied to time entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceSettings {
    pub force_description: bool,
    pub force_projects: bool,
    pub force_tasks: bool,
    pub force_tags: bool,
    /// Entries starting before this instant can no longer be changed.
    pub lock_time_entries: Option<DateTime<Utc>>,
}

/// The tenant boundary: every other entity is scoped by a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "workspaceSettings")]
    pub settings: WorkspaceSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default)]
    pub archived: bool,
}

/// Hourly rate in the currency's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rate {
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub user_id: String,
    #[serde(default)]
    pub membership_type: String,
    #[serde(default)]
    pub membership_status: String,
    #[serde(default)]
    pub hourly_rate: Option<Rate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub custom_field_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client_name: Option<String>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub billable: bool,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub note: String,
    #[serde(default)]
    pub hourly_rate: Option<Rate>,
    /// Present only on hydrated fetches.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub memberships: Vec<Membership>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_fields: Vec<CustomField>,
}

impl Project {
    /// Client name, or `Without Client` when the project has none.
    pub fn client_label(&self) -> &str {
        match self.client_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "Without Client",
        }
    }
}

/// Task status on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Active,
    Done,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Active => write!(f, "ACTIVE"),
            TaskStatus::Done => write!(f, "DONE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub project_id: String,
    #[serde(default)]
    pub status: TaskStatus,
    /// ISO 8601 duration (`PT2H`), when an estimate is set.
    #[serde(default, deserialize_with = "null_as_default")]
    pub estimate: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assignee_ids: Vec<String>,
    #[serde(default)]
    pub billable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub time_zone: String,
    pub week_start: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub active_workspace: String,
    #[serde(default)]
    pub default_workspace: String,
    #[serde(default)]
    pub settings: UserSettings,
}

/// Start and optional end of a time entry.
///
/// An entry without `end` is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl TimeInterval {
    /// Elapsed time, measured to `now` for an entry still running.
    pub fn duration(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.end.unwrap_or(now) - self.start
    }

    pub fn is_running(&self) -> bool {
        self.end.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: String,
    pub workspace_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_ids: Vec<String>,
    #[serde(default)]
    pub billable: bool,
    pub time_interval: TimeInterval,
    #[serde(default)]
    pub is_locked: bool,
}

/// A time entry with its foreign keys replaced by the current entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryHydrated {
    pub id: String,
    pub workspace_id: String,
    pub description: String,
    pub project: Option<Project>,
    pub task: Option<Task>,
    pub tags: Vec<Tag>,
    pub user: User,
    pub billable: bool,
    pub time_interval: TimeInterval,
    pub is_locked: bool,
}

impl TimeEntryHydrated {
    /// Assemble a hydrated view from an entry and its resolved relations.
    pub fn assemble(
        entry: TimeEntry,
        project: Option<Project>,
        task: Option<Task>,
        tags: Vec<Tag>,
        user: User,
    ) -> Self {
        Self {
            id: entry.id,
            workspace_id: entry.workspace_id,
            description: entry.description,
            project,
            task,
            tags,
            user,
            billable: entry.billable,
            time_interval: entry.time_interval,
            is_locked: entry.is_locked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod entity_id {
        use super::*;

        #[test]
        fn accepts_24_hex_and_lowercases() {
            let id = EntityId::parse("task", "ABCDEF0123456789ABCDEF01").unwrap();
            assert_eq!(id.as_str(), "abcdef0123456789abcdef01");
        }

        #[test]
        fn rejects_empty_as_required() {
            let err = EntityId::parse("workspace", "  ").unwrap_err();
            assert_eq!(err.to_string(), "workspace is required");
        }

        #[test]
        fn rejects_wrong_length_and_non_hex() {
            assert!(EntityId::parse("id", "abc").is_err());
            assert!(EntityId::parse("id", "zzzzzzzzzzzzzzzzzzzzzzzz").is_err());
            assert!(EntityId::parse("id", "5e4117fe8c625f38930d57b7a").is_err());
        }

        #[test]
        fn validate_ids_reports_first_bad_value() {
            let ids = vec![
                "5e4117fe8c625f38930d57b7".to_string(),
                "nope".to_string(),
            ];
            let err = validate_ids("tag", &ids).unwrap_err();
            assert_eq!(err.field, "tag");
            assert!(err.rule.contains("nope"));
        }
    }

    mod hex_color {
        use super::*;

        #[test]
        fn expands_three_digits() {
            assert_eq!(HexColor::parse("#0f0").unwrap().as_str(), "#00ff00");
            assert_eq!(HexColor::parse("ABC").unwrap().as_str(), "#aabbcc");
        }

        #[test]
        fn keeps_six_digits() {
            assert_eq!(HexColor::parse("#12AB9f").unwrap().as_str(), "#12ab9f");
        }

        #[test]
        fn rejects_non_hex() {
            let err = HexColor::parse("#zzz").unwrap_err();
            assert_eq!(err.to_string(), "color \"#zzz\" is not a hex string");
        }

        #[test]
        fn rejects_bad_length() {
            let err = HexColor::parse("#12345").unwrap_err();
            assert!(err.to_string().contains("3 or 6"));
        }
    }

    mod wire {
        use super::*;

        #[test]
        fn time_entry_null_tags_decode_empty() {
            let json = r#"{
                "id": "5e4117fe8c625f38930d57b7",
                "workspaceId": "5e4117fe8c625f38930d57b8",
                "userId": "5e4117fe8c625f38930d57b9",
                "description": null,
                "projectId": null,
                "taskId": null,
                "tagIds": null,
                "billable": false,
                "timeInterval": {"start": "2024-03-01T09:00:00Z", "end": null},
                "isLocked": false
            }"#;
            let entry: TimeEntry = serde_json::from_str(json).unwrap();
            assert!(entry.tag_ids.is_empty());
            assert!(entry.description.is_empty());
            assert!(entry.time_interval.is_running());
        }

        #[test]
        fn workspace_settings_default_when_absent() {
            let ws: Workspace = serde_json::from_str(r#"{"id":"w","name":"Main"}"#).unwrap();
            assert_eq!(ws.settings, WorkspaceSettings::default());
        }

        #[test]
        fn task_status_is_screaming_case() {
            assert_eq!(serde_json::to_string(&TaskStatus::Done).unwrap(), "\"DONE\"");
        }

        #[test]
        fn client_label_falls_back() {
            let project: Project =
                serde_json::from_str(r#"{"id":"p","name":"CLI","clientName":""}"#).unwrap();
            assert_eq!(project.client_label(), "Without Client");
        }
    }
}
