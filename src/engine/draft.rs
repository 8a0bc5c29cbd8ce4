//! engine::draft
//!
//! [`TimeEntryDraft`]: the value the composition pipeline works on.
//!
//! A draft starts empty (new entries) or seeded from an existing entry
//! (edit, clone). Until the resolve step runs, `project_id`, `task_id`,
//! `tag_ids` and `user_id` may hold names instead of ids.

use chrono::{DateTime, Utc};

use crate::core::types::TimeEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeEntryDraft {
    /// Set when the draft edits an existing entry.
    pub id: Option<String>,
    pub workspace: String,
    pub user_id: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub description: String,
    pub project_id: String,
    pub task_id: String,
    pub tag_ids: Vec<String>,
    pub billable: Option<bool>,
}

impl TimeEntryDraft {
    /// An empty draft for a new entry in `workspace`.
    pub fn new(workspace: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// A draft that edits `entry` in place.
    pub fn edit(entry: &TimeEntry) -> Self {
        Self {
            id: Some(entry.id.clone()),
            ..Self::copy_of(entry)
        }
    }

    /// A draft for a new entry with the same values as `entry`.
    pub fn copy_of(entry: &TimeEntry) -> Self {
        Self {
            id: None,
            workspace: entry.workspace_id.clone(),
            user_id: entry.user_id.clone(),
            start: Some(entry.time_interval.start),
            end: entry.time_interval.end,
            description: entry.description.clone(),
            project_id: entry.project_id.clone().unwrap_or_default(),
            task_id: entry.task_id.clone().unwrap_or_default(),
            tag_ids: entry.tag_ids.clone(),
            billable: Some(entry.billable),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub(crate) fn non_empty(value: &str) -> Option<String> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// Values given on the command line. `None` leaves the draft untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFlags {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub project: Option<String>,
    pub task: Option<String>,
    /// Replaces the draft's tags when present.
    pub tags: Option<Vec<String>>,
    pub billable: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TimeInterval;
    use chrono::TimeZone;

    fn entry() -> TimeEntry {
        TimeEntry {
            id: "e1".into(),
            workspace_id: "w1".into(),
            user_id: "u1".into(),
            description: "docs".into(),
            project_id: Some("p1".into()),
            task_id: None,
            tag_ids: vec!["t1".into()],
            billable: true,
            time_interval: TimeInterval {
                start: Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
                end: None,
            },
            is_locked: false,
        }
    }

    #[test]
    fn edit_keeps_id_copy_drops_it() {
        let e = entry();
        assert_eq!(TimeEntryDraft::edit(&e).id.as_deref(), Some("e1"));
        let copy = TimeEntryDraft::copy_of(&e);
        assert!(copy.is_new());
        assert_eq!(copy.project_id, "p1");
        assert_eq!(copy.task_id, "");
        assert_eq!(copy.billable, Some(true));
    }
}
