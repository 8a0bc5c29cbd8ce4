//! api::params
//!
//! Parameter structs for every [`Api`](super::Api) operation.
//!
//! Each struct validates its own shape (`validate()`): the workspace is
//! required and well formed, any id is 24 hex digits, and cross-entity
//! references (a task needs its project) are checked before a request is
//! built. Optional fields left `None` are not sent.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::pagination::PaginationParam;
use crate::core::timefmt::Zone;
use crate::core::types::{validate_ids, EntityId, TaskStatus, ValidationError};

fn id(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    EntityId::parse(field, value).map(|_| ())
}

fn opt_id(field: &str, value: &Option<String>) -> Result<(), ValidationError> {
    match value {
        Some(v) => id(field, v),
        None => Ok(()),
    }
}

fn name(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

// --------------------------------------------------------------------------
// Workspaces and users
// --------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct GetWorkspaces {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GetWorkspace {
    pub workspace: String,
}

impl GetWorkspace {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkspaceUsers {
    pub workspace: String,
    pub email: Option<String>,
    pub pagination: PaginationParam,
}

impl WorkspaceUsers {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        self.pagination.validate()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetUser {
    pub workspace: String,
    pub user_id: String,
}

impl GetUser {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("user", &self.user_id)
    }
}

// --------------------------------------------------------------------------
// Clients
// --------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct GetClients {
    pub workspace: String,
    pub name: Option<String>,
    pub archived: Option<bool>,
    pub pagination: PaginationParam,
}

impl GetClients {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        self.pagination.validate()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetClient {
    pub workspace: String,
    pub client_id: String,
}

impl GetClient {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("client", &self.client_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AddClient {
    pub workspace: String,
    pub name: String,
}

impl AddClient {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        name("name", &self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateClient {
    pub workspace: String,
    pub client_id: String,
    pub name: Option<String>,
    pub archived: Option<bool>,
}

impl UpdateClient {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("client", &self.client_id)?;
        if let Some(n) = &self.name {
            name("name", n)?;
        }
        Ok(())
    }
}

// --------------------------------------------------------------------------
// Projects
// --------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct GetProjects {
    pub workspace: String,
    pub name: Option<String>,
    /// Only projects of these clients.
    pub clients: Vec<String>,
    pub archived: Option<bool>,
    /// Include tasks, memberships and custom fields.
    pub hydrate: bool,
    pub pagination: PaginationParam,
}

impl GetProjects {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        validate_ids("client", &self.clients)?;
        self.pagination.validate()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetProject {
    pub workspace: String,
    pub project_id: String,
    pub hydrate: bool,
}

impl GetProject {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("project", &self.project_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AddProject {
    pub workspace: String,
    pub name: String,
    pub client_id: Option<String>,
    /// `#RGB` or `#RRGGBB`.
    pub color: Option<String>,
    pub billable: bool,
    pub public: bool,
    pub note: Option<String>,
}

impl AddProject {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        name("name", &self.name)?;
        opt_id("client", &self.client_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub workspace: String,
    pub project_id: String,
    pub name: Option<String>,
    pub client_id: Option<String>,
    pub color: Option<String>,
    pub billable: Option<bool>,
    pub public: Option<bool>,
    pub archived: Option<bool>,
    pub note: Option<String>,
}

impl UpdateProject {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("project", &self.project_id)?;
        if let Some(n) = &self.name {
            name("name", n)?;
        }
        opt_id("client", &self.client_id)
    }
}

// --------------------------------------------------------------------------
// Tasks
// --------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct GetTasks {
    pub workspace: String,
    pub project_id: String,
    pub name: Option<String>,
    /// `Some(true)` for active only, `Some(false)` for done only.
    pub active: Option<bool>,
    pub pagination: PaginationParam,
}

impl GetTasks {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("project", &self.project_id)?;
        self.pagination.validate()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetTask {
    pub workspace: String,
    pub project_id: String,
    pub task_id: String,
}

impl GetTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("project", &self.project_id)?;
        id("task", &self.task_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AddTask {
    pub workspace: String,
    pub project_id: String,
    pub name: String,
    pub assignee_ids: Vec<String>,
    pub estimate: Option<Duration>,
    pub billable: Option<bool>,
}

impl AddTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("project", &self.project_id)?;
        name("name", &self.name)?;
        validate_ids("assignee", &self.assignee_ids)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub workspace: String,
    pub project_id: String,
    pub task_id: String,
    /// Kept unchanged when `None`.
    pub name: Option<String>,
    /// Replaces the assignees when `Some`.
    pub assignee_ids: Option<Vec<String>>,
    pub estimate: Option<Duration>,
    pub billable: Option<bool>,
    pub status: Option<TaskStatus>,
}

impl UpdateTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("project", &self.project_id)?;
        id("task", &self.task_id)?;
        if let Some(n) = &self.name {
            name("name", n)?;
        }
        if let Some(ids) = &self.assignee_ids {
            validate_ids("assignee", ids)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteTask {
    pub workspace: String,
    pub project_id: String,
    pub task_id: String,
}

impl DeleteTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("project", &self.project_id)?;
        id("task", &self.task_id)
    }
}

// --------------------------------------------------------------------------
// Tags
// --------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct GetTags {
    pub workspace: String,
    pub name: Option<String>,
    pub archived: Option<bool>,
    pub pagination: PaginationParam,
}

impl GetTags {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        self.pagination.validate()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetTag {
    pub workspace: String,
    pub tag_id: String,
}

impl GetTag {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("tag", &self.tag_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AddTag {
    pub workspace: String,
    pub name: String,
}

impl AddTag {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        name("name", &self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTag {
    pub workspace: String,
    pub tag_id: String,
    pub name: Option<String>,
    pub archived: Option<bool>,
}

impl UpdateTag {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("tag", &self.tag_id)?;
        if let Some(n) = &self.name {
            name("name", n)?;
        }
        Ok(())
    }
}

// --------------------------------------------------------------------------
// Time entries
// --------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct GetUserTimeEntries {
    pub workspace: String,
    pub user_id: String,
    /// Entries starting at or after.
    pub start: Option<DateTime<Utc>>,
    /// Entries starting before.
    pub end: Option<DateTime<Utc>>,
    pub in_progress: Option<bool>,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub pagination: PaginationParam,
}

impl GetUserTimeEntries {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("user", &self.user_id)?;
        opt_id("project", &self.project_id)?;
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return Err(ValidationError::new("end", "must not be before start"));
            }
        }
        self.pagination.validate()
    }
}

/// One calendar day of a user's entries.
#[derive(Debug, Clone)]
pub struct Log {
    pub workspace: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub zone: Zone,
}

impl Log {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("user", &self.user_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogInProgress {
    pub workspace: String,
    pub user_id: String,
}

impl LogInProgress {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("user", &self.user_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetTimeEntry {
    pub workspace: String,
    pub id: String,
}

impl GetTimeEntry {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("time entry", &self.id)
    }
}

fn check_entry_refs(
    project_id: &Option<String>,
    task_id: &Option<String>,
    tag_ids: &[String],
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    opt_id("project", project_id)?;
    opt_id("task", task_id)?;
    if task_id.is_some() && project_id.is_none() {
        return Err(ValidationError::new("task", "requires a project"));
    }
    validate_ids("tag", tag_ids)?;
    if let Some(end) = end {
        if end < start {
            return Err(ValidationError::new("end", "must not be before start"));
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CreateTimeEntry {
    pub workspace: String,
    /// Create on behalf of this user instead of the key's owner.
    pub user_id: Option<String>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub description: String,
    pub project_id: Option<String>,
    pub task_id: Option<String>,
    pub tag_ids: Vec<String>,
    pub billable: Option<bool>,
}

impl CreateTimeEntry {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        opt_id("user", &self.user_id)?;
        check_entry_refs(
            &self.project_id,
            &self.task_id,
            &self.tag_ids,
            self.start,
            self.end,
        )
    }
}

/// Replaces every field of an existing entry.
#[derive(Debug, Clone)]
pub struct UpdateTimeEntry {
    pub workspace: String,
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub description: String,
    pub project_id: Option<String>,
    pub task_id: Option<String>,
    pub tag_ids: Vec<String>,
    pub billable: Option<bool>,
}

impl UpdateTimeEntry {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("time entry", &self.id)?;
        check_entry_refs(
            &self.project_id,
            &self.task_id,
            &self.tag_ids,
            self.start,
            self.end,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteTimeEntry {
    pub workspace: String,
    pub id: String,
}

impl DeleteTimeEntry {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("time entry", &self.id)
    }
}

/// Close the running entry of a user.
#[derive(Debug, Clone)]
pub struct Out {
    pub workspace: String,
    pub user_id: String,
    pub end: DateTime<Utc>,
}

impl Out {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        id("user", &self.user_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangeInvoiced {
    pub workspace: String,
    pub ids: Vec<String>,
    pub invoiced: bool,
}

impl ChangeInvoiced {
    pub fn validate(&self) -> Result<(), ValidationError> {
        id("workspace", &self.workspace)?;
        if self.ids.is_empty() {
            return Err(ValidationError::required("time entry"));
        }
        validate_ids("time entry", &self.ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const WS: &str = "5f1d0ab2c3e4f5a6b7c8d9e0";
    const P: &str = "5f1d0ab2c3e4f5a6b7c8d9e1";
    const T: &str = "5f1d0ab2c3e4f5a6b7c8d9e2";

    fn entry() -> CreateTimeEntry {
        CreateTimeEntry {
            workspace: WS.into(),
            user_id: None,
            start: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            end: None,
            description: "work".into(),
            project_id: Some(P.into()),
            task_id: Some(T.into()),
            tag_ids: vec![],
            billable: None,
        }
    }

    #[test]
    fn workspace_required() {
        let err = GetTags::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "workspace is required");
    }

    #[test]
    fn malformed_id_rejected() {
        let err = GetProject {
            workspace: WS.into(),
            project_id: "cli".into(),
            hydrate: false,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field, "project");
    }

    #[test]
    fn task_needs_project() {
        assert!(entry().validate().is_ok());
        let err = CreateTimeEntry {
            project_id: None,
            ..entry()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "task requires a project");
    }

    #[test]
    fn end_before_start_rejected() {
        let e = entry();
        let err = CreateTimeEntry {
            end: Some(e.start - Duration::minutes(1)),
            ..e
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field, "end");
    }

    #[test]
    fn invoiced_needs_ids() {
        let err = ChangeInvoiced {
            workspace: WS.into(),
            ids: vec![],
            invoiced: true,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field, "time entry");
    }
}
