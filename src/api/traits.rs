//! api::traits
//!
//! The `Api` trait: every typed operation against the time-tracking service.
//!
//! # Design
//!
//! The trait is async because every operation involves network I/O, and
//! object safe so the factory can hand out `Arc<dyn Api>`. Implementations
//! validate their parameters before any request is made and prefix errors
//! with the operation name (`update project: ...`).
//!
//! # Example
//!
//! ```ignore
//! use clockify_cli::api::{Api, GetTags, PaginationParam};
//!
//! async fn active_tags(api: &dyn Api, workspace: &str) -> Result<Vec<String>, ApiError> {
//!     let tags = api
//!         .get_tags(GetTags {
//!             workspace: workspace.to_string(),
//!             archived: Some(false),
//!             pagination: PaginationParam::all(),
//!             ..Default::default()
//!         })
//!         .await?;
//!     Ok(tags.into_iter().map(|t| t.name).collect())
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use super::pagination::PaginationParam;
use super::params::*;
use crate::core::types::{
    Client, Project, Tag, Task, TimeEntry, User, ValidationError, Workspace,
};

/// Errors from API operations.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The service answered 404, with or without a body.
    #[error("Nothing was found at {path} (404)")]
    NotFound { path: String },

    /// The service refused the request and said why.
    #[error("{message} (code: {code}, status: {status})")]
    Api {
        status: u16,
        code: i64,
        message: String,
    },

    /// Non-2xx reply whose body could not be decoded.
    #[error("no usable response from the server (status {status})")]
    NoResponse { status: u16 },

    /// Network or codec failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Parameters rejected before any request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The run was cancelled before the result was used.
    #[error("cancelled")]
    Cancelled,

    /// A spawned fetch panicked or was aborted.
    #[error("background task failed: {0}")]
    Join(String),

    /// Any of the above, prefixed with the operation that failed.
    #[error("{op}: {cause}")]
    Operation {
        op: &'static str,
        cause: Box<ApiError>,
    },
}

impl ApiError {
    /// Prefix `self` with an operation name. Already-prefixed errors keep
    /// their innermost operation.
    pub fn in_op(self, op: &'static str) -> Self {
        match self {
            already @ ApiError::Operation { .. } => already,
            other => ApiError::Operation {
                op,
                cause: Box::new(other),
            },
        }
    }

    /// The underlying error with any operation prefix removed.
    pub fn kind(&self) -> &ApiError {
        match self {
            ApiError::Operation { cause, .. } => cause.kind(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind(), ApiError::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind(), ApiError::Cancelled)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Join(e.to_string())
    }
}

/// Typed operations on workspaces, users, clients, projects, tasks, tags
/// and time entries.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the resolver and hydrator call
/// them from concurrently spawned tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, ApiError>`. Callers see through the
/// operation prefix with [`ApiError::kind`].
#[async_trait]
pub trait Api: Send + Sync {
    // ---------------------------------------------------------------------
    // Workspaces and users
    // ---------------------------------------------------------------------

    /// Workspaces visible to the API key, optionally filtered by a
    /// case-insensitive substring of the name.
    async fn get_workspaces(&self, params: GetWorkspaces) -> Result<Vec<Workspace>, ApiError>;

    async fn get_workspace(&self, params: GetWorkspace) -> Result<Workspace, ApiError>;

    async fn workspace_users(&self, params: WorkspaceUsers) -> Result<Vec<User>, ApiError>;

    async fn get_user(&self, params: GetUser) -> Result<User, ApiError>;

    /// The user the API key belongs to.
    async fn get_me(&self) -> Result<User, ApiError>;

    // ---------------------------------------------------------------------
    // Clients
    // ---------------------------------------------------------------------

    async fn get_clients(&self, params: GetClients) -> Result<Vec<Client>, ApiError>;

    async fn get_client(&self, params: GetClient) -> Result<Client, ApiError>;

    async fn add_client(&self, params: AddClient) -> Result<Client, ApiError>;

    async fn update_client(&self, params: UpdateClient) -> Result<Client, ApiError>;

    // ---------------------------------------------------------------------
    // Projects
    // ---------------------------------------------------------------------

    async fn get_projects(&self, params: GetProjects) -> Result<Vec<Project>, ApiError>;

    async fn get_project(&self, params: GetProject) -> Result<Project, ApiError>;

    async fn add_project(&self, params: AddProject) -> Result<Project, ApiError>;

    /// Color, when given, must be `#RGB` or `#RRGGBB` and is sent expanded.
    async fn update_project(&self, params: UpdateProject) -> Result<Project, ApiError>;

    // ---------------------------------------------------------------------
    // Tasks
    // ---------------------------------------------------------------------

    async fn get_tasks(&self, params: GetTasks) -> Result<Vec<Task>, ApiError>;

    async fn get_task(&self, params: GetTask) -> Result<Task, ApiError>;

    async fn add_task(&self, params: AddTask) -> Result<Task, ApiError>;

    async fn update_task(&self, params: UpdateTask) -> Result<Task, ApiError>;

    async fn delete_task(&self, params: DeleteTask) -> Result<Task, ApiError>;

    // ---------------------------------------------------------------------
    // Tags
    // ---------------------------------------------------------------------

    async fn get_tags(&self, params: GetTags) -> Result<Vec<Tag>, ApiError>;

    async fn get_tag(&self, params: GetTag) -> Result<Tag, ApiError>;

    async fn add_tag(&self, params: AddTag) -> Result<Tag, ApiError>;

    async fn update_tag(&self, params: UpdateTag) -> Result<Tag, ApiError>;

    // ---------------------------------------------------------------------
    // Time entries
    // ---------------------------------------------------------------------

    async fn get_user_time_entries(
        &self,
        params: GetUserTimeEntries,
    ) -> Result<Vec<TimeEntry>, ApiError>;

    async fn get_time_entry(&self, params: GetTimeEntry) -> Result<TimeEntry, ApiError>;

    async fn create_time_entry(&self, params: CreateTimeEntry) -> Result<TimeEntry, ApiError>;

    async fn update_time_entry(&self, params: UpdateTimeEntry) -> Result<TimeEntry, ApiError>;

    async fn delete_time_entry(&self, params: DeleteTimeEntry) -> Result<(), ApiError>;

    /// Close the user's running entry at `end`. `Ok(None)` when nothing runs.
    async fn out(&self, params: Out) -> Result<Option<TimeEntry>, ApiError>;

    async fn change_invoiced(&self, params: ChangeInvoiced) -> Result<(), ApiError>;

    /// Every entry of the user that starts on `date` in `zone`.
    async fn log(&self, params: Log) -> Result<Vec<TimeEntry>, ApiError> {
        async {
            params.validate()?;
            let (start, end) = params
                .zone
                .day_bounds(params.date)
                .map_err(|e| ValidationError::new("date", e.to_string()))?;
            let mut entries = self
                .get_user_time_entries(GetUserTimeEntries {
                    workspace: params.workspace,
                    user_id: params.user_id,
                    start: Some(start),
                    end: Some(end),
                    pagination: PaginationParam::all(),
                    ..Default::default()
                })
                .await?;
            entries.sort_by_key(|e| e.time_interval.start);
            Ok::<_, ApiError>(entries)
        }
        .await
        .map_err(|e| e.in_op("log"))
    }

    /// The user's running entry, if any.
    async fn log_in_progress(&self, params: LogInProgress) -> Result<Option<TimeEntry>, ApiError> {
        async {
            params.validate()?;
            let entries = self
                .get_user_time_entries(GetUserTimeEntries {
                    workspace: params.workspace,
                    user_id: params.user_id,
                    in_progress: Some(true),
                    pagination: PaginationParam::page(1, 1),
                    ..Default::default()
                })
                .await?;
            Ok::<_, ApiError>(entries.into_iter().find(|e| e.time_interval.is_running()))
        }
        .await
        .map_err(|e| e.in_op("log in progress"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_prefix_display() {
        let err = ApiError::NotFound {
            path: "/workspaces/w/projects/p".into(),
        }
        .in_op("update project");
        assert_eq!(
            err.to_string(),
            "update project: Nothing was found at /workspaces/w/projects/p (404)"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn prefix_is_applied_once() {
        let err = ApiError::Cancelled.in_op("get tags").in_op("resolve tags");
        assert_eq!(err.to_string(), "get tags: cancelled");
        assert!(err.is_cancelled());
    }

    #[test]
    fn validation_passes_through() {
        let err: ApiError = ValidationError::new("color", "\"#zzz\" is not a hex string").into();
        assert_eq!(err.to_string(), "color \"#zzz\" is not a hex string");
    }
}
