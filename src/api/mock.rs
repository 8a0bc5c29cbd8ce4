//! api::mock
//!
//! In-memory [`Api`] for deterministic testing.
//!
//! # Design
//!
//! The mock keeps entities in insertion order (the order lists come back
//! in), applies the same parameter validation and operation prefixes as
//! the HTTP client, and records every call. Individual operations can be
//! made to fail or to wait, so error propagation and concurrency can be
//! exercised without a server.
//!
//! # Example
//!
//! ```
//! use clockify_cli::api::mock::MockApi;
//! use clockify_cli::api::{Api, GetTags, PaginationParam};
//! use clockify_cli::core::types::Tag;
//!
//! # tokio_test::block_on(async {
//! let ws = MockApi::id(1);
//! let api = MockApi::new().with_tag(Tag {
//!     id: MockApi::id(2),
//!     name: "meeting".into(),
//!     workspace_id: ws.clone(),
//!     archived: false,
//! });
//!
//! let tags = api
//!     .get_tags(GetTags { workspace: ws, pagination: PaginationParam::all(), ..Default::default() })
//!     .await
//!     .unwrap();
//! assert_eq!(tags[0].name, "meeting");
//! assert_eq!(api.count("get tags"), 1);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::pagination::{paginate, PaginationParam};
use super::params::*;
use super::traits::{Api, ApiError};
use crate::core::cancel::CancelToken;
use crate::core::types::{
    Client, HexColor, Project, Tag, Task, TaskStatus, TimeEntry, TimeInterval, User, Workspace,
};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockOperation {
    /// Operation name, as used in error prefixes (`create time entry`).
    pub op: &'static str,
    /// The main id or name the call targeted.
    pub target: String,
}

/// Mock service for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockApi {
    inner: Arc<Mutex<MockApiInner>>,
}

#[derive(Debug, Default)]
struct MockApiInner {
    workspaces: Vec<Workspace>,
    users: Vec<User>,
    me: Option<User>,
    clients: Vec<Client>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    tags: Vec<Tag>,
    entries: Vec<TimeEntry>,
    invoiced: HashMap<String, bool>,
    next_id: u64,
    fail_on: HashMap<&'static str, ApiError>,
    delays: HashMap<&'static str, Duration>,
    in_flight: HashMap<&'static str, usize>,
    peak_in_flight: HashMap<&'static str, usize>,
    operations: Vec<MockOperation>,
}

fn not_found(path: String) -> ApiError {
    ApiError::NotFound { path }
}

fn page_of<T: Clone>(items: &[T], page: u32, size: u32) -> Vec<T> {
    items
        .chunks(size as usize)
        .nth(page as usize - 1)
        .map(|c| c.to_vec())
        .unwrap_or_default()
}

async fn paged<T: Clone + Send>(items: Vec<T>, pagination: PaginationParam) -> Result<Vec<T>, ApiError> {
    let cancel = CancelToken::new();
    paginate(pagination, &cancel, |page, size| {
        let chunk = page_of(&items, page, size);
        async move { Ok(chunk) }
    })
    .await
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// A deterministic 24-hex-digit id.
    pub fn id(n: u64) -> String {
        format!("{n:024x}")
    }

    fn lock(&self) -> MutexGuard<'_, MockApiInner> {
        // A poisoned lock only happens after a test already panicked.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // ---------------------------------------------------------------------
    // Seeding
    // ---------------------------------------------------------------------

    pub fn with_workspace(self, workspace: Workspace) -> Self {
        self.lock().workspaces.push(workspace);
        self
    }

    pub fn with_user(self, user: User) -> Self {
        self.lock().users.push(user);
        self
    }

    /// Set the key owner. Also adds them to the user list.
    pub fn with_me(self, user: User) -> Self {
        {
            let mut inner = self.lock();
            inner.users.push(user.clone());
            inner.me = Some(user);
        }
        self
    }

    pub fn with_client(self, client: Client) -> Self {
        self.lock().clients.push(client);
        self
    }

    pub fn with_project(self, project: Project) -> Self {
        self.lock().projects.push(project);
        self
    }

    pub fn with_task(self, task: Task) -> Self {
        self.lock().tasks.push(task);
        self
    }

    pub fn with_tag(self, tag: Tag) -> Self {
        self.lock().tags.push(tag);
        self
    }

    pub fn with_entry(self, entry: TimeEntry) -> Self {
        self.lock().entries.push(entry);
        self
    }

    /// Make `op` fail with `error` (before the operation prefix is added).
    pub fn fail_on(&self, op: &'static str, error: ApiError) {
        self.lock().fail_on.insert(op, error);
    }

    /// Make `op` wait before answering.
    pub fn delay(&self, op: &'static str, by: Duration) {
        self.lock().delays.insert(op, by);
    }

    // ---------------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------------

    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Most calls to `op` that were inside their delay at the same time.
    pub fn peak_in_flight(&self, op: &str) -> usize {
        self.lock().peak_in_flight.get(op).copied().unwrap_or_default()
    }

    /// Number of recorded calls to `op`.
    pub fn count(&self, op: &str) -> usize {
        self.lock().operations.iter().filter(|o| o.op == op).count()
    }

    pub fn time_entries(&self) -> Vec<TimeEntry> {
        self.lock().entries.clone()
    }

    pub fn is_invoiced(&self, id: &str) -> Option<bool> {
        self.lock().invoiced.get(id).copied()
    }

    pub fn projects(&self) -> Vec<Project> {
        self.lock().projects.clone()
    }

    /// Record the call, honor delays and configured failures.
    async fn enter(&self, op: &'static str, target: impl Into<String>) -> Result<(), ApiError> {
        let delay = {
            let mut inner = self.lock();
            inner.operations.push(MockOperation {
                op,
                target: target.into(),
            });
            inner.delays.get(op).copied()
        };
        if let Some(by) = delay {
            {
                let mut inner = self.lock();
                let now = {
                    let n = inner.in_flight.entry(op).or_default();
                    *n += 1;
                    *n
                };
                let peak = inner.peak_in_flight.entry(op).or_default();
                *peak = (*peak).max(now);
            }
            tokio::time::sleep(by).await;
            if let Some(n) = self.lock().in_flight.get_mut(op) {
                *n -= 1;
            }
        }
        match self.lock().fail_on.get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn next_id(&self) -> String {
        let mut inner = self.lock();
        inner.next_id += 1;
        Self::id(0xf000_0000 + inner.next_id)
    }
}

async fn scoped<T>(
    op: &'static str,
    fut: impl std::future::Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    fut.await.map_err(|e| e.in_op(op))
}

#[async_trait]
impl Api for MockApi {
    async fn get_workspaces(&self, params: GetWorkspaces) -> Result<Vec<Workspace>, ApiError> {
        scoped("get workspaces", async {
            self.enter("get workspaces", "").await?;
            let filter = params.name.map(|n| n.to_lowercase());
            Ok(self
                .lock()
                .workspaces
                .iter()
                .filter(|w| {
                    filter
                        .as_deref()
                        .map_or(true, |f| w.name.to_lowercase().contains(f))
                })
                .cloned()
                .collect())
        })
        .await
    }

    async fn get_workspace(&self, params: GetWorkspace) -> Result<Workspace, ApiError> {
        scoped("get workspace", async {
            params.validate()?;
            self.enter("get workspace", &params.workspace).await?;
            let found = self
                .lock()
                .workspaces
                .iter()
                .find(|w| w.id == params.workspace)
                .cloned();
            found.ok_or_else(|| not_found(format!("/workspaces/{}", params.workspace)))
        })
        .await
    }

    async fn workspace_users(&self, params: WorkspaceUsers) -> Result<Vec<User>, ApiError> {
        scoped("get users", async {
            params.validate()?;
            self.enter("get users", &params.workspace).await?;
            let users: Vec<User> = self
                .lock()
                .users
                .iter()
                .filter(|u| {
                    params
                        .email
                        .as_deref()
                        .map_or(true, |e| u.email.eq_ignore_ascii_case(e))
                })
                .cloned()
                .collect();
            paged(users, params.pagination).await
        })
        .await
    }

    async fn get_user(&self, params: GetUser) -> Result<User, ApiError> {
        scoped("get user", async {
            params.validate()?;
            self.enter("get user", &params.user_id).await?;
            let found = self
                .lock()
                .users
                .iter()
                .find(|u| u.id == params.user_id)
                .cloned();
            found.ok_or_else(|| {
                not_found(format!(
                    "/workspaces/{}/users/{}",
                    params.workspace, params.user_id
                ))
            })
        })
        .await
    }

    async fn get_me(&self) -> Result<User, ApiError> {
        scoped("get current user", async {
            self.enter("get current user", "").await?;
            let me = self.lock().me.clone();
            me.ok_or_else(|| not_found("/user".to_string()))
        })
        .await
    }

    async fn get_clients(&self, params: GetClients) -> Result<Vec<Client>, ApiError> {
        scoped("get clients", async {
            params.validate()?;
            self.enter("get clients", &params.workspace).await?;
            let clients: Vec<Client> = self
                .lock()
                .clients
                .iter()
                .filter(|c| params.archived.map_or(true, |a| c.archived == a))
                .filter(|c| {
                    params
                        .name
                        .as_deref()
                        .map_or(true, |n| c.name.to_lowercase().contains(&n.to_lowercase()))
                })
                .cloned()
                .collect();
            paged(clients, params.pagination).await
        })
        .await
    }

    async fn get_client(&self, params: GetClient) -> Result<Client, ApiError> {
        scoped("get client", async {
            params.validate()?;
            self.enter("get client", &params.client_id).await?;
            let found = self
                .lock()
                .clients
                .iter()
                .find(|c| c.id == params.client_id)
                .cloned();
            found.ok_or_else(|| {
                not_found(format!(
                    "/workspaces/{}/clients/{}",
                    params.workspace, params.client_id
                ))
            })
        })
        .await
    }

    async fn add_client(&self, params: AddClient) -> Result<Client, ApiError> {
        scoped("add client", async {
            params.validate()?;
            self.enter("add client", &params.name).await?;
            let client = Client {
                id: self.next_id(),
                name: params.name.trim().to_string(),
                workspace_id: params.workspace,
                archived: false,
            };
            self.lock().clients.push(client.clone());
            Ok(client)
        })
        .await
    }

    async fn update_client(&self, params: UpdateClient) -> Result<Client, ApiError> {
        scoped("update client", async {
            params.validate()?;
            self.enter("update client", &params.client_id).await?;
            let mut inner = self.lock();
            let client = inner
                .clients
                .iter_mut()
                .find(|c| c.id == params.client_id)
                .ok_or_else(|| {
                    not_found(format!(
                        "/workspaces/{}/clients/{}",
                        params.workspace, params.client_id
                    ))
                })?;
            if let Some(name) = params.name {
                client.name = name;
            }
            if let Some(archived) = params.archived {
                client.archived = archived;
            }
            Ok(client.clone())
        })
        .await
    }

    async fn get_projects(&self, params: GetProjects) -> Result<Vec<Project>, ApiError> {
        scoped("get projects", async {
            params.validate()?;
            self.enter("get projects", &params.workspace).await?;
            let projects: Vec<Project> = {
                let inner = self.lock();
                inner
                    .projects
                    .iter()
                    .filter(|p| params.archived.map_or(true, |a| p.archived == a))
                    .filter(|p| {
                        params.clients.is_empty()
                            || p.client_id
                                .as_ref()
                                .is_some_and(|c| params.clients.contains(c))
                    })
                    .filter(|p| {
                        params
                            .name
                            .as_deref()
                            .map_or(true, |n| p.name.to_lowercase().contains(&n.to_lowercase()))
                    })
                    .map(|p| {
                        let mut p = p.clone();
                        if params.hydrate {
                            p.tasks = inner
                                .tasks
                                .iter()
                                .filter(|t| t.project_id == p.id)
                                .cloned()
                                .collect();
                        }
                        p
                    })
                    .collect()
            };
            paged(projects, params.pagination).await
        })
        .await
    }

    async fn get_project(&self, params: GetProject) -> Result<Project, ApiError> {
        scoped("get project", async {
            params.validate()?;
            self.enter("get project", &params.project_id).await?;
            let inner = self.lock();
            let mut project = inner
                .projects
                .iter()
                .find(|p| p.id == params.project_id)
                .cloned()
                .ok_or_else(|| {
                    not_found(format!(
                        "/workspaces/{}/projects/{}",
                        params.workspace, params.project_id
                    ))
                })?;
            if params.hydrate {
                project.tasks = inner
                    .tasks
                    .iter()
                    .filter(|t| t.project_id == project.id)
                    .cloned()
                    .collect();
            }
            Ok(project)
        })
        .await
    }

    async fn add_project(&self, params: AddProject) -> Result<Project, ApiError> {
        scoped("add project", async {
            params.validate()?;
            let color = params.color.as_deref().map(HexColor::parse).transpose()?;
            self.enter("add project", &params.name).await?;
            let client_name = params.client_id.as_ref().and_then(|cid| {
                self.lock()
                    .clients
                    .iter()
                    .find(|c| &c.id == cid)
                    .map(|c| c.name.clone())
            });
            let project = Project {
                id: self.next_id(),
                name: params.name.trim().to_string(),
                workspace_id: params.workspace,
                client_id: params.client_id,
                client_name,
                color: color.map(|c| c.to_string()).unwrap_or_default(),
                billable: params.billable,
                public: params.public,
                archived: false,
                note: params.note.unwrap_or_default(),
                hourly_rate: None,
                tasks: vec![],
                memberships: vec![],
                custom_fields: vec![],
            };
            self.lock().projects.push(project.clone());
            Ok(project)
        })
        .await
    }

    async fn update_project(&self, params: UpdateProject) -> Result<Project, ApiError> {
        scoped("update project", async {
            params.validate()?;
            let color = params.color.as_deref().map(HexColor::parse).transpose()?;
            self.enter("update project", &params.project_id).await?;
            let mut inner = self.lock();
            let project = inner
                .projects
                .iter_mut()
                .find(|p| p.id == params.project_id)
                .ok_or_else(|| {
                    not_found(format!(
                        "/workspaces/{}/projects/{}",
                        params.workspace, params.project_id
                    ))
                })?;
            if let Some(name) = params.name {
                project.name = name;
            }
            if let Some(c) = color {
                project.color = c.to_string();
            }
            if let Some(client) = params.client_id {
                project.client_id = Some(client);
            }
            if let Some(b) = params.billable {
                project.billable = b;
            }
            if let Some(p) = params.public {
                project.public = p;
            }
            if let Some(a) = params.archived {
                project.archived = a;
            }
            if let Some(n) = params.note {
                project.note = n;
            }
            Ok(project.clone())
        })
        .await
    }

    async fn get_tasks(&self, params: GetTasks) -> Result<Vec<Task>, ApiError> {
        scoped("get tasks", async {
            params.validate()?;
            self.enter("get tasks", &params.project_id).await?;
            let tasks: Vec<Task> = self
                .lock()
                .tasks
                .iter()
                .filter(|t| t.project_id == params.project_id)
                .filter(|t| {
                    params
                        .active
                        .map_or(true, |a| (t.status == TaskStatus::Active) == a)
                })
                .cloned()
                .collect();
            paged(tasks, params.pagination).await
        })
        .await
    }

    async fn get_task(&self, params: GetTask) -> Result<Task, ApiError> {
        scoped("get task", async {
            params.validate()?;
            self.enter("get task", &params.task_id).await?;
            let found = self
                .lock()
                .tasks
                .iter()
                .find(|t| t.id == params.task_id && t.project_id == params.project_id)
                .cloned();
            found.ok_or_else(|| {
                not_found(format!(
                    "/workspaces/{}/projects/{}/tasks/{}",
                    params.workspace, params.project_id, params.task_id
                ))
            })
        })
        .await
    }

    async fn add_task(&self, params: AddTask) -> Result<Task, ApiError> {
        scoped("add task", async {
            params.validate()?;
            self.enter("add task", &params.name).await?;
            let task = Task {
                id: self.next_id(),
                name: params.name.trim().to_string(),
                project_id: params.project_id,
                status: TaskStatus::Active,
                estimate: params
                    .estimate
                    .map(crate::core::timefmt::to_iso_duration),
                assignee_ids: params.assignee_ids,
                billable: params.billable.unwrap_or(false),
            };
            self.lock().tasks.push(task.clone());
            Ok(task)
        })
        .await
    }

    async fn update_task(&self, params: UpdateTask) -> Result<Task, ApiError> {
        scoped("update task", async {
            params.validate()?;
            self.enter("update task", &params.task_id).await?;
            let mut inner = self.lock();
            let task = inner
                .tasks
                .iter_mut()
                .find(|t| t.id == params.task_id && t.project_id == params.project_id)
                .ok_or_else(|| {
                    not_found(format!(
                        "/workspaces/{}/projects/{}/tasks/{}",
                        params.workspace, params.project_id, params.task_id
                    ))
                })?;
            if let Some(name) = params.name {
                task.name = name;
            }
            if let Some(ids) = params.assignee_ids {
                task.assignee_ids = ids;
            }
            if let Some(est) = params.estimate {
                task.estimate = Some(crate::core::timefmt::to_iso_duration(est));
            }
            if let Some(b) = params.billable {
                task.billable = b;
            }
            if let Some(s) = params.status {
                task.status = s;
            }
            Ok(task.clone())
        })
        .await
    }

    async fn delete_task(&self, params: DeleteTask) -> Result<Task, ApiError> {
        scoped("delete task", async {
            params.validate()?;
            self.enter("delete task", &params.task_id).await?;
            let mut inner = self.lock();
            let pos = inner
                .tasks
                .iter()
                .position(|t| t.id == params.task_id && t.project_id == params.project_id)
                .ok_or_else(|| {
                    not_found(format!(
                        "/workspaces/{}/projects/{}/tasks/{}",
                        params.workspace, params.project_id, params.task_id
                    ))
                })?;
            Ok(inner.tasks.remove(pos))
        })
        .await
    }

    async fn get_tags(&self, params: GetTags) -> Result<Vec<Tag>, ApiError> {
        scoped("get tags", async {
            params.validate()?;
            self.enter("get tags", &params.workspace).await?;
            let tags: Vec<Tag> = self
                .lock()
                .tags
                .iter()
                .filter(|t| params.archived.map_or(true, |a| t.archived == a))
                .filter(|t| {
                    params
                        .name
                        .as_deref()
                        .map_or(true, |n| t.name.to_lowercase().contains(&n.to_lowercase()))
                })
                .cloned()
                .collect();
            paged(tags, params.pagination).await
        })
        .await
    }

    async fn get_tag(&self, params: GetTag) -> Result<Tag, ApiError> {
        scoped("get tag", async {
            params.validate()?;
            self.enter("get tag", &params.tag_id).await?;
            let found = self
                .lock()
                .tags
                .iter()
                .find(|t| t.id == params.tag_id)
                .cloned();
            found.ok_or_else(|| {
                not_found(format!(
                    "/workspaces/{}/tags/{}",
                    params.workspace, params.tag_id
                ))
            })
        })
        .await
    }

    async fn add_tag(&self, params: AddTag) -> Result<Tag, ApiError> {
        scoped("add tag", async {
            params.validate()?;
            self.enter("add tag", &params.name).await?;
            let tag = Tag {
                id: self.next_id(),
                name: params.name.trim().to_string(),
                workspace_id: params.workspace,
                archived: false,
            };
            self.lock().tags.push(tag.clone());
            Ok(tag)
        })
        .await
    }

    async fn update_tag(&self, params: UpdateTag) -> Result<Tag, ApiError> {
        scoped("update tag", async {
            params.validate()?;
            self.enter("update tag", &params.tag_id).await?;
            let mut inner = self.lock();
            let tag = inner
                .tags
                .iter_mut()
                .find(|t| t.id == params.tag_id)
                .ok_or_else(|| {
                    not_found(format!(
                        "/workspaces/{}/tags/{}",
                        params.workspace, params.tag_id
                    ))
                })?;
            if let Some(name) = params.name {
                tag.name = name;
            }
            if let Some(a) = params.archived {
                tag.archived = a;
            }
            Ok(tag.clone())
        })
        .await
    }

    async fn get_user_time_entries(
        &self,
        params: GetUserTimeEntries,
    ) -> Result<Vec<TimeEntry>, ApiError> {
        scoped("get time entries", async {
            params.validate()?;
            self.enter("get time entries", &params.user_id).await?;
            let mut entries: Vec<TimeEntry> = self
                .lock()
                .entries
                .iter()
                .filter(|e| e.workspace_id == params.workspace && e.user_id == params.user_id)
                .filter(|e| params.start.map_or(true, |s| e.time_interval.start >= s))
                .filter(|e| params.end.map_or(true, |end| e.time_interval.start < end))
                .filter(|e| {
                    params
                        .in_progress
                        .map_or(true, |p| e.time_interval.is_running() == p)
                })
                .filter(|e| {
                    params
                        .description
                        .as_deref()
                        .map_or(true, |d| e.description.contains(d))
                })
                .filter(|e| {
                    params
                        .project_id
                        .as_ref()
                        .map_or(true, |p| e.project_id.as_ref() == Some(p))
                })
                .cloned()
                .collect();
            // Newest first, like the service.
            entries.sort_by(|a, b| b.time_interval.start.cmp(&a.time_interval.start));
            paged(entries, params.pagination).await
        })
        .await
    }

    async fn get_time_entry(&self, params: GetTimeEntry) -> Result<TimeEntry, ApiError> {
        scoped("get time entry", async {
            params.validate()?;
            self.enter("get time entry", &params.id).await?;
            let found = self
                .lock()
                .entries
                .iter()
                .find(|e| e.id == params.id && e.workspace_id == params.workspace)
                .cloned();
            found.ok_or_else(|| {
                not_found(format!(
                    "/workspaces/{}/time-entries/{}",
                    params.workspace, params.id
                ))
            })
        })
        .await
    }

    async fn create_time_entry(&self, params: CreateTimeEntry) -> Result<TimeEntry, ApiError> {
        scoped("create time entry", async {
            params.validate()?;
            self.enter("create time entry", &params.description).await?;
            let user_id = match params.user_id {
                Some(u) => u,
                None => self.lock().me.as_ref().map(|u| u.id.clone()).unwrap_or_default(),
            };
            let entry = TimeEntry {
                id: self.next_id(),
                workspace_id: params.workspace,
                user_id,
                description: params.description,
                project_id: params.project_id,
                task_id: params.task_id,
                tag_ids: params.tag_ids,
                billable: params.billable.unwrap_or(false),
                time_interval: TimeInterval {
                    start: params.start,
                    end: params.end,
                },
                is_locked: false,
            };
            self.lock().entries.push(entry.clone());
            Ok(entry)
        })
        .await
    }

    async fn update_time_entry(&self, params: UpdateTimeEntry) -> Result<TimeEntry, ApiError> {
        scoped("update time entry", async {
            params.validate()?;
            self.enter("update time entry", &params.id).await?;
            let mut inner = self.lock();
            let entry = inner
                .entries
                .iter_mut()
                .find(|e| e.id == params.id)
                .ok_or_else(|| {
                    not_found(format!(
                        "/workspaces/{}/time-entries/{}",
                        params.workspace, params.id
                    ))
                })?;
            entry.description = params.description;
            entry.project_id = params.project_id;
            entry.task_id = params.task_id;
            entry.tag_ids = params.tag_ids;
            if let Some(b) = params.billable {
                entry.billable = b;
            }
            entry.time_interval = TimeInterval {
                start: params.start,
                end: params.end,
            };
            Ok(entry.clone())
        })
        .await
    }

    async fn delete_time_entry(&self, params: DeleteTimeEntry) -> Result<(), ApiError> {
        scoped("delete time entry", async {
            params.validate()?;
            self.enter("delete time entry", &params.id).await?;
            let mut inner = self.lock();
            let before = inner.entries.len();
            inner.entries.retain(|e| e.id != params.id);
            if inner.entries.len() == before {
                return Err(not_found(format!(
                    "/workspaces/{}/time-entries/{}",
                    params.workspace, params.id
                )));
            }
            Ok(())
        })
        .await
    }

    async fn out(&self, params: Out) -> Result<Option<TimeEntry>, ApiError> {
        scoped("stop time entry", async {
            params.validate()?;
            self.enter("stop time entry", &params.user_id).await?;
            let mut inner = self.lock();
            let running = inner.entries.iter_mut().find(|e| {
                e.workspace_id == params.workspace
                    && e.user_id == params.user_id
                    && e.time_interval.is_running()
            });
            Ok(running.map(|e| {
                e.time_interval.end = Some(params.end);
                e.clone()
            }))
        })
        .await
    }

    async fn change_invoiced(&self, params: ChangeInvoiced) -> Result<(), ApiError> {
        scoped("change invoiced", async {
            params.validate()?;
            self.enter("change invoiced", params.ids.join(",")).await?;
            let mut inner = self.lock();
            for id in &params.ids {
                if !inner.entries.iter().any(|e| &e.id == id) {
                    return Err(not_found(format!(
                        "/workspaces/{}/time-entries/invoiced",
                        params.workspace
                    )));
                }
            }
            for id in params.ids {
                inner.invoiced.insert(id, params.invoiced);
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timefmt::Zone;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn ws() -> String {
        MockApi::id(1)
    }

    fn me() -> User {
        User {
            id: MockApi::id(2),
            name: "Dana".into(),
            email: "dana@example.com".into(),
            status: "ACTIVE".into(),
            active_workspace: ws(),
            default_workspace: ws(),
            settings: Default::default(),
        }
    }

    #[tokio::test]
    async fn create_and_stop_entry() {
        let api = MockApi::new().with_me(me());
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        api.create_time_entry(CreateTimeEntry {
            workspace: ws(),
            user_id: None,
            start,
            end: None,
            description: "standup".into(),
            project_id: None,
            task_id: None,
            tag_ids: vec![],
            billable: None,
        })
        .await
        .unwrap();

        let end = start + chrono::Duration::minutes(15);
        let closed = api
            .out(Out {
                workspace: ws(),
                user_id: me().id,
                end,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.time_interval.end, Some(end));

        let again = api
            .out(Out {
                workspace: ws(),
                user_id: me().id,
                end,
            })
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn fail_on_is_prefixed() {
        let api = MockApi::new();
        api.fail_on("get tags", ApiError::NoResponse { status: 500 });
        let err = api
            .get_tags(GetTags {
                workspace: ws(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "get tags: no usable response from the server (status 500)"
        );
    }

    #[tokio::test]
    async fn validation_happens_before_recording() {
        let api = MockApi::new();
        let err = api
            .get_project(GetProject {
                workspace: ws(),
                project_id: "nope".into(),
                hydrate: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.kind(), ApiError::Validation(_)));
        assert_eq!(api.count("get project"), 0);
    }

    #[tokio::test]
    async fn log_in_progress_comes_from_default_method() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let api = MockApi::new().with_me(me()).with_entry(TimeEntry {
            id: MockApi::id(9),
            workspace_id: ws(),
            user_id: me().id,
            description: "running".into(),
            project_id: None,
            task_id: None,
            tag_ids: vec![],
            billable: false,
            time_interval: TimeInterval { start, end: None },
            is_locked: false,
        });
        let running = api
            .log_in_progress(LogInProgress {
                workspace: ws(),
                user_id: me().id,
            })
            .await
            .unwrap();
        assert_eq!(running.map(|e| e.id), Some(MockApi::id(9)));
    }

    #[tokio::test]
    async fn log_validation_carries_the_operation() {
        let api = MockApi::new();
        let err = api
            .log(Log {
                workspace: "nope".into(),
                user_id: me().id,
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                zone: Zone::Utc,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("log: "), "{err}");
        assert!(matches!(err.kind(), ApiError::Validation(_)));

        let err = api
            .log_in_progress(LogInProgress {
                workspace: ws(),
                user_id: "nope".into(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("log in progress: "), "{err}");
    }
}
