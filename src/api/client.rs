//! api::client
//!
//! HTTP implementation of [`Api`] over [`Transport`].
//!
//! Every operation validates its parameters first, so malformed ids or
//! colors never reach the network, and wraps any failure with the
//! operation name:
//!
//! ```text
//! update project: Nothing was found at /workspaces/.../projects/... (404)
//! ```

use std::future::Future;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;

use super::pagination::{paginate, PaginationParam};
use super::params::*;
use super::traits::{Api, ApiError};
use super::transport::Transport;
use crate::core::timefmt::{api_timestamp, to_iso_duration};
use crate::core::types::{
    Client, HexColor, Project, Tag, Task, TaskStatus, TimeEntry, User, Workspace,
};

/// Service client backed by HTTPS.
#[derive(Debug, Clone)]
pub struct HttpClient {
    transport: Transport,
}

async fn op<T>(
    name: &'static str,
    fut: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    fut.await.map_err(|e| e.in_op(name))
}

fn ws(workspace: &str) -> String {
    format!("/workspaces/{workspace}")
}

fn push_opt<T: ToString>(query: &mut Vec<(&'static str, String)>, key: &'static str, v: &Option<T>) {
    if let Some(v) = v {
        query.push((key, v.to_string()));
    }
}

fn with_page(
    base: &[(&'static str, String)],
    page: u32,
    page_size: u32,
) -> Vec<(&'static str, String)> {
    let mut query = base.to_vec();
    query.push(("page", page.to_string()));
    query.push(("page-size", page_size.to_string()));
    query
}

// --------------------------------------------------------------------------
// Request bodies
// --------------------------------------------------------------------------

#[derive(Serialize)]
struct NameBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ArchivableBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    archived: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    billable: Option<bool>,
    #[serde(rename = "isPublic", skip_serializing_if = "Option::is_none")]
    public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_ids: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    billable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryBody<'a> {
    start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<String>,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<&'a str>,
    tag_ids: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    billable: Option<bool>,
}

#[derive(Serialize)]
struct EndBody {
    end: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvoicedBody<'a> {
    time_entry_ids: &'a [String],
    invoiced: bool,
}

fn color(value: &Option<String>) -> Result<Option<String>, ApiError> {
    match value {
        Some(c) => Ok(Some(HexColor::parse(c)?.to_string())),
        None => Ok(None),
    }
}

impl HttpClient {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    async fn list<T>(
        &self,
        path: String,
        base: Vec<(&'static str, String)>,
        pagination: PaginationParam,
    ) -> Result<Vec<T>, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        paginate(pagination, self.transport.cancel_token(), |page, size| {
            let query = with_page(&base, page, size);
            let path = path.clone();
            async move { self.transport.get(&path, &query).await }
        })
        .await
    }
}

#[async_trait]
impl Api for HttpClient {
    async fn get_workspaces(&self, params: GetWorkspaces) -> Result<Vec<Workspace>, ApiError> {
        op("get workspaces", async {
            let all: Vec<Workspace> = self.transport.get("/workspaces", &[]).await?;
            let Some(filter) = params.name.map(|n| n.to_lowercase()) else {
                return Ok(all);
            };
            Ok(all
                .into_iter()
                .filter(|w| w.name.to_lowercase().contains(&filter))
                .collect())
        })
        .await
    }

    async fn get_workspace(&self, params: GetWorkspace) -> Result<Workspace, ApiError> {
        op("get workspace", async {
            params.validate()?;
            self.transport.get(&ws(&params.workspace), &[]).await
        })
        .await
    }

    async fn workspace_users(&self, params: WorkspaceUsers) -> Result<Vec<User>, ApiError> {
        op("get users", async {
            params.validate()?;
            let mut query = Vec::new();
            push_opt(&mut query, "email", &params.email);
            self.list(
                format!("{}/users", ws(&params.workspace)),
                query,
                params.pagination,
            )
            .await
        })
        .await
    }

    async fn get_user(&self, params: GetUser) -> Result<User, ApiError> {
        op("get user", async {
            params.validate()?;
            let path = format!("{}/users/{}", ws(&params.workspace), params.user_id);
            self.transport.get(&path, &[]).await
        })
        .await
    }

    async fn get_me(&self) -> Result<User, ApiError> {
        op("get current user", self.transport.get("/user", &[])).await
    }

    async fn get_clients(&self, params: GetClients) -> Result<Vec<Client>, ApiError> {
        op("get clients", async {
            params.validate()?;
            let mut query = Vec::new();
            push_opt(&mut query, "name", &params.name);
            push_opt(&mut query, "archived", &params.archived);
            self.list(
                format!("{}/clients", ws(&params.workspace)),
                query,
                params.pagination,
            )
            .await
        })
        .await
    }

    async fn get_client(&self, params: GetClient) -> Result<Client, ApiError> {
        op("get client", async {
            params.validate()?;
            let path = format!("{}/clients/{}", ws(&params.workspace), params.client_id);
            self.transport.get(&path, &[]).await
        })
        .await
    }

    async fn add_client(&self, params: AddClient) -> Result<Client, ApiError> {
        op("add client", async {
            params.validate()?;
            let path = format!("{}/clients", ws(&params.workspace));
            let body = NameBody {
                name: params.name.trim(),
            };
            self.transport
                .execute(Method::POST, &path, &[], Some(&body))
                .await
        })
        .await
    }

    async fn update_client(&self, params: UpdateClient) -> Result<Client, ApiError> {
        op("update client", async {
            params.validate()?;
            let path = format!("{}/clients/{}", ws(&params.workspace), params.client_id);
            let name = match params.name {
                Some(n) => n,
                None => self.transport.get::<Client>(&path, &[]).await?.name,
            };
            let body = ArchivableBody {
                name: name.trim(),
                archived: params.archived,
            };
            self.transport
                .execute(Method::PUT, &path, &[], Some(&body))
                .await
        })
        .await
    }

    async fn get_projects(&self, params: GetProjects) -> Result<Vec<Project>, ApiError> {
        op("get projects", async {
            params.validate()?;
            let mut query = Vec::new();
            push_opt(&mut query, "name", &params.name);
            if !params.clients.is_empty() {
                query.push(("clients", params.clients.join(",")));
            }
            push_opt(&mut query, "archived", &params.archived);
            if params.hydrate {
                query.push(("hydrated", "true".to_string()));
            }
            self.list(
                format!("{}/projects", ws(&params.workspace)),
                query,
                params.pagination,
            )
            .await
        })
        .await
    }

    async fn get_project(&self, params: GetProject) -> Result<Project, ApiError> {
        op("get project", async {
            params.validate()?;
            let path = format!("{}/projects/{}", ws(&params.workspace), params.project_id);
            let query = if params.hydrate {
                vec![("hydrated", "true".to_string())]
            } else {
                vec![]
            };
            self.transport.get(&path, &query).await
        })
        .await
    }

    async fn add_project(&self, params: AddProject) -> Result<Project, ApiError> {
        op("add project", async {
            params.validate()?;
            let body = ProjectBody {
                name: Some(params.name.trim()),
                client_id: params.client_id.as_deref(),
                color: color(&params.color)?,
                billable: Some(params.billable),
                public: Some(params.public),
                archived: None,
                note: params.note.as_deref(),
            };
            let path = format!("{}/projects", ws(&params.workspace));
            self.transport
                .execute(Method::POST, &path, &[], Some(&body))
                .await
        })
        .await
    }

    async fn update_project(&self, params: UpdateProject) -> Result<Project, ApiError> {
        op("update project", async {
            params.validate()?;
            let body = ProjectBody {
                name: params.name.as_deref().map(str::trim),
                client_id: params.client_id.as_deref(),
                color: color(&params.color)?,
                billable: params.billable,
                public: params.public,
                archived: params.archived,
                note: params.note.as_deref(),
            };
            let path = format!("{}/projects/{}", ws(&params.workspace), params.project_id);
            self.transport
                .execute(Method::PUT, &path, &[], Some(&body))
                .await
        })
        .await
    }

    async fn get_tasks(&self, params: GetTasks) -> Result<Vec<Task>, ApiError> {
        op("get tasks", async {
            params.validate()?;
            let mut query = Vec::new();
            push_opt(&mut query, "name", &params.name);
            push_opt(&mut query, "is-active", &params.active);
            let path = format!(
                "{}/projects/{}/tasks",
                ws(&params.workspace),
                params.project_id
            );
            self.list(path, query, params.pagination).await
        })
        .await
    }

    async fn get_task(&self, params: GetTask) -> Result<Task, ApiError> {
        op("get task", async {
            params.validate()?;
            let path = format!(
                "{}/projects/{}/tasks/{}",
                ws(&params.workspace),
                params.project_id,
                params.task_id
            );
            self.transport.get(&path, &[]).await
        })
        .await
    }

    async fn add_task(&self, params: AddTask) -> Result<Task, ApiError> {
        op("add task", async {
            params.validate()?;
            let body = TaskBody {
                name: params.name.trim(),
                assignee_ids: Some(&params.assignee_ids),
                estimate: params.estimate.map(to_iso_duration),
                billable: params.billable,
                status: None,
            };
            let path = format!(
                "{}/projects/{}/tasks",
                ws(&params.workspace),
                params.project_id
            );
            self.transport
                .execute(Method::POST, &path, &[], Some(&body))
                .await
        })
        .await
    }

    async fn update_task(&self, params: UpdateTask) -> Result<Task, ApiError> {
        op("update task", async {
            params.validate()?;
            let path = format!(
                "{}/projects/{}/tasks/{}",
                ws(&params.workspace),
                params.project_id,
                params.task_id
            );
            let name = match params.name {
                Some(n) => n,
                None => self.transport.get::<Task>(&path, &[]).await?.name,
            };
            let body = TaskBody {
                name: name.trim(),
                assignee_ids: params.assignee_ids.as_deref(),
                estimate: params.estimate.map(to_iso_duration),
                billable: params.billable,
                status: params.status,
            };
            self.transport
                .execute(Method::PUT, &path, &[], Some(&body))
                .await
        })
        .await
    }

    async fn delete_task(&self, params: DeleteTask) -> Result<Task, ApiError> {
        op("delete task", async {
            params.validate()?;
            let path = format!(
                "{}/projects/{}/tasks/{}",
                ws(&params.workspace),
                params.project_id,
                params.task_id
            );
            self.transport
                .execute::<Task, ()>(Method::DELETE, &path, &[], None)
                .await
        })
        .await
    }

    async fn get_tags(&self, params: GetTags) -> Result<Vec<Tag>, ApiError> {
        op("get tags", async {
            params.validate()?;
            let mut query = Vec::new();
            push_opt(&mut query, "name", &params.name);
            push_opt(&mut query, "archived", &params.archived);
            self.list(
                format!("{}/tags", ws(&params.workspace)),
                query,
                params.pagination,
            )
            .await
        })
        .await
    }

    async fn get_tag(&self, params: GetTag) -> Result<Tag, ApiError> {
        op("get tag", async {
            params.validate()?;
            let path = format!("{}/tags/{}", ws(&params.workspace), params.tag_id);
            self.transport.get(&path, &[]).await
        })
        .await
    }

    async fn add_tag(&self, params: AddTag) -> Result<Tag, ApiError> {
        op("add tag", async {
            params.validate()?;
            let path = format!("{}/tags", ws(&params.workspace));
            let body = NameBody {
                name: params.name.trim(),
            };
            self.transport
                .execute(Method::POST, &path, &[], Some(&body))
                .await
        })
        .await
    }

    async fn update_tag(&self, params: UpdateTag) -> Result<Tag, ApiError> {
        op("update tag", async {
            params.validate()?;
            let path = format!("{}/tags/{}", ws(&params.workspace), params.tag_id);
            let name = match params.name {
                Some(n) => n,
                None => self.transport.get::<Tag>(&path, &[]).await?.name,
            };
            let body = ArchivableBody {
                name: name.trim(),
                archived: params.archived,
            };
            self.transport
                .execute(Method::PUT, &path, &[], Some(&body))
                .await
        })
        .await
    }

    async fn get_user_time_entries(
        &self,
        params: GetUserTimeEntries,
    ) -> Result<Vec<TimeEntry>, ApiError> {
        op("get time entries", async {
            params.validate()?;
            let mut query = Vec::new();
            push_opt(&mut query, "start", &params.start.map(api_timestamp));
            push_opt(&mut query, "end", &params.end.map(api_timestamp));
            push_opt(&mut query, "in-progress", &params.in_progress);
            push_opt(&mut query, "description", &params.description);
            push_opt(&mut query, "project", &params.project_id);
            let path = format!(
                "{}/user/{}/time-entries",
                ws(&params.workspace),
                params.user_id
            );
            self.list(path, query, params.pagination).await
        })
        .await
    }

    async fn get_time_entry(&self, params: GetTimeEntry) -> Result<TimeEntry, ApiError> {
        op("get time entry", async {
            params.validate()?;
            let path = format!("{}/time-entries/{}", ws(&params.workspace), params.id);
            self.transport.get(&path, &[]).await
        })
        .await
    }

    async fn create_time_entry(&self, params: CreateTimeEntry) -> Result<TimeEntry, ApiError> {
        op("create time entry", async {
            params.validate()?;
            let path = match &params.user_id {
                Some(user) => format!("{}/user/{}/time-entries", ws(&params.workspace), user),
                None => format!("{}/time-entries", ws(&params.workspace)),
            };
            let body = EntryBody {
                start: api_timestamp(params.start),
                end: params.end.map(api_timestamp),
                description: &params.description,
                project_id: params.project_id.as_deref(),
                task_id: params.task_id.as_deref(),
                tag_ids: &params.tag_ids,
                billable: params.billable,
            };
            self.transport
                .execute(Method::POST, &path, &[], Some(&body))
                .await
        })
        .await
    }

    async fn update_time_entry(&self, params: UpdateTimeEntry) -> Result<TimeEntry, ApiError> {
        op("update time entry", async {
            params.validate()?;
            let path = format!("{}/time-entries/{}", ws(&params.workspace), params.id);
            let body = EntryBody {
                start: api_timestamp(params.start),
                end: params.end.map(api_timestamp),
                description: &params.description,
                project_id: params.project_id.as_deref(),
                task_id: params.task_id.as_deref(),
                tag_ids: &params.tag_ids,
                billable: params.billable,
            };
            self.transport
                .execute(Method::PUT, &path, &[], Some(&body))
                .await
        })
        .await
    }

    async fn delete_time_entry(&self, params: DeleteTimeEntry) -> Result<(), ApiError> {
        op("delete time entry", async {
            params.validate()?;
            let path = format!("{}/time-entries/{}", ws(&params.workspace), params.id);
            self.transport
                .execute::<(), ()>(Method::DELETE, &path, &[], None)
                .await
        })
        .await
    }

    async fn out(&self, params: Out) -> Result<Option<TimeEntry>, ApiError> {
        op("stop time entry", async {
            params.validate()?;
            let path = format!(
                "{}/user/{}/time-entries",
                ws(&params.workspace),
                params.user_id
            );
            let body = EndBody {
                end: api_timestamp(params.end),
            };
            match self
                .transport
                .execute::<TimeEntry, _>(Method::PATCH, &path, &[], Some(&body))
                .await
            {
                Ok(entry) => Ok(Some(entry)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    async fn change_invoiced(&self, params: ChangeInvoiced) -> Result<(), ApiError> {
        op("change invoiced", async {
            params.validate()?;
            let path = format!("{}/time-entries/invoiced", ws(&params.workspace));
            let body = InvoicedBody {
                time_entry_ids: &params.ids,
                invoiced: params.invoiced,
            };
            self.transport
                .execute::<(), _>(Method::PATCH, &path, &[], Some(&body))
                .await
        })
        .await
    }
}
