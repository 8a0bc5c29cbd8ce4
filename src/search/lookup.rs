//! search::lookup
//!
//! [`Resolver`]: per-entity lookups backed by the [`Api`].
//!
//! Each lookup lists its entity kind (all pages) and resolves against that
//! list. Kind-specific rules:
//!
//! - projects can be matched together with their client name
//!   (`"<project> | <client or Without Client>"`)
//! - tasks are scoped to a project, and the scope is reported on misses
//! - archived tags are dropped unless allowed
//! - users match on name and email

use std::sync::Arc;

use crate::api::{
    Api, ApiError, GetClients, GetProjects, GetTags, GetTasks, GetWorkspaces, PaginationParam,
    WorkspaceUsers,
};
use crate::core::cancel::CancelToken;

use super::resolver::{resolve, resolve_many, resolve_one, Candidate, EntityKind, Filters, ResolveError};

/// Switches that change how candidates are built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    pub search_project_with_client: bool,
    pub allow_archived_tags: bool,
}

/// Resolves references within one workspace.
#[derive(Clone)]
pub struct Resolver {
    api: Arc<dyn Api>,
    workspace: String,
    options: ResolverOptions,
    cancel: CancelToken,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("workspace", &self.workspace)
            .field("options", &self.options)
            .finish()
    }
}

impl Resolver {
    pub fn new(
        api: Arc<dyn Api>,
        workspace: impl Into<String>,
        options: ResolverOptions,
        cancel: CancelToken,
    ) -> Self {
        Self {
            api,
            workspace: workspace.into(),
            options,
            cancel,
        }
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace
    }

    fn filters(&self) -> Filters {
        Filters::new().with("workspace", self.workspace.clone())
    }

    // ---------------------------------------------------------------------
    // Candidate lists
    // ---------------------------------------------------------------------

    /// Active projects, named with their client when configured.
    pub async fn project_candidates(&self) -> Result<Vec<Candidate>, ApiError> {
        let projects = self
            .api
            .get_projects(GetProjects {
                workspace: self.workspace.clone(),
                archived: Some(false),
                pagination: PaginationParam::all(),
                ..Default::default()
            })
            .await?;
        let with_client = self.options.search_project_with_client;
        Ok(projects
            .into_iter()
            .map(|p| {
                let name = if with_client {
                    format!("{} | {}", p.name, p.client_label())
                } else {
                    p.name.clone()
                };
                Candidate::new(p.id, name)
            })
            .collect())
    }

    pub async fn client_candidates(&self) -> Result<Vec<Candidate>, ApiError> {
        let clients = self
            .api
            .get_clients(GetClients {
                workspace: self.workspace.clone(),
                archived: Some(false),
                pagination: PaginationParam::all(),
                ..Default::default()
            })
            .await?;
        Ok(clients
            .into_iter()
            .map(|c| Candidate::new(c.id, c.name))
            .collect())
    }

    /// Active tasks of `project_id`.
    pub async fn task_candidates(&self, project_id: &str) -> Result<Vec<Candidate>, ApiError> {
        let tasks = self
            .api
            .get_tasks(GetTasks {
                workspace: self.workspace.clone(),
                project_id: project_id.to_string(),
                active: Some(true),
                pagination: PaginationParam::all(),
                ..Default::default()
            })
            .await?;
        Ok(tasks
            .into_iter()
            .map(|t| Candidate::new(t.id, t.name))
            .collect())
    }

    /// Tags, without archived ones unless they are allowed.
    pub async fn tag_candidates(&self) -> Result<Vec<Candidate>, ApiError> {
        let tags = self
            .api
            .get_tags(GetTags {
                workspace: self.workspace.clone(),
                pagination: PaginationParam::all(),
                ..Default::default()
            })
            .await?;
        let allow_archived = self.options.allow_archived_tags;
        Ok(tags
            .into_iter()
            .filter(|t| allow_archived || !t.archived)
            .map(|t| Candidate::new(t.id, t.name))
            .collect())
    }

    pub async fn user_candidates(&self) -> Result<Vec<Candidate>, ApiError> {
        let users = self
            .api
            .workspace_users(WorkspaceUsers {
                workspace: self.workspace.clone(),
                pagination: PaginationParam::all(),
                ..Default::default()
            })
            .await?;
        Ok(users
            .into_iter()
            .map(|u| Candidate::new(u.id, format!("{} {}", u.name, u.email)))
            .collect())
    }

    // ---------------------------------------------------------------------
    // Lookups
    // ---------------------------------------------------------------------

    pub async fn project(&self, reference: &str) -> Result<String, ResolveError> {
        resolve_one(reference, EntityKind::Project, &self.filters(), || {
            self.project_candidates()
        })
        .await
    }

    pub async fn client(&self, reference: &str) -> Result<String, ResolveError> {
        resolve_one(reference, EntityKind::Client, &self.filters(), || {
            self.client_candidates()
        })
        .await
    }

    pub async fn clients(&self, references: &[String]) -> Result<Vec<String>, ResolveError> {
        resolve_many(
            references,
            EntityKind::Client,
            &self.filters(),
            &self.cancel,
            || self.client_candidates(),
        )
        .await
    }

    pub async fn task(&self, reference: &str, project_id: &str) -> Result<String, ResolveError> {
        let filters = Filters::new()
            .with("project", project_id)
            .with("workspace", self.workspace.clone());
        resolve_one(reference, EntityKind::Task, &filters, || {
            self.task_candidates(project_id)
        })
        .await
    }

    pub async fn tag(&self, reference: &str) -> Result<String, ResolveError> {
        resolve_one(reference, EntityKind::Tag, &self.filters(), || {
            self.tag_candidates()
        })
        .await
    }

    pub async fn tags(&self, references: &[String]) -> Result<Vec<String>, ResolveError> {
        resolve_many(
            references,
            EntityKind::Tag,
            &self.filters(),
            &self.cancel,
            || self.tag_candidates(),
        )
        .await
    }

    /// Resolve every tag reference against one listing, `None` where a
    /// reference matches nothing.
    pub async fn tags_or_none(
        &self,
        references: &[String],
    ) -> Result<Vec<Option<String>>, ResolveError> {
        if references.is_empty() {
            return Ok(Vec::new());
        }
        let candidates = self.tag_candidates().await?;
        if self.cancel.is_cancelled() {
            return Err(ApiError::Cancelled.into());
        }
        let filters = self.filters();
        references
            .iter()
            .map(|r| match resolve(r, EntityKind::Tag, &candidates, &filters) {
                Ok(id) => Ok(Some(id)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            })
            .collect()
    }

    pub async fn user(&self, reference: &str) -> Result<String, ResolveError> {
        resolve_one(reference, EntityKind::User, &self.filters(), || {
            self.user_candidates()
        })
        .await
    }

    pub async fn users(&self, references: &[String]) -> Result<Vec<String>, ResolveError> {
        resolve_many(
            references,
            EntityKind::User,
            &self.filters(),
            &self.cancel,
            || self.user_candidates(),
        )
        .await
    }

    /// Resolve a workspace visible to the API key.
    pub async fn workspace(api: &dyn Api, reference: &str) -> Result<String, ResolveError> {
        resolve_one(reference, EntityKind::Workspace, &Filters::new(), || async {
            let workspaces = api.get_workspaces(GetWorkspaces::default()).await?;
            Ok(workspaces
                .into_iter()
                .map(|w| Candidate::new(w.id, w.name))
                .collect())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use crate::core::types::{Project, Tag};

    fn project(n: u64, name: &str, client: Option<&str>) -> Project {
        Project {
            id: MockApi::id(n),
            name: name.into(),
            workspace_id: MockApi::id(1),
            client_id: client.map(|_| MockApi::id(n + 100)),
            client_name: client.map(String::from),
            color: String::new(),
            billable: false,
            public: true,
            archived: false,
            note: String::new(),
            hourly_rate: None,
            tasks: vec![],
            memberships: vec![],
            custom_fields: vec![],
        }
    }

    fn tag(n: u64, name: &str, archived: bool) -> Tag {
        Tag {
            id: MockApi::id(n),
            name: name.into(),
            workspace_id: MockApi::id(1),
            archived,
        }
    }

    fn resolver(api: MockApi, options: ResolverOptions) -> Resolver {
        Resolver::new(Arc::new(api), MockApi::id(1), options, CancelToken::new())
    }

    #[tokio::test]
    async fn project_with_client_name() {
        let api = MockApi::new()
            .with_project(project(10, "CLI", Some("Coderockr")))
            .with_project(project(11, "CLI", None));

        let with_client = resolver(
            api.clone(),
            ResolverOptions {
                search_project_with_client: true,
                ..Default::default()
            },
        );
        assert_eq!(
            with_client.project("cli without").await.unwrap(),
            MockApi::id(11)
        );
        assert_eq!(
            with_client.project("coderockr cli").await.unwrap(),
            MockApi::id(10)
        );

        let plain = resolver(api, ResolverOptions::default());
        assert!(plain.project("coderockr cli").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn archived_tags_are_skipped_unless_allowed() {
        let api = MockApi::new()
            .with_tag(tag(20, "legacy", true))
            .with_tag(tag(21, "meeting", false));

        let strict = resolver(api.clone(), ResolverOptions::default());
        assert!(strict.tag("legacy").await.unwrap_err().is_not_found());

        let lenient = resolver(
            api,
            ResolverOptions {
                allow_archived_tags: true,
                ..Default::default()
            },
        );
        assert_eq!(lenient.tag("legacy").await.unwrap(), MockApi::id(20));
    }

    #[tokio::test]
    async fn task_miss_reports_project_scope() {
        let api = MockApi::new().with_project(project(10, "CLI", None));
        let r = resolver(api, ResolverOptions::default());
        let err = r.task("write docs", &MockApi::id(10)).await.unwrap_err();
        match err {
            ResolveError::NotFound { filters, .. } => {
                let project_id = MockApi::id(10);
                assert_eq!(filters.get("project"), Some(project_id.as_str()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn tags_list_once() {
        let api = MockApi::new()
            .with_tag(tag(20, "meeting", false))
            .with_tag(tag(21, "review", false));
        let r = resolver(api.clone(), ResolverOptions::default());
        let ids = r
            .tags(&["review".to_string(), "meeting".to_string()])
            .await
            .unwrap();
        assert_eq!(ids, vec![MockApi::id(21), MockApi::id(20)]);
        assert_eq!(api.count("get tags"), 1);
    }
}
