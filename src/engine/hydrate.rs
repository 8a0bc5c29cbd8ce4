//! engine::hydrate
//!
//! Replace a time entry's foreign keys with the current entities.
//!
//! # Concurrency
//!
//! Four branches run as spawned tasks: project, user, task, and tags. The
//! tag branch fans out again, one fetch per tag id. Results land in one
//! slot per branch (and per tag position), so tags come back in the order
//! of `tag_ids` whatever order the fetches finish in.
//!
//! [`hydrate_all`] works through at most [`HYDRATE_CONCURRENCY`] entries at
//! a time.
//!
//! The first error wins. Branches still in flight are detached and run to
//! completion; their results are dropped. Cancellation stops branches that
//! have not issued their request yet.

use std::sync::Arc;

use futures::future::{try_join4, try_join_all};
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::{Api, ApiError, GetProject, GetTag, GetTask, GetUser};
use crate::core::cancel::CancelToken;
use crate::core::types::{Project, Tag, Task, TimeEntry, TimeEntryHydrated, User};

async fn joined<T>(handle: JoinHandle<Result<T, ApiError>>) -> Result<T, ApiError> {
    handle.await?
}

fn spawn_branch<T, F>(cancel: &CancelToken, fetch: F) -> JoinHandle<Result<T, ApiError>>
where
    T: Send + 'static,
    F: std::future::Future<Output = Result<T, ApiError>> + Send + 'static,
{
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        fetch.await
    })
}

/// Fetch the project, user, task and tags of `entry` in parallel.
pub async fn hydrate(
    api: Arc<dyn Api>,
    entry: TimeEntry,
    cancel: &CancelToken,
) -> Result<TimeEntryHydrated, ApiError> {
    if cancel.is_cancelled() {
        return Err(ApiError::Cancelled);
    }
    let workspace = entry.workspace_id.clone();
    let project_id = entry.project_id.clone().filter(|p| !p.is_empty());
    let task_id = entry.task_id.clone().filter(|t| !t.is_empty());

    let project: JoinHandle<Result<Option<Project>, ApiError>> = {
        let (api, workspace, project_id) = (Arc::clone(&api), workspace.clone(), project_id.clone());
        spawn_branch(cancel, async move {
            match project_id {
                Some(project_id) => api
                    .get_project(GetProject {
                        workspace,
                        project_id,
                        hydrate: false,
                    })
                    .await
                    .map(Some),
                None => Ok(None),
            }
        })
    };

    let user: JoinHandle<Result<User, ApiError>> = {
        let (api, workspace, user_id) = (Arc::clone(&api), workspace.clone(), entry.user_id.clone());
        spawn_branch(cancel, async move {
            api.get_user(GetUser { workspace, user_id }).await
        })
    };

    let task: JoinHandle<Result<Option<Task>, ApiError>> = {
        let (api, workspace) = (Arc::clone(&api), workspace.clone());
        let ids = project_id.clone().zip(task_id);
        spawn_branch(cancel, async move {
            match ids {
                Some((project_id, task_id)) => api
                    .get_task(GetTask {
                        workspace,
                        project_id,
                        task_id,
                    })
                    .await
                    .map(Some),
                None => Ok(None),
            }
        })
    };

    let tags: JoinHandle<Result<Vec<Tag>, ApiError>> = {
        let branch_cancel = cancel.clone();
        let (api, workspace, tag_ids) = (Arc::clone(&api), workspace.clone(), entry.tag_ids.clone());
        spawn_branch(cancel, async move {
            let fetches = tag_ids.into_iter().map(|tag_id| {
                let (api, workspace) = (Arc::clone(&api), workspace.clone());
                joined(spawn_branch(&branch_cancel, async move {
                    api.get_tag(GetTag { workspace, tag_id }).await
                }))
            });
            try_join_all(fetches).await
        })
    };

    let (project, user, task, tags) =
        try_join4(joined(project), joined(user), joined(task), joined(tags)).await?;
    debug!(entry = %entry.id, tags = tags.len(), "hydrated time entry");
    Ok(TimeEntryHydrated::assemble(entry, project, task, tags, user))
}

/// Entries [`hydrate_all`] hydrates at the same time.
pub const HYDRATE_CONCURRENCY: usize = 4;

/// Hydrate every entry, a few at a time, keeping their order.
pub async fn hydrate_all(
    api: Arc<dyn Api>,
    entries: Vec<TimeEntry>,
    cancel: &CancelToken,
) -> Result<Vec<TimeEntryHydrated>, ApiError> {
    stream::iter(
        entries
            .into_iter()
            .map(|entry| hydrate(Arc::clone(&api), entry, cancel)),
    )
    .buffered(HYDRATE_CONCURRENCY)
    .try_collect()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use crate::core::types::{TaskStatus, TimeInterval, UserSettings};
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn id(n: u64) -> String {
        MockApi::id(n)
    }

    fn user() -> User {
        User {
            id: id(2),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            status: "ACTIVE".into(),
            active_workspace: id(1),
            default_workspace: id(1),
            settings: UserSettings::default(),
        }
    }

    fn tag(n: u64, name: &str) -> Tag {
        Tag {
            id: id(n),
            name: name.into(),
            workspace_id: id(1),
            archived: false,
        }
    }

    fn entry(tag_ids: Vec<String>) -> TimeEntry {
        TimeEntry {
            id: id(50),
            workspace_id: id(1),
            user_id: id(2),
            description: "docs".into(),
            project_id: None,
            task_id: None,
            tag_ids,
            billable: false,
            time_interval: TimeInterval {
                start: Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
                end: None,
            },
            is_locked: false,
        }
    }

    fn api() -> MockApi {
        MockApi::new()
            .with_user(user())
            .with_tag(tag(20, "a"))
            .with_tag(tag(21, "b"))
            .with_tag(tag(22, "c"))
    }

    #[tokio::test]
    async fn tags_follow_input_order() {
        let api = api();
        api.delay("get tag", Duration::from_millis(5));
        let source = entry(vec![id(22), id(20), id(21)]);
        let hydrated = hydrate(Arc::new(api), source, &CancelToken::new()).await.unwrap();
        let ids: Vec<String> = hydrated.tags.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec![id(22), id(20), id(21)]);
        assert!(hydrated.project.is_none());
        assert_eq!(hydrated.user.name, "Ana");
    }

    #[tokio::test]
    async fn skips_project_and_task_when_absent() {
        let api = api();
        hydrate(Arc::new(api.clone()), entry(vec![]), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(api.count("get project"), 0);
        assert_eq!(api.count("get task"), 0);
        assert_eq!(api.count("get user"), 1);
    }

    #[tokio::test]
    async fn fetches_project_and_its_task() {
        let project_id = id(10);
        let api = api()
            .with_project(Project {
                id: project_id.clone(),
                name: "CLI".into(),
                workspace_id: id(1),
                client_id: None,
                client_name: None,
                color: "#00ff00".into(),
                billable: false,
                public: true,
                archived: false,
                note: String::new(),
                hourly_rate: None,
                tasks: vec![],
                memberships: vec![],
                custom_fields: vec![],
            })
            .with_task(Task {
                id: id(30),
                name: "write".into(),
                project_id: project_id.clone(),
                status: TaskStatus::Active,
                estimate: None,
                assignee_ids: vec![],
                billable: false,
            });
        let mut source = entry(vec![id(21)]);
        source.project_id = Some(project_id);
        source.task_id = Some(id(30));
        let hydrated = hydrate(Arc::new(api), source, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(hydrated.project.map(|p| p.name).as_deref(), Some("CLI"));
        assert_eq!(hydrated.task.map(|t| t.name).as_deref(), Some("write"));
        assert_eq!(hydrated.tags[0].name, "b");
    }

    #[tokio::test]
    async fn first_error_wins() {
        let api = api();
        api.fail_on("get user", ApiError::Transport("connection reset".into()));
        let err = hydrate(Arc::new(api), entry(vec![id(20)]), &CancelToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn many_entries_are_hydrated_a_few_at_a_time() {
        let api = api();
        api.delay("get user", Duration::from_millis(5));
        let entries: Vec<TimeEntry> = (0..12)
            .map(|n| {
                let mut e = entry(vec![id(20 + n % 3)]);
                e.id = id(100 + n);
                e
            })
            .collect();
        let hydrated = hydrate_all(Arc::new(api.clone()), entries, &CancelToken::new())
            .await
            .unwrap();

        let ids: Vec<String> = hydrated.iter().map(|h| h.id.clone()).collect();
        let expected: Vec<String> = (0..12).map(|n| id(100 + n)).collect();
        assert_eq!(ids, expected);
        assert_eq!(api.count("get user"), 12);
        assert!(api.peak_in_flight("get user") <= HYDRATE_CONCURRENCY);
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let api = api();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = hydrate(Arc::new(api.clone()), entry(vec![id(20)]), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(api.operations().is_empty());
    }
}
