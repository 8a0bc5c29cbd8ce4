//! engine::steps::resolve

use async_trait::async_trait;
use tracing::debug;

use super::Transformer;
use crate::core::types::EntityId;
use crate::engine::draft::TimeEntryDraft;
use crate::engine::pipeline::PipelineError;
use crate::search::{ResolveError, Resolver};

/// Replace names in the draft with ids.
///
/// Values already shaped like ids are kept as they are. Project, tags and
/// user resolve concurrently; the task resolves once its project id is
/// known. In interactive runs a name that matches nothing is cleared so
/// the prompt can ask for it; otherwise the miss fails the run.
#[derive(Debug, Clone)]
pub struct ResolveNames {
    resolver: Resolver,
    interactive: bool,
}

impl ResolveNames {
    pub fn new(resolver: Resolver, interactive: bool) -> Self {
        Self {
            resolver,
            interactive,
        }
    }

    fn needs_lookup(value: &str) -> bool {
        !value.trim().is_empty() && !EntityId::is_valid(value.trim())
    }

    /// Resolved id, `Ok(None)` for a swallowed miss.
    fn settle(
        &self,
        what: &str,
        result: Result<String, ResolveError>,
    ) -> Result<Option<String>, PipelineError> {
        match result {
            Ok(id) => Ok(Some(id)),
            Err(e) if e.is_not_found() && self.interactive => {
                debug!(field = what, error = %e, "unresolved, leaving it to the prompt");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Transformer for ResolveNames {
    fn name(&self) -> &'static str {
        "resolve"
    }

    async fn apply(&self, draft: &mut TimeEntryDraft) -> Result<(), PipelineError> {
        let project_ref = draft.project_id.clone();
        let user_ref = draft.user_id.clone();
        let pending: Vec<(usize, String)> = draft
            .tag_ids
            .iter()
            .enumerate()
            .filter(|(_, t)| Self::needs_lookup(t))
            .map(|(i, t)| (i, t.clone()))
            .collect();
        let tag_refs: Vec<String> = pending.iter().map(|(_, t)| t.clone()).collect();

        let project = async {
            if Self::needs_lookup(&project_ref) {
                Some(self.resolver.project(&project_ref).await)
            } else {
                None
            }
        };
        let user = async {
            if Self::needs_lookup(&user_ref) {
                Some(self.resolver.user(&user_ref).await)
            } else {
                None
            }
        };
        let tags = async {
            if tag_refs.is_empty() {
                None
            } else if self.interactive {
                Some(self.resolver.tags_or_none(&tag_refs).await)
            } else {
                let ids = self.resolver.tags(&tag_refs).await;
                Some(ids.map(|ids| ids.into_iter().map(Some).collect::<Vec<_>>()))
            }
        };
        let (project, user, tags) = tokio::join!(project, user, tags);

        if let Some(result) = project {
            match self.settle("project", result)? {
                Some(id) => draft.project_id = id,
                None => {
                    draft.project_id.clear();
                    draft.task_id.clear();
                }
            }
        }
        if let Some(result) = user {
            if let Some(id) = self.settle("user", result)? {
                draft.user_id = id;
            }
        }
        if let Some(result) = tags {
            let mut slots: Vec<Option<String>> = draft.tag_ids.drain(..).map(Some).collect();
            for ((position, reference), id) in pending.iter().zip(result?) {
                if id.is_none() {
                    debug!(field = "tags", reference = %reference, "unresolved, leaving it to the prompt");
                }
                slots[*position] = id;
            }
            draft.tag_ids = slots.into_iter().flatten().collect();
        }

        if Self::needs_lookup(&draft.task_id) && !draft.project_id.is_empty() {
            let result = self.resolver.task(&draft.task_id, &draft.project_id).await;
            match self.settle("task", result)? {
                Some(id) => draft.task_id = id,
                None => draft.task_id.clear(),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use crate::core::cancel::CancelToken;
    use crate::core::types::{Project, Tag, Task, TaskStatus};
    use crate::search::ResolverOptions;
    use std::sync::Arc;

    fn id(n: u64) -> String {
        MockApi::id(n)
    }

    fn api() -> MockApi {
        MockApi::new()
            .with_project(Project {
                id: id(10),
                name: "Clockify CLI".into(),
                workspace_id: id(1),
                client_id: None,
                client_name: None,
                color: String::new(),
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
                name: "Write docs".into(),
                project_id: id(10),
                status: TaskStatus::Active,
                estimate: None,
                assignee_ids: vec![],
                billable: false,
            })
            .with_tag(Tag {
                id: id(20),
                name: "meeting".into(),
                workspace_id: id(1),
                archived: false,
            })
    }

    fn step(api: MockApi, interactive: bool) -> ResolveNames {
        let resolver = Resolver::new(
            Arc::new(api),
            id(1),
            ResolverOptions::default(),
            CancelToken::new(),
        );
        ResolveNames::new(resolver, interactive)
    }

    fn draft() -> TimeEntryDraft {
        TimeEntryDraft {
            workspace: id(1),
            user_id: id(2),
            project_id: "cli".into(),
            task_id: "docs".into(),
            tag_ids: vec![id(99), "meet".into()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn names_become_ids_and_ids_stay() {
        let api = api();
        let mut d = draft();
        step(api.clone(), false).apply(&mut d).await.unwrap();
        assert_eq!(d.project_id, id(10));
        assert_eq!(d.task_id, id(30));
        assert_eq!(d.tag_ids, vec![id(99), id(20)]);
        assert_eq!(d.user_id, id(2));
        assert_eq!(api.count("get users"), 0);
    }

    #[tokio::test]
    async fn miss_fails_when_not_interactive() {
        let mut d = draft();
        d.project_id = "unknown".into();
        let err = step(api(), false).apply(&mut d).await.unwrap_err();
        assert!(matches!(err, PipelineError::Resolve(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn only_unknown_tags_are_dropped_when_interactive() {
        let mut d = draft();
        d.tag_ids = vec![id(99), "nothing like it".into(), "meet".into()];
        step(api(), true).apply(&mut d).await.unwrap();
        assert_eq!(d.tag_ids, vec![id(99), id(20)]);
    }

    #[tokio::test]
    async fn unknown_tag_fails_when_not_interactive() {
        let mut d = draft();
        d.tag_ids = vec!["meet".into(), "nothing like it".into()];
        let err = step(api(), false).apply(&mut d).await.unwrap_err();
        assert!(matches!(err, PipelineError::Resolve(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn miss_is_cleared_when_interactive() {
        let mut d = draft();
        d.project_id = "unknown".into();
        step(api(), true).apply(&mut d).await.unwrap();
        assert_eq!(d.project_id, "");
        assert_eq!(d.task_id, "");
    }
}
