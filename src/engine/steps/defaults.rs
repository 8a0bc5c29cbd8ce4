//! engine::steps::defaults

use async_trait::async_trait;

use super::Transformer;
use crate::core::defaults::Defaults;
use crate::engine::draft::TimeEntryDraft;
use crate::engine::pipeline::PipelineError;

/// Fill empty draft fields from the folder defaults.
///
/// Values already in the draft win. Tags are not merged: a draft with
/// tags keeps them, a draft without tags takes the defaults' list. The
/// default task only applies when the draft ends up on the default project.
#[derive(Debug, Clone, Default)]
pub struct ApplyDefaults {
    defaults: Option<Defaults>,
}

impl ApplyDefaults {
    /// `None` means no defaults file was found.
    pub fn new(defaults: Option<Defaults>) -> Self {
        Self { defaults }
    }

    /// Apply `defaults` to `draft`.
    pub fn fill(draft: &mut TimeEntryDraft, defaults: &Defaults) {
        let value = |v: &Option<String>| v.as_deref().and_then(TimeEntryDraft::non_empty);

        if draft.workspace.trim().is_empty() {
            if let Some(ws) = value(&defaults.workspace) {
                draft.workspace = ws;
            }
        }
        if draft.project_id.trim().is_empty() {
            if let Some(project) = value(&defaults.project_id) {
                draft.project_id = project;
            }
        }
        let on_default_project = value(&defaults.project_id).as_deref() == Some(draft.project_id.as_str());
        if draft.task_id.trim().is_empty() && on_default_project {
            if let Some(task) = value(&defaults.task_id) {
                draft.task_id = task;
            }
        }
        if draft.tag_ids.is_empty() {
            draft.tag_ids = defaults.tag_ids.clone();
        }
        if draft.billable.is_none() {
            draft.billable = defaults.billable;
        }
    }
}

#[async_trait]
impl Transformer for ApplyDefaults {
    fn name(&self) -> &'static str {
        "defaults"
    }

    async fn apply(&self, draft: &mut TimeEntryDraft) -> Result<(), PipelineError> {
        if let Some(defaults) = &self.defaults {
            Self::fill(draft, defaults);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Defaults {
        Defaults {
            workspace: Some("w1".into()),
            project_id: Some("p1".into()),
            task_id: Some("k1".into()),
            tag_ids: vec!["t1".into()],
            billable: Some(true),
        }
    }

    #[test]
    fn fills_empty_fields() {
        let mut draft = TimeEntryDraft::default();
        ApplyDefaults::fill(&mut draft, &defaults());
        assert_eq!(draft.workspace, "w1");
        assert_eq!(draft.project_id, "p1");
        assert_eq!(draft.task_id, "k1");
        assert_eq!(draft.tag_ids, vec!["t1"]);
        assert_eq!(draft.billable, Some(true));
    }

    #[test]
    fn draft_values_win_and_tags_are_not_merged() {
        let mut draft = TimeEntryDraft {
            project_id: "p2".into(),
            tag_ids: vec!["t2".into()],
            billable: Some(false),
            ..Default::default()
        };
        ApplyDefaults::fill(&mut draft, &defaults());
        assert_eq!(draft.project_id, "p2");
        assert_eq!(draft.task_id, "", "default task belongs to another project");
        assert_eq!(draft.tag_ids, vec!["t2"]);
        assert_eq!(draft.billable, Some(false));
    }

    #[tokio::test]
    async fn missing_file_is_a_no_op() {
        let mut draft = TimeEntryDraft::new("w9", "u1");
        ApplyDefaults::new(None).apply(&mut draft).await.unwrap();
        assert_eq!(draft, TimeEntryDraft::new("w9", "u1"));
    }
}
