//! engine::steps::flags

use async_trait::async_trait;

use super::Transformer;
use crate::engine::draft::{EntryFlags, TimeEntryDraft};
use crate::engine::pipeline::PipelineError;

/// Overwrite draft fields with the values given as flags.
///
/// Tags given as a flag replace the draft's list. Moving the draft to
/// another project without naming a task clears the task.
#[derive(Debug, Clone, Default)]
pub struct ApplyFlags {
    flags: EntryFlags,
}

impl ApplyFlags {
    pub fn new(flags: EntryFlags) -> Self {
        Self { flags }
    }
}

#[async_trait]
impl Transformer for ApplyFlags {
    fn name(&self) -> &'static str {
        "flags"
    }

    async fn apply(&self, draft: &mut TimeEntryDraft) -> Result<(), PipelineError> {
        let flags = &self.flags;
        if let Some(start) = flags.start {
            draft.start = Some(start);
        }
        if let Some(end) = flags.end {
            draft.end = Some(end);
        }
        if let Some(description) = &flags.description {
            draft.description = description.clone();
        }
        if let Some(project) = &flags.project {
            if project.trim() != draft.project_id && flags.task.is_none() {
                draft.task_id.clear();
            }
            draft.project_id = project.trim().to_string();
        }
        if let Some(task) = &flags.task {
            draft.task_id = task.trim().to_string();
        }
        if let Some(tags) = &flags.tags {
            draft.tag_ids = tags
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        }
        if let Some(billable) = flags.billable {
            draft.billable = Some(billable);
        }
        Ok(())
    }
}
