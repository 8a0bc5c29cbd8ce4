//! engine::steps::validate

use async_trait::async_trait;

use super::Transformer;
use crate::core::types::{validate_ids, EntityId, ValidationError, WorkspaceSettings};
use crate::engine::draft::TimeEntryDraft;
use crate::engine::pipeline::PipelineError;

/// Check the draft against the workspace policy before submitting.
///
/// Checks run in this order and the first failure is returned:
///
/// 1. a start is set
/// 2. the workspace's required fields (skipped when incomplete entries
///    are allowed)
/// 3. an end is set, when required
/// 4. the start is not before the workspace lock
/// 5. the end is not before the start
/// 6. ids are well formed and a task comes with its project
#[derive(Debug, Clone, Default)]
pub struct ValidateDraft {
    settings: WorkspaceSettings,
    validate_required: bool,
    require_end: bool,
}

impl ValidateDraft {
    pub fn new(settings: WorkspaceSettings) -> Self {
        Self {
            settings,
            validate_required: true,
            require_end: false,
        }
    }

    /// Enforce the workspace's required fields (on by default).
    pub fn validate_required(mut self, enabled: bool) -> Self {
        self.validate_required = enabled;
        self
    }

    pub fn require_end(mut self, enabled: bool) -> Self {
        self.require_end = enabled;
        self
    }

    fn required_by_workspace(field: &str) -> ValidationError {
        ValidationError::new(field, "is required by the workspace")
    }

    pub fn check(&self, draft: &TimeEntryDraft) -> Result<(), PipelineError> {
        let start = draft
            .start
            .ok_or_else(|| ValidationError::required("start"))?;

        if self.validate_required {
            let s = &self.settings;
            if s.force_description && draft.description.trim().is_empty() {
                return Err(Self::required_by_workspace("description").into());
            }
            if s.force_projects && draft.project_id.trim().is_empty() {
                return Err(Self::required_by_workspace("project").into());
            }
            if s.force_tasks && draft.task_id.trim().is_empty() {
                return Err(Self::required_by_workspace("task").into());
            }
            if s.force_tags && draft.tag_ids.is_empty() {
                return Err(Self::required_by_workspace("tags").into());
            }
        }

        if self.require_end && draft.end.is_none() {
            return Err(ValidationError::required("end").into());
        }

        if let Some(cutoff) = self.settings.lock_time_entries {
            if start < cutoff {
                return Err(PipelineError::LockedTime { start, cutoff });
            }
        }

        if let Some(end) = draft.end {
            if end < start {
                return Err(PipelineError::InvalidRange { start, end });
            }
        }

        if !draft.project_id.is_empty() {
            EntityId::parse("project", &draft.project_id)?;
        }
        if !draft.task_id.is_empty() {
            if draft.project_id.is_empty() {
                return Err(ValidationError::new("task", "requires a project").into());
            }
            EntityId::parse("task", &draft.task_id)?;
        }
        validate_ids("tag", &draft.tag_ids)?;
        if !draft.user_id.is_empty() {
            EntityId::parse("user", &draft.user_id)?;
        }
        EntityId::parse("workspace", &draft.workspace)?;
        Ok(())
    }
}

#[async_trait]
impl Transformer for ValidateDraft {
    fn name(&self) -> &'static str {
        "validate"
    }

    async fn apply(&self, draft: &mut TimeEntryDraft) -> Result<(), PipelineError> {
        self.check(draft)
    }
}
