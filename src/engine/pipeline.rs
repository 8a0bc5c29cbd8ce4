//! engine::pipeline
//!
//! Create or edit a time entry through a fixed sequence of steps.
//!
//! # Lifecycle
//!
//! ```text
//! seeded -> defaults -> flags -> resolved -> prompted? -> validated
//!        -> closed? -> submitted -> hydrated
//! ```
//!
//! The transformer steps are a plain list run in order; the first error
//! stops the run before anything is submitted. Auto-close, submit and
//! hydrate follow:
//!
//! - a failed auto-close is reported in the outcome and submission goes on
//! - a failed submit after a successful auto-close does not reopen the
//!   closed entry; [`PipelineError::SubmitAfterClose`] names it
//! - a failed hydrate leaves the entry submitted; the outcome carries the
//!   bare entry and the hydrate error
//!
//! # Example
//!
//! ```ignore
//! let pipeline = Pipeline::new(api.clone(), cancel.clone())
//!     .step(ApplyDefaults::new(defaults))
//!     .step(ApplyFlags::new(flags))
//!     .step(ValidateDraft::new(settings))
//!     .auto_close(true);
//! let outcome = pipeline.run(TimeEntryDraft::new(ws, user), &CreateEntry).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use super::draft::TimeEntryDraft;
use super::hydrate::hydrate;
use super::steps::Transformer;
use crate::api::{Api, ApiError, CreateTimeEntry, Out, UpdateTimeEntry};
use crate::core::cancel::CancelToken;
use crate::core::defaults::DefaultsError;
use crate::core::types::{TimeEntry, TimeEntryHydrated, ValidationError};
use crate::search::ResolveError;
use crate::ui::PromptError;

/// Errors from the composition pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The user interrupted a prompt or declined the confirmation.
    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("time entries starting before {cutoff} are locked (start: {start})")]
    LockedTime {
        start: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    },

    #[error("end ({end}) is before start ({start})")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Defaults(#[from] DefaultsError),

    #[error(transparent)]
    Prompt(PromptError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// Submission failed after the running entry had been stopped.
    #[error("{source} (the running entry {closed_id} was stopped and stays stopped)")]
    SubmitAfterClose { closed_id: String, source: ApiError },
}

impl PipelineError {
    /// True for user interruptions and cancellation.
    pub fn is_interrupted(&self) -> bool {
        match self {
            PipelineError::Interrupted => true,
            PipelineError::Api(e) | PipelineError::SubmitAfterClose { source: e, .. } => {
                e.is_cancelled()
            }
            PipelineError::Resolve(ResolveError::Api(e)) => e.is_cancelled(),
            _ => false,
        }
    }
}

impl From<PromptError> for PipelineError {
    fn from(e: PromptError) -> Self {
        match e {
            PromptError::Interrupted => PipelineError::Interrupted,
            other => PipelineError::Prompt(other),
        }
    }
}

/// Sends the finished draft to the service.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, api: &dyn Api, draft: &TimeEntryDraft) -> Result<TimeEntry, ApiError>;
}

/// Submit as a new entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateEntry;

/// Submit as an update of `draft.id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateEntry;

fn start_of(draft: &TimeEntryDraft) -> Result<DateTime<Utc>, ValidationError> {
    draft.start.ok_or_else(|| ValidationError::required("start"))
}

#[async_trait]
impl Submitter for CreateEntry {
    async fn submit(&self, api: &dyn Api, draft: &TimeEntryDraft) -> Result<TimeEntry, ApiError> {
        api.create_time_entry(CreateTimeEntry {
            workspace: draft.workspace.clone(),
            user_id: TimeEntryDraft::non_empty(&draft.user_id),
            start: start_of(draft)?,
            end: draft.end,
            description: draft.description.clone(),
            project_id: TimeEntryDraft::non_empty(&draft.project_id),
            task_id: TimeEntryDraft::non_empty(&draft.task_id),
            tag_ids: draft.tag_ids.clone(),
            billable: draft.billable,
        })
        .await
    }
}

#[async_trait]
impl Submitter for UpdateEntry {
    async fn submit(&self, api: &dyn Api, draft: &TimeEntryDraft) -> Result<TimeEntry, ApiError> {
        let id = draft
            .id
            .clone()
            .ok_or_else(|| ValidationError::required("id"))?;
        api.update_time_entry(UpdateTimeEntry {
            workspace: draft.workspace.clone(),
            id,
            start: start_of(draft)?,
            end: draft.end,
            description: draft.description.clone(),
            project_id: TimeEntryDraft::non_empty(&draft.project_id),
            task_id: TimeEntryDraft::non_empty(&draft.task_id),
            tag_ids: draft.tag_ids.clone(),
            billable: draft.billable,
        })
        .await
    }
}

/// What a successful run produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The entry as the service returned it.
    pub entry: TimeEntry,
    /// `None` when hydration failed; see `hydrate_error`.
    pub hydrated: Option<TimeEntryHydrated>,
    pub hydrate_error: Option<ApiError>,
    /// The running entry stopped by auto-close.
    pub closed: Option<TimeEntry>,
    pub close_error: Option<ApiError>,
}

/// A single-shot run of transformers, auto-close, submit and hydrate.
pub struct Pipeline {
    api: Arc<dyn Api>,
    cancel: CancelToken,
    steps: Vec<Box<dyn Transformer>>,
    auto_close: bool,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let steps: Vec<&str> = self.steps.iter().map(|s| s.name()).collect();
        f.debug_struct("Pipeline")
            .field("steps", &steps)
            .field("auto_close", &self.auto_close)
            .finish()
    }
}

impl Pipeline {
    pub fn new(api: Arc<dyn Api>, cancel: CancelToken) -> Self {
        Self {
            api,
            cancel,
            steps: Vec::new(),
            auto_close: false,
        }
    }

    /// Append a transformer. Steps run in the order they were added.
    pub fn step(mut self, step: impl Transformer + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Stop the user's running entry at the draft's start before submitting.
    pub fn auto_close(mut self, enabled: bool) -> Self {
        self.auto_close = enabled;
        self
    }

    /// Names of the configured steps, in order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    fn check_cancel(&self) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(ApiError::Cancelled.into());
        }
        Ok(())
    }

    /// Run every step on `draft`, then submit it with `submitter`.
    pub async fn run(
        &self,
        mut draft: TimeEntryDraft,
        submitter: &dyn Submitter,
    ) -> Result<PipelineOutcome, PipelineError> {
        for step in &self.steps {
            self.check_cancel()?;
            step.apply(&mut draft).await?;
            debug!(step = step.name(), "applied");
        }
        self.check_cancel()?;

        let (closed, close_error) = if self.auto_close {
            self.close_running(&draft).await?
        } else {
            (None, None)
        };

        self.check_cancel()?;
        let entry = match submitter.submit(self.api.as_ref(), &draft).await {
            Ok(entry) => entry,
            Err(source) => {
                return Err(match &closed {
                    Some(c) => PipelineError::SubmitAfterClose {
                        closed_id: c.id.clone(),
                        source,
                    },
                    None => PipelineError::Api(source),
                })
            }
        };

        let (hydrated, hydrate_error) =
            match hydrate(Arc::clone(&self.api), entry.clone(), &self.cancel).await {
                Ok(h) => (Some(h), None),
                Err(e) => {
                    debug!(error = %e, "hydrate failed after submit");
                    (None, Some(e))
                }
            };

        Ok(PipelineOutcome {
            entry,
            hydrated,
            hydrate_error,
            closed,
            close_error,
        })
    }

    async fn close_running(
        &self,
        draft: &TimeEntryDraft,
    ) -> Result<(Option<TimeEntry>, Option<ApiError>), PipelineError> {
        let end = start_of(draft)?;
        let params = Out {
            workspace: draft.workspace.clone(),
            user_id: draft.user_id.clone(),
            end,
        };
        match self.api.out(params).await {
            Ok(closed) => Ok((closed, None)),
            Err(e) if e.is_cancelled() => Err(e.into()),
            Err(e) => {
                debug!(error = %e, "auto-close failed");
                Ok((None, Some(e)))
            }
        }
    }
}
