//! engine::steps
//!
//! The transformers a [`Pipeline`](super::Pipeline) runs, in their fixed
//! order:
//!
//! 1. [`ApplyDefaults`] - fill empty fields from the folder defaults
//! 2. [`ApplyFlags`] - overwrite fields given on the command line
//! 3. [`ResolveNames`] - turn project, task, tag and user names into ids
//! 4. [`PromptFields`] - ask for every field (interactive runs only)
//! 5. [`ValidateDraft`] - workspace policy, locks, ranges and id shapes

use async_trait::async_trait;

use super::draft::TimeEntryDraft;
use super::pipeline::PipelineError;

mod defaults;
mod flags;
mod prompt;
mod resolve;
mod validate;

pub use defaults::ApplyDefaults;
pub use flags::ApplyFlags;
pub use prompt::{PromptFields, PromptOptions};
pub use resolve::ResolveNames;
pub use validate::ValidateDraft;

/// One step of the pipeline: changes the draft or rejects it.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn apply(&self, draft: &mut TimeEntryDraft) -> Result<(), PipelineError>;
}
