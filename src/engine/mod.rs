//! engine
//!
//! Composes, submits and hydrates time entries.
//!
//! # Architecture
//!
//! ```text
//! draft -> [defaults -> flags -> resolve -> prompt? -> validate]
//!       -> auto-close? -> submit -> hydrate
//! ```
//!
//! - [`draft`] - the mutable [`TimeEntryDraft`] and the [`EntryFlags`] overlay
//! - [`steps`] - the [`Transformer`](steps::Transformer) steps
//! - [`pipeline`] - [`Pipeline`], submission and the outcome of a run
//! - [`hydrate`] - concurrent replacement of ids with entities
//!
//! # Invariants
//!
//! - Nothing is submitted when any transformer fails
//! - A failed auto-close does not stop the submission
//! - A failed submission does not reopen an entry auto-close stopped
//! - Hydrated tags keep the order of the entry's tag ids

pub mod draft;
pub mod hydrate;
pub mod pipeline;
pub mod steps;

pub use draft::{EntryFlags, TimeEntryDraft};
pub use hydrate::{hydrate, hydrate_all};
pub use pipeline::{
    CreateEntry, Pipeline, PipelineError, PipelineOutcome, Submitter, UpdateEntry,
};
pub use steps::{
    ApplyDefaults, ApplyFlags, PromptFields, PromptOptions, ResolveNames, Transformer,
    ValidateDraft,
};
