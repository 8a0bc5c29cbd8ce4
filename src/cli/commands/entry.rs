//! in, manual, edit and clone: time entries composed through the pipeline

use anyhow::{Context as _, Result};

use super::Context;
use crate::cli::args::EntryArgs;
use crate::engine::{
    CreateEntry, EntryFlags, PipelineOutcome, Submitter, TimeEntryDraft, UpdateEntry,
};
use crate::factory::EntryMode;

/// Turn command-line entry fields into pipeline flags.
pub(super) fn flags(ctx: &Context, args: EntryArgs) -> Result<EntryFlags> {
    let billable = args.billable();
    let start = args
        .when
        .as_deref()
        .map(|w| ctx.instant("--when", w))
        .transpose()?;
    let end = args
        .when_to_close
        .as_deref()
        .map(|w| ctx.instant("--when-to-close", w))
        .transpose()?;
    Ok(EntryFlags {
        start,
        end,
        description: args.description,
        project: args.project,
        task: args.task,
        tags: (!args.tags.is_empty()).then_some(args.tags),
        billable,
    })
}

async fn compose(
    ctx: &Context,
    draft: TimeEntryDraft,
    flags: EntryFlags,
    mode: EntryMode,
    submitter: &dyn Submitter,
    op: &'static str,
) -> Result<()> {
    let pipeline = ctx.factory.pipeline(flags, mode).await.context(op)?;
    let outcome = pipeline.run(draft, submitter).await.context(op)?;
    report(ctx, outcome)
}

/// Show what a run did: the stopped entry, the submitted entry, and
/// whatever could not be done after submitting.
fn report(ctx: &Context, outcome: PipelineOutcome) -> Result<()> {
    if let Some(closed) = &outcome.closed {
        ctx.note(format!("stopped running entry {}", closed.id));
    }
    if let Some(e) = &outcome.close_error {
        ctx.warn(format!("could not stop the running entry: {e}"));
    }
    match &outcome.hydrated {
        Some(hydrated) => ctx.emit_one(hydrated),
        None => {
            if let Some(e) = &outcome.hydrate_error {
                ctx.warn(format!("entry {} was saved but could not be loaded: {e}", outcome.entry.id));
            }
            ctx.emit_one(&outcome.entry)
        }
    }
}

/// `in`: start an entry now (or at `--when`), stopping the running one.
pub async fn start(ctx: &Context, args: EntryArgs) -> Result<()> {
    let flags = flags(ctx, args)?;
    let mut draft = ctx.factory.new_draft().await?;
    draft.start = Some(ctx.factory.now());
    let mode = EntryMode {
        apply_defaults: true,
        auto_close: true,
        require_end: false,
    };
    compose(ctx, draft, flags, mode, &CreateEntry, "start time entry").await
}

/// `manual`: add an entry that already ended.
pub async fn manual(ctx: &Context, args: EntryArgs) -> Result<()> {
    let flags = flags(ctx, args)?;
    let draft = ctx.factory.new_draft().await?;
    let mode = EntryMode {
        apply_defaults: true,
        auto_close: false,
        require_end: true,
    };
    compose(ctx, draft, flags, mode, &CreateEntry, "add time entry").await
}

/// `edit`: change an existing entry. Folder defaults do not apply.
pub async fn edit(ctx: &Context, reference: &str, args: EntryArgs) -> Result<()> {
    let flags = flags(ctx, args)?;
    let entry = ctx.time_entry(reference).await.context("edit time entry")?;
    let draft = TimeEntryDraft::edit(&entry);
    compose(ctx, draft, flags, EntryMode::default(), &UpdateEntry, "edit time entry").await
}

/// `clone`: start a new running entry with another entry's values.
pub async fn clone_entry(ctx: &Context, reference: &str, args: EntryArgs) -> Result<()> {
    let flags = flags(ctx, args)?;
    let source = ctx.time_entry(reference).await.context("clone time entry")?;
    let mut draft = TimeEntryDraft::copy_of(&source);
    draft.start = Some(ctx.factory.now());
    draft.end = None;
    draft.user_id = ctx.factory.user_id().await?;
    let mode = EntryMode {
        apply_defaults: true,
        auto_close: true,
        require_end: false,
    };
    compose(ctx, draft, flags, mode, &CreateEntry, "clone time entry").await
}
