//! out, show, delete and invoicing of time entries

use anyhow::{Context as _, Result};

use super::Context;
use crate::api::{ChangeInvoiced, DeleteTimeEntry, Out};
use crate::engine::hydrate;

/// Stop the running entry at `when` (default: now).
pub async fn out(ctx: &Context, when: Option<&str>) -> Result<()> {
    let end = match when {
        Some(w) => ctx.instant("--when", w)?,
        None => ctx.factory.now(),
    };
    let api = ctx.factory.api()?;
    let params = Out {
        workspace: ctx.factory.workspace().await?,
        user_id: ctx.factory.user_id().await?,
        end,
    };
    match api.out(params).await.context("stop time entry")? {
        Some(entry) => {
            let hydrated = hydrate(api, entry, ctx.factory.cancel_token()).await?;
            ctx.emit_one(&hydrated)
        }
        None => {
            ctx.note("there is no time entry in progress");
            Ok(())
        }
    }
}

pub async fn show(ctx: &Context, reference: &str) -> Result<()> {
    let entry = ctx.time_entry(reference).await.context("show time entry")?;
    let hydrated = hydrate(ctx.factory.api()?, entry, ctx.factory.cancel_token()).await?;
    ctx.emit_one(&hydrated)
}

/// Delete each entry in turn, stopping at the first failure.
pub async fn delete(ctx: &Context, references: &[String]) -> Result<()> {
    let api = ctx.factory.api()?;
    let workspace = ctx.factory.workspace().await?;
    for reference in references {
        let entry = ctx.time_entry(reference).await?;
        api.delete_time_entry(DeleteTimeEntry {
            workspace: workspace.clone(),
            id: entry.id.clone(),
        })
        .await
        .with_context(|| format!("delete time entry {reference}"))?;
        ctx.note(format!("deleted time entry {}", entry.id));
    }
    Ok(())
}

pub async fn mark_invoiced(ctx: &Context, references: &[String], invoiced: bool) -> Result<()> {
    let mut ids = Vec::with_capacity(references.len());
    for reference in references {
        ids.push(ctx.time_entry(reference).await?.id);
    }
    let count = ids.len();
    ctx.factory
        .api()?
        .change_invoiced(ChangeInvoiced {
            workspace: ctx.factory.workspace().await?,
            ids,
            invoiced,
        })
        .await?;
    let state = if invoiced { "invoiced" } else { "not invoiced" };
    ctx.note(format!("marked {count} time entries as {state}"));
    Ok(())
}
