//! defaults set|show: the folder defaults file

use anyhow::{bail, Context as _, Result};

use super::{toggle, Context};
use crate::cli::args::DefaultsAction;
use crate::ui::output;
use crate::ui::OutputFormat;

pub async fn defaults(ctx: &Context, action: DefaultsAction) -> Result<()> {
    match action {
        DefaultsAction::Set {
            project,
            task,
            tags,
            billable,
            not_billable,
        } => set(ctx, project, task, tags, toggle(billable, not_billable)).await,
        DefaultsAction::Show => show(ctx),
    }
}

/// Write a defaults file in the working directory.
///
/// Values found further up are carried over and the flags replace them.
/// A new project without a task clears the inherited task.
async fn set(
    ctx: &Context,
    project: Option<String>,
    task: Option<String>,
    tags: Vec<String>,
    billable: Option<bool>,
) -> Result<()> {
    let mut defaults = ctx
        .factory
        .defaults()?
        .map(|found| found.defaults)
        .unwrap_or_default();

    if let Some(project) = project.as_deref() {
        defaults.project_id = Some(ctx.project_id(project).await?);
        if task.is_none() {
            defaults.task_id = None;
        }
    }
    if let Some(task) = task.as_deref() {
        let task_id = match defaults.project_id.as_deref() {
            Some(project_id) => ctx.task_id(task, project_id).await?,
            None => bail!("a default task needs a default project (use --project)"),
        };
        defaults.task_id = Some(task_id);
    }
    if !tags.is_empty() {
        defaults.tag_ids = ctx.tag_ids(&tags).await?;
    }
    if billable.is_some() {
        defaults.billable = billable;
    }
    defaults.workspace = Some(ctx.factory.workspace().await?);

    let path = ctx
        .factory
        .defaults_store()
        .write(&defaults)
        .context("write defaults")?;
    ctx.note(format!("defaults written to {}", path.display()));
    Ok(())
}

fn show(ctx: &Context) -> Result<()> {
    let Some(found) = ctx.factory.defaults()? else {
        bail!(
            "no defaults file found in {} or its parents",
            ctx.factory.cwd().display()
        );
    };
    ctx.note(format!("# {}", found.path.display()));
    let text = if ctx.format == OutputFormat::Json {
        serde_json::to_string_pretty(&found.defaults)?
    } else {
        serde_yaml::to_string(&found.defaults)?
    };
    output::print(text.trim_end());
    Ok(())
}
