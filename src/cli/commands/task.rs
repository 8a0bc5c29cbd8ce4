//! task list|add|edit|delete|done

use anyhow::{Context as _, Result};
use chrono::Duration;

use super::{toggle, Context};
use crate::api::{AddTask, DeleteTask, GetTasks, PaginationParam, UpdateTask};
use crate::cli::args::TaskAction;
use crate::core::timefmt::parse_duration;
use crate::core::types::TaskStatus;

fn estimate(value: Option<&str>) -> Result<Option<Duration>> {
    value
        .map(|v| parse_duration(v).context("invalid --estimate"))
        .transpose()
}

pub async fn task(ctx: &Context, action: TaskAction) -> Result<()> {
    let api = ctx.factory.api()?;
    let workspace = ctx.factory.workspace().await?;
    match action {
        TaskAction::List {
            project,
            name,
            active,
            done,
        } => {
            let project_id = ctx.project_id(&project).await?;
            let tasks = api
                .get_tasks(GetTasks {
                    workspace,
                    project_id,
                    name,
                    active: toggle(active, done),
                    pagination: PaginationParam::all(),
                })
                .await
                .context("list tasks")?;
            ctx.emit(&tasks)
        }
        TaskAction::Add {
            project,
            name,
            assignees,
            estimate: est,
            billable,
        } => {
            let project_id = ctx.project_id(&project).await?;
            let task = api
                .add_task(AddTask {
                    workspace,
                    project_id,
                    name,
                    assignee_ids: ctx.user_ids(&assignees).await?,
                    estimate: estimate(est.as_deref())?,
                    billable: billable.then_some(true),
                })
                .await
                .context("add task")?;
            ctx.emit_one(&task)
        }
        TaskAction::Edit {
            project,
            task,
            name,
            assignees,
            estimate: est,
            billable,
            not_billable,
            done,
            active,
        } => {
            let project_id = ctx.project_id(&project).await?;
            let task_id = ctx.task_id(&task, &project_id).await?;
            let assignee_ids = if assignees.is_empty() {
                None
            } else {
                Some(ctx.user_ids(&assignees).await?)
            };
            let status = toggle(done, active).map(|d| if d { TaskStatus::Done } else { TaskStatus::Active });
            let task = api
                .update_task(UpdateTask {
                    workspace,
                    project_id,
                    task_id,
                    name,
                    assignee_ids,
                    estimate: estimate(est.as_deref())?,
                    billable: toggle(billable, not_billable),
                    status,
                })
                .await
                .context("edit task")?;
            ctx.emit_one(&task)
        }
        TaskAction::Delete { project, task } => {
            let project_id = ctx.project_id(&project).await?;
            let task_id = ctx.task_id(&task, &project_id).await?;
            let task = api
                .delete_task(DeleteTask {
                    workspace,
                    project_id,
                    task_id,
                })
                .await
                .context("delete task")?;
            ctx.note(format!("deleted task {} ({})", task.name, task.id));
            Ok(())
        }
        TaskAction::Done { project, task } => {
            let project_id = ctx.project_id(&project).await?;
            let task_id = ctx.task_id(&task, &project_id).await?;
            let task = api
                .update_task(UpdateTask {
                    workspace,
                    project_id,
                    task_id,
                    status: Some(TaskStatus::Done),
                    ..Default::default()
                })
                .await
                .context("mark task done")?;
            ctx.emit_one(&task)
        }
    }
}
