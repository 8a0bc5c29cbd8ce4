//! project list|add|get|edit

use anyhow::{Context as _, Result};

use super::{toggle, Context};
use crate::api::{AddProject, GetProject, GetProjects, PaginationParam, UpdateProject};
use crate::cli::args::ProjectAction;

pub async fn project(ctx: &Context, action: ProjectAction) -> Result<()> {
    let api = ctx.factory.api()?;
    let workspace = ctx.factory.workspace().await?;
    match action {
        ProjectAction::List {
            name,
            clients,
            archived,
            hydrated,
        } => {
            let clients = ctx.client_ids(&clients).await?;
            let projects = api
                .get_projects(GetProjects {
                    workspace,
                    name,
                    clients,
                    archived: Some(archived),
                    hydrate: hydrated,
                    pagination: PaginationParam::all(),
                })
                .await
                .context("list projects")?;
            ctx.emit(&projects)
        }
        ProjectAction::Add {
            name,
            client,
            color,
            billable,
            public,
            note,
        } => {
            let client_id = match client.as_deref() {
                Some(c) => Some(ctx.client_id(c).await?),
                None => None,
            };
            let project = api
                .add_project(AddProject {
                    workspace,
                    name,
                    client_id,
                    color,
                    billable,
                    public,
                    note,
                })
                .await
                .context("add project")?;
            ctx.emit_one(&project)
        }
        ProjectAction::Get { project, hydrated } => {
            let project_id = ctx.project_id(&project).await?;
            let project = api
                .get_project(GetProject {
                    workspace,
                    project_id,
                    hydrate: hydrated,
                })
                .await
                .context("get project")?;
            ctx.emit_one(&project)
        }
        ProjectAction::Edit {
            project,
            name,
            client,
            color,
            note,
            billable,
            not_billable,
            public,
            private,
            archived,
            active,
        } => {
            let project_id = ctx.project_id(&project).await?;
            let client_id = match client.as_deref() {
                Some(c) => Some(ctx.client_id(c).await?),
                None => None,
            };
            let project = api
                .update_project(UpdateProject {
                    workspace,
                    project_id,
                    name,
                    client_id,
                    color,
                    billable: toggle(billable, not_billable),
                    public: toggle(public, private),
                    archived: toggle(archived, active),
                    note,
                })
                .await
                .context("edit project")?;
            ctx.emit_one(&project)
        }
    }
}
