//! workspace list

use anyhow::{Context as _, Result};

use super::Context;
use crate::api::GetWorkspaces;
use crate::cli::args::WorkspaceAction;

pub async fn workspace(ctx: &Context, action: WorkspaceAction) -> Result<()> {
    match action {
        WorkspaceAction::List { name } => {
            let workspaces = ctx
                .factory
                .api()?
                .get_workspaces(GetWorkspaces { name })
                .await
                .context("list workspaces")?;
            ctx.emit(&workspaces)
        }
    }
}
