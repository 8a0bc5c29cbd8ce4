//! user list|me

use anyhow::{Context as _, Result};

use super::Context;
use crate::api::{PaginationParam, WorkspaceUsers};
use crate::cli::args::UserAction;

pub async fn user(ctx: &Context, action: UserAction) -> Result<()> {
    match action {
        UserAction::List { email } => {
            let users = ctx
                .factory
                .api()?
                .workspace_users(WorkspaceUsers {
                    workspace: ctx.factory.workspace().await?,
                    email,
                    pagination: PaginationParam::all(),
                })
                .await
                .context("list users")?;
            ctx.emit(&users)
        }
        UserAction::Me => {
            let me = ctx.factory.me().await?;
            ctx.emit_one(me)
        }
    }
}
