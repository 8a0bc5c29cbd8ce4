//! tag list|add|edit

use anyhow::{Context as _, Result};

use super::{toggle, Context};
use crate::api::{AddTag, GetTags, PaginationParam, UpdateTag};
use crate::cli::args::TagAction;

pub async fn tag(ctx: &Context, action: TagAction) -> Result<()> {
    let api = ctx.factory.api()?;
    let workspace = ctx.factory.workspace().await?;
    match action {
        TagAction::List { name, archived } => {
            let tags = api
                .get_tags(GetTags {
                    workspace,
                    name,
                    archived: Some(archived),
                    pagination: PaginationParam::all(),
                })
                .await
                .context("list tags")?;
            ctx.emit(&tags)
        }
        TagAction::Add { name } => {
            let tag = api
                .add_tag(AddTag { workspace, name })
                .await
                .context("add tag")?;
            ctx.emit_one(&tag)
        }
        TagAction::Edit {
            tag,
            name,
            archived,
            active,
        } => {
            let tag_id = ctx.tag_id(&tag).await?;
            let tag = api
                .update_tag(UpdateTag {
                    workspace,
                    tag_id,
                    name,
                    archived: toggle(archived, active),
                })
                .await
                .context("edit tag")?;
            ctx.emit_one(&tag)
        }
    }
}
