//! client list|add|get|edit

use anyhow::{Context as _, Result};

use super::{toggle, Context};
use crate::api::{AddClient, GetClient, GetClients, PaginationParam, UpdateClient};
use crate::cli::args::ClientAction;

pub async fn client(ctx: &Context, action: ClientAction) -> Result<()> {
    let api = ctx.factory.api()?;
    let workspace = ctx.factory.workspace().await?;
    match action {
        ClientAction::List { name, archived } => {
            let clients = api
                .get_clients(GetClients {
                    workspace,
                    name,
                    archived: Some(archived),
                    pagination: PaginationParam::all(),
                })
                .await
                .context("list clients")?;
            ctx.emit(&clients)
        }
        ClientAction::Add { name } => {
            let client = api
                .add_client(AddClient { workspace, name })
                .await
                .context("add client")?;
            ctx.emit_one(&client)
        }
        ClientAction::Get { client } => {
            let client_id = ctx.client_id(&client).await?;
            let client = api
                .get_client(GetClient {
                    workspace,
                    client_id,
                })
                .await
                .context("get client")?;
            ctx.emit_one(&client)
        }
        ClientAction::Edit {
            client,
            name,
            archived,
            active,
        } => {
            let client_id = ctx.client_id(&client).await?;
            let client = api
                .update_client(UpdateClient {
                    workspace,
                    client_id,
                    name,
                    archived: toggle(archived, active),
                })
                .await
                .context("edit client")?;
            ctx.emit_one(&client)
        }
    }
}
