//! config command - Init, get, set, or list configuration values

use anyhow::{bail, Context as _, Result};
use serde_json::{Map, Value};

use super::Context;
use crate::api::GetWorkspaces;
use crate::cli::args::ConfigAction;
use crate::factory::FactoryError;
use crate::ui::output;
use crate::ui::OutputFormat;

/// Keys whose values are never printed in full.
const SECRET_KEYS: [&str; 1] = ["token"];

fn mask(key: &str, value: String) -> String {
    if !SECRET_KEYS.contains(&key) {
        return value;
    }
    let visible: String = value.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("****{visible}")
}

pub async fn config(ctx: &mut Context, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => init(ctx).await,
        ConfigAction::Get { key } => get(ctx, &key),
        ConfigAction::Set { key, value } => set(ctx, &key, &value),
        ConfigAction::List => list(ctx),
    }
}

/// Get a configuration value. An unset key prints nothing.
fn get(ctx: &Context, key: &str) -> Result<()> {
    if let Some(value) = ctx.factory.config().get(key)? {
        output::print(value);
    }
    Ok(())
}

/// Set a configuration value and save the file.
fn set(ctx: &mut Context, key: &str, value: &str) -> Result<()> {
    ctx.factory.set_config(key, value)?;
    ctx.factory.save_config().context("save configuration")?;
    ctx.note(format!("Set {} = {}", key, mask(key, value.to_string())));
    Ok(())
}

/// List all configuration values.
fn list(ctx: &Context) -> Result<()> {
    let entries = ctx.factory.config().entries()?;
    if ctx.format == OutputFormat::Json {
        let object: Map<String, Value> = entries
            .into_iter()
            .map(|(key, value)| {
                let value = value.map_or(Value::Null, |v| Value::String(mask(key, v)));
                (key.to_string(), value)
            })
            .collect();
        output::print(serde_json::to_string_pretty(&object)?);
        return Ok(());
    }
    let lines: Vec<String> = entries
        .into_iter()
        .map(|(key, value)| match value {
            Some(v) => format!("{key} = {}", mask(key, v)),
            None => format!("{key} = (not set)"),
        })
        .collect();
    output::print(lines.join("\n"));
    Ok(())
}

/// Ask for the API key, workspace and user, then save.
///
/// Without a terminal the key must come from `--token` or the
/// environment, and the workspace and user are taken from the key's owner.
async fn init(ctx: &mut Context) -> Result<()> {
    let ui = ctx.factory.setup_ui();

    let token = match (ctx.factory.config().token(), &ui) {
        (Some(token), _) => token.to_string(),
        (None, Some(ui)) => ui.ask_secret("API key")?,
        (None, None) => return Err(FactoryError::MissingToken.into()),
    };
    if token.trim().is_empty() {
        bail!("the API key must not be empty");
    }
    ctx.factory.set_config("token", token.trim())?;

    let me = ctx.factory.me().await.context("check API key")?.clone();
    let workspace = match &ui {
        Some(ui) => {
            let workspaces = ctx
                .factory
                .api()?
                .get_workspaces(GetWorkspaces::default())
                .await
                .context("list workspaces")?;
            let options: Vec<String> = workspaces
                .iter()
                .map(|w| format!("{} - {}", w.id, w.name))
                .collect();
            let current = ctx
                .factory
                .config()
                .workspace()
                .unwrap_or(&me.default_workspace)
                .to_string();
            let default = options.iter().find(|o| o.starts_with(&current)).cloned();
            if options.is_empty() {
                me.default_workspace.clone()
            } else {
                let chosen = ui.ask_from_options("Workspace", &options, default.as_deref(), None)?;
                chosen
                    .split_once(" - ")
                    .map_or(chosen.clone(), |(id, _)| id.to_string())
            }
        }
        None => me.default_workspace.clone(),
    };
    if workspace.is_empty() {
        bail!("the user owning this API key has no workspace");
    }
    ctx.factory.set_config("workspace", &workspace)?;
    ctx.factory.set_config("user-id", &me.id)?;

    if let Some(ui) = &ui {
        let names = ui.confirm(
            "Allow names instead of ids for projects, tasks and tags?",
            ctx.factory.config().allow_name_for_id(),
        )?;
        ctx.factory.set_config("allow-name-for-id", &names.to_string())?;
        let interactive = ui.confirm(
            "Prompt for fields missing from the command line?",
            ctx.factory.config().interactive(),
        )?;
        ctx.factory.set_config("interactive", &interactive.to_string())?;
    }

    let path = ctx.factory.save_config().context("save configuration")?;
    ctx.note(format!("configuration saved to {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_masked() {
        assert_eq!(mask("token", "abcdef123456".into()), "****3456");
        assert_eq!(mask("workspace", "w1".into()), "w1");
    }

    #[test]
    fn short_token_keeps_its_tail() {
        assert_eq!(mask("token", "ab".into()), "****ab");
    }
}
