//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Turns command arguments into typed parameters (ids, instants)
//! 2. Asks the [`Factory`] for the client, resolver or pipeline it needs
//! 3. Renders the result through the selected output format
//!
//! Handlers are async because nearly every command talks to the service.
//! Errors are `anyhow` errors with the failing operation attached as
//! context.

mod client;
mod completion;
mod config_cmd;
mod defaults_cmd;
mod entry;
mod log_cmd;
mod project;
mod report;
mod tag;
mod task;
mod time_entry;
mod user;
mod workspace;

pub use completion::completion;

use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, Utc};

use crate::api::{GetTimeEntry, GetUserTimeEntries, LogInProgress, PaginationParam};
use crate::core::timefmt::parse_instant;
use crate::core::types::{EntityId, TimeEntry};
use crate::factory::Factory;
use crate::ui::output::{self, Verbosity};
use crate::ui::{render, render_one, OutputFormat, Record};

use super::args::Command;

/// Everything a handler needs for one run.
#[derive(Debug)]
pub struct Context {
    pub factory: Factory,
    pub format: OutputFormat,
    pub verbosity: Verbosity,
}

impl Context {
    pub fn new(factory: Factory, format: OutputFormat, verbosity: Verbosity) -> Self {
        Self {
            factory,
            format,
            verbosity,
        }
    }

    /// Print a list in the selected format.
    pub fn emit<T: Record>(&self, items: &[T]) -> Result<()> {
        let out = render(items, &self.format, &self.factory.render_options())?;
        output::print(out);
        Ok(())
    }

    /// Print one record in the selected format.
    pub fn emit_one<T: Record>(&self, item: &T) -> Result<()> {
        let out = render_one(item, &self.format, &self.factory.render_options())?;
        output::print(out);
        Ok(())
    }

    pub fn note(&self, message: impl std::fmt::Display) {
        output::success(message, self.verbosity);
    }

    pub fn warn(&self, message: impl std::fmt::Display) {
        output::warn(message, self.verbosity);
    }

    /// Parse a time expression in the configured zone.
    pub fn instant(&self, flag: &str, text: &str) -> Result<DateTime<Utc>> {
        parse_instant(text, self.factory.now(), &self.factory.config().time_zone())
            .with_context(|| format!("invalid {flag}"))
    }

    /// Whether `reference` must be looked up by name first.
    fn by_name(&self, reference: &str) -> bool {
        self.factory.config().allow_name_for_id() && !EntityId::is_valid(reference.trim())
    }

    pub async fn project_id(&self, reference: &str) -> Result<String> {
        if !self.by_name(reference) {
            return Ok(reference.trim().to_string());
        }
        Ok(self.factory.resolver().await?.project(reference).await?)
    }

    pub async fn client_id(&self, reference: &str) -> Result<String> {
        if !self.by_name(reference) {
            return Ok(reference.trim().to_string());
        }
        Ok(self.factory.resolver().await?.client(reference).await?)
    }

    pub async fn client_ids(&self, references: &[String]) -> Result<Vec<String>> {
        if !references.iter().any(|r| self.by_name(r)) {
            return Ok(references.iter().map(|r| r.trim().to_string()).collect());
        }
        Ok(self.factory.resolver().await?.clients(references).await?)
    }

    pub async fn task_id(&self, reference: &str, project_id: &str) -> Result<String> {
        if !self.by_name(reference) {
            return Ok(reference.trim().to_string());
        }
        Ok(self
            .factory
            .resolver()
            .await?
            .task(reference, project_id)
            .await?)
    }

    pub async fn tag_id(&self, reference: &str) -> Result<String> {
        if !self.by_name(reference) {
            return Ok(reference.trim().to_string());
        }
        Ok(self.factory.resolver().await?.tag(reference).await?)
    }

    pub async fn tag_ids(&self, references: &[String]) -> Result<Vec<String>> {
        if !references.iter().any(|r| self.by_name(r)) {
            return Ok(references.iter().map(|r| r.trim().to_string()).collect());
        }
        Ok(self.factory.resolver().await?.tags(references).await?)
    }

    pub async fn user_ids(&self, references: &[String]) -> Result<Vec<String>> {
        if !references.iter().any(|r| self.by_name(r)) {
            return Ok(references.iter().map(|r| r.trim().to_string()).collect());
        }
        Ok(self.factory.resolver().await?.users(references).await?)
    }

    /// Look up a time entry by id, `current` (the running one) or `last`
    /// (the most recent one).
    pub async fn time_entry(&self, reference: &str) -> Result<TimeEntry> {
        let api = self.factory.api()?;
        let workspace = self.factory.workspace().await?;
        match reference.trim().to_ascii_lowercase().as_str() {
            "current" => {
                let user_id = self.factory.user_id().await?;
                match api.log_in_progress(LogInProgress { workspace, user_id }).await? {
                    Some(entry) => Ok(entry),
                    None => bail!("there is no time entry in progress"),
                }
            }
            "last" => {
                let user_id = self.factory.user_id().await?;
                let latest = api
                    .get_user_time_entries(GetUserTimeEntries {
                        workspace,
                        user_id,
                        pagination: PaginationParam::page(1, 1),
                        ..Default::default()
                    })
                    .await?;
                match latest.into_iter().next() {
                    Some(entry) => Ok(entry),
                    None => bail!("there are no time entries yet"),
                }
            }
            _ => Ok(api
                .get_time_entry(GetTimeEntry {
                    workspace,
                    id: reference.trim().to_string(),
                })
                .await?),
        }
    }
}

/// A pair of opposing switches (`--archived`/`--active`) as a change.
pub(crate) fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Dispatch a command to its handler.
pub async fn dispatch(command: Command, ctx: &mut Context) -> Result<()> {
    match command {
        // Time entries
        Command::In(args) => entry::start(ctx, args).await,
        Command::Manual(args) => entry::manual(ctx, args).await,
        Command::Edit { id, entry } => entry::edit(ctx, &id, entry).await,
        Command::CloneEntry { id, entry } => entry::clone_entry(ctx, &id, entry).await,
        Command::Out { when } => time_entry::out(ctx, when.as_deref()).await,
        Command::Show { id } => time_entry::show(ctx, &id).await,
        Command::Delete { ids } => time_entry::delete(ctx, &ids).await,
        Command::MarkInvoiced { ids } => time_entry::mark_invoiced(ctx, &ids, true).await,
        Command::MarkNotInvoiced { ids } => time_entry::mark_invoiced(ctx, &ids, false).await,
        Command::Log(args) => log_cmd::log(ctx, args).await,
        Command::Report(args) => report::report(ctx, args).await,

        // Workspace entities
        Command::Project(action) => project::project(ctx, action).await,
        Command::Task(action) => task::task(ctx, action).await,
        Command::Tag(action) => tag::tag(ctx, action).await,
        Command::Client(action) => client::client(ctx, action).await,
        Command::User(action) => user::user(ctx, action).await,
        Command::Workspace(action) => workspace::workspace(ctx, action).await,

        // Local state
        Command::Config(action) => config_cmd::config(ctx, action).await,
        Command::Defaults(action) => defaults_cmd::defaults(ctx, action).await,
        Command::Completion { shell } => completion(shell),
    }
}
