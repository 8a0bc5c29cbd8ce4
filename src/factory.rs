//! factory
//!
//! Builds the pieces a command needs from one resolved [`Config`].
//!
//! # Design
//!
//! Commands ask the factory for the API client, the workspace and user,
//! a [`Resolver`], the prompt [`Ui`] and a composition [`Pipeline`]
//! instead of constructing them. Everything is built on first use and
//! kept for the rest of the run:
//!
//! - the client is only built once a command talks to the service, so
//!   `config` and `completion` work without a token
//! - the current user is fetched at most once
//! - the folder defaults file is read at most once
//!
//! Configuration changes go through [`Factory::set_config`], which drops
//! everything built from the old values.
//!
//! # Example
//!
//! ```ignore
//! use clockify_cli::core::{cancel::CancelToken, config::Config};
//! use clockify_cli::factory::Factory;
//!
//! let factory = Factory::new(Config::load(None)?, CancelToken::new());
//! let workspace = factory.workspace().await?;
//! let resolver = factory.resolver().await?;
//! let project = resolver.project("cli").await?;
//! ```

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::api::{Api, ApiError, GetWorkspace, HttpClient, Transport};
use crate::core::cancel::CancelToken;
use crate::core::config::{Config, ConfigError};
use crate::core::defaults::{DefaultsError, DefaultsStore, FoundDefaults, ScanParam};
use crate::core::types::{EntityId, User, ValidationError, WorkspaceSettings};
use crate::engine::{
    ApplyDefaults, ApplyFlags, EntryFlags, Pipeline, PromptFields, PromptOptions, ResolveNames,
    TimeEntryDraft, ValidateDraft,
};
use crate::search::{ResolveError, Resolver, ResolverOptions};
use crate::ui::{NoUi, RenderOptions, TerminalUi, Ui};

/// Errors from assembling command dependencies.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("no API token configured (run `clockify-cli config init` or set CLOCKIFY_TOKEN)")]
    MissingToken,

    #[error("no workspace configured and the current user has no default workspace")]
    MissingWorkspace,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Defaults(#[from] DefaultsError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl FactoryError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            FactoryError::Api(e) | FactoryError::Resolve(ResolveError::Api(e)) => e.is_cancelled(),
            _ => false,
        }
    }
}

/// How a composition run treats the entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryMode {
    /// Fill empty fields from the folder defaults.
    pub apply_defaults: bool,
    /// Stop the running entry before submitting.
    pub auto_close: bool,
    /// The entry must have an end.
    pub require_end: bool,
}

/// Dependency container for one command run.
pub struct Factory {
    config: Config,
    cancel: CancelToken,
    cwd: PathBuf,
    now: DateTime<Utc>,
    api: OnceLock<Arc<dyn Api>>,
    api_injected: bool,
    ui: OnceLock<Arc<dyn Ui>>,
    me: OnceCell<User>,
    workspace: OnceCell<String>,
    user_id: OnceCell<String>,
    defaults: OnceLock<Option<FoundDefaults>>,
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("cwd", &self.cwd)
            .field("has_api", &self.api.get().is_some())
            .field("workspace", &self.workspace.get())
            .finish()
    }
}

impl Factory {
    pub fn new(config: Config, cancel: CancelToken) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            config,
            cancel,
            cwd,
            now: Utc::now(),
            api: OnceLock::new(),
            api_injected: false,
            ui: OnceLock::new(),
            me: OnceCell::new(),
            workspace: OnceCell::new(),
            user_id: OnceCell::new(),
            defaults: OnceLock::new(),
        }
    }

    /// Use `api` instead of building an HTTP client.
    pub fn with_api(mut self, api: Arc<dyn Api>) -> Self {
        self.api = OnceLock::new();
        let _ = self.api.set(api);
        self.api_injected = true;
        self
    }

    /// Use `ui` for prompts instead of the terminal.
    pub fn with_ui(self, ui: Arc<dyn Ui>) -> Self {
        let _ = self.ui.set(ui);
        self
    }

    /// Look for folder defaults from `dir` instead of the working directory.
    pub fn with_cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = dir.into();
        self
    }

    /// Fix the instant used as "now" for the run.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Set a configuration key for this run and for [`save_config`](Self::save_config).
    ///
    /// Anything built from the previous configuration is dropped, except an
    /// API client or UI injected with `with_api`/`with_ui`.
    pub fn set_config(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.config.set(key, value)?;
        if matches!(key, "token" | "api-url") && !self.api_injected {
            self.api = OnceLock::new();
        }
        self.me = OnceCell::new();
        self.workspace = OnceCell::new();
        self.user_id = OnceCell::new();
        Ok(())
    }

    /// Persist the configuration file.
    pub fn save_config(&self) -> Result<PathBuf, ConfigError> {
        self.config.save()
    }

    // ---------------------------------------------------------------------
    // Service
    // ---------------------------------------------------------------------

    /// The shared API client.
    pub fn api(&self) -> Result<Arc<dyn Api>, FactoryError> {
        if let Some(api) = self.api.get() {
            return Ok(Arc::clone(api));
        }
        let token = self
            .config
            .token()
            .filter(|t| !t.trim().is_empty())
            .ok_or(FactoryError::MissingToken)?;
        let transport = Transport::new(self.config.api_url(), token, self.cancel.clone())?;
        let built: Arc<dyn Api> = Arc::new(HttpClient::new(transport));
        Ok(Arc::clone(self.api.get_or_init(|| built)))
    }

    /// The user who owns the API key.
    pub async fn me(&self) -> Result<&User, FactoryError> {
        let api = self.api()?;
        let me = self
            .me
            .get_or_try_init(|| async move { api.get_me().await })
            .await?;
        Ok(me)
    }

    /// The workspace commands operate on.
    ///
    /// Configured value first (resolved by name when names are allowed),
    /// then the current user's default workspace.
    pub async fn workspace(&self) -> Result<String, FactoryError> {
        let workspace = self
            .workspace
            .get_or_try_init(|| async {
                match self.config.workspace().map(str::trim).filter(|w| !w.is_empty()) {
                    Some(w) if EntityId::is_valid(w) || !self.config.allow_name_for_id() => {
                        Ok::<_, FactoryError>(w.to_string())
                    }
                    Some(name) => {
                        let api = self.api()?;
                        Ok(Resolver::workspace(api.as_ref(), name).await?)
                    }
                    None => {
                        let me = self.me().await?;
                        [&me.default_workspace, &me.active_workspace]
                            .into_iter()
                            .find(|w| !w.is_empty())
                            .cloned()
                            .ok_or(FactoryError::MissingWorkspace)
                    }
                }
            })
            .await?;
        Ok(workspace.clone())
    }

    /// The user whose entries are managed: configured, or the key's owner.
    pub async fn user_id(&self) -> Result<String, FactoryError> {
        let user_id = self
            .user_id
            .get_or_try_init(|| async {
                match self.config.user_id().map(str::trim).filter(|u| !u.is_empty()) {
                    Some(u) if EntityId::is_valid(u) || !self.config.allow_name_for_id() => {
                        Ok::<_, FactoryError>(u.to_string())
                    }
                    Some(name) => Ok(self.resolver().await?.user(name).await?),
                    None => Ok(self.me().await?.id.clone()),
                }
            })
            .await?;
        Ok(user_id.clone())
    }

    pub async fn workspace_settings(&self) -> Result<WorkspaceSettings, FactoryError> {
        let workspace = self.workspace().await?;
        let ws = self.api()?.get_workspace(GetWorkspace { workspace }).await?;
        Ok(ws.settings)
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            search_project_with_client: self.config.search_project_with_client(),
            allow_archived_tags: self.config.allow_archived_tags(),
        }
    }

    pub async fn resolver(&self) -> Result<Resolver, FactoryError> {
        Ok(Resolver::new(
            self.api()?,
            self.workspace().await?,
            self.resolver_options(),
            self.cancel.clone(),
        ))
    }

    // ---------------------------------------------------------------------
    // Local state
    // ---------------------------------------------------------------------

    pub fn defaults_store(&self) -> DefaultsStore {
        DefaultsStore::new(ScanParam::new(&self.cwd))
    }

    /// The nearest defaults file, `None` when there is none up to the root.
    pub fn defaults(&self) -> Result<Option<FoundDefaults>, FactoryError> {
        if let Some(found) = self.defaults.get() {
            return Ok(found.clone());
        }
        let found = match self.defaults_store().read() {
            Ok(found) => Some(found),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };
        Ok(self.defaults.get_or_init(|| found).clone())
    }

    // ---------------------------------------------------------------------
    // Interaction and output
    // ---------------------------------------------------------------------

    /// Prompts are shown when configured and stdin is a terminal, or when
    /// a UI was injected.
    pub fn interactive(&self) -> bool {
        if !self.config.interactive() {
            return false;
        }
        self.ui.get().is_some() || std::io::stdin().is_terminal()
    }

    pub fn ui(&self) -> Arc<dyn Ui> {
        let ui = self.ui.get_or_init(|| {
            if self.interactive() {
                let page_size = self.config.interactive_page_size() as usize;
                Arc::new(TerminalUi::new(page_size))
            } else {
                Arc::new(NoUi)
            }
        });
        Arc::clone(ui)
    }

    /// A UI for `config init`, which prompts whenever it can regardless of
    /// the `interactive` setting. `None` without an injected UI or a
    /// terminal.
    pub fn setup_ui(&self) -> Option<Arc<dyn Ui>> {
        if let Some(ui) = self.ui.get() {
            return Some(Arc::clone(ui));
        }
        std::io::stdin().is_terminal().then(|| {
            let page_size = self.config.interactive_page_size() as usize;
            Arc::new(TerminalUi::new(page_size)) as Arc<dyn Ui>
        })
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            show_task: self.config.show_task(),
            show_total_duration: self.config.show_total_duration(),
            zone: self.config.time_zone(),
            now: self.now,
            lang: self.config.lang().to_string(),
        }
    }

    // ---------------------------------------------------------------------
    // Composition
    // ---------------------------------------------------------------------

    /// An empty draft in the current workspace for the current user.
    pub async fn new_draft(&self) -> Result<TimeEntryDraft, FactoryError> {
        Ok(TimeEntryDraft::new(
            self.workspace().await?,
            self.user_id().await?,
        ))
    }

    /// Assemble the transformer steps for one entry.
    ///
    /// The order is fixed: defaults, flags, resolve (when names are
    /// allowed), prompt (when interactive), validate.
    pub async fn pipeline(
        &self,
        flags: EntryFlags,
        mode: EntryMode,
    ) -> Result<Pipeline, FactoryError> {
        let api = self.api()?;
        let interactive = self.interactive();
        let settings = self.workspace_settings().await?;

        let defaults = if mode.apply_defaults {
            self.defaults()?.map(|found| found.defaults)
        } else {
            None
        };

        let mut pipeline = Pipeline::new(Arc::clone(&api), self.cancel.clone())
            .step(ApplyDefaults::new(defaults))
            .step(ApplyFlags::new(flags));

        if self.config.allow_name_for_id() {
            pipeline = pipeline.step(ResolveNames::new(self.resolver().await?, interactive));
        }
        if interactive {
            pipeline = pipeline.step(PromptFields::new(
                self.ui(),
                Arc::clone(&api),
                self.resolver().await?,
                PromptOptions {
                    zone: self.config.time_zone(),
                    now: self.now,
                    autocomplete_days: self.config.description_autocomplete_days(),
                    require_end: mode.require_end,
                    confirm: true,
                },
            ));
        }
        let pipeline = pipeline
            .step(
                ValidateDraft::new(settings)
                    .validate_required(!self.config.allow_incomplete())
                    .require_end(mode.require_end),
            )
            .auto_close(mode.auto_close);

        debug!(steps = ?pipeline.step_names(), "pipeline assembled");
        Ok(pipeline)
    }
}
