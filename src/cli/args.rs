//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands and override the config
//! file and `CLOCKIFY_*` environment variables:
//! - `--token <key>`: API key
//! - `--workspace <id>` / `--user-id <id>`
//! - `--interactive` / `-i`: prompt for missing values
//! - `--allow-name-for-id`: accept names where ids are expected
//! - `--log-level <level>`: none, error, info, debug
//! - `--config <path>`: config file to use
//!
//! Output flags (`--json`, `--csv`, `--quiet`, `--format`) are mutually
//! exclusive.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::config::{ConfigLayer, LogLevel};
use crate::ui::OutputFormat;

/// Track time against a Clockify workspace
#[derive(Parser, Debug)]
#[command(name = "clockify-cli")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API key used to authenticate
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Workspace to operate on
    #[arg(short = 'w', long, global = true)]
    pub workspace: Option<String>,

    /// User whose time entries are managed
    #[arg(short = 'u', long, global = true)]
    pub user_id: Option<String>,

    /// Prompt for missing values
    #[arg(short, long, global = true)]
    pub interactive: bool,

    /// Accept names where ids are expected
    #[arg(long, global = true)]
    pub allow_name_for_id: bool,

    /// Diagnostic logging: none, error, info or debug
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Config file to read and write
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// The flag layer of the configuration.
    pub fn config_layer(&self) -> ConfigLayer {
        ConfigLayer {
            token: self.token.clone(),
            workspace: self.workspace.clone(),
            user_id: self.user_id.clone(),
            interactive: self.interactive.then_some(true),
            allow_name_for_id: self.allow_name_for_id.then_some(true),
            log_level: self.log_level,
            ..Default::default()
        }
    }
}

/// Output selection shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Print JSON
    #[arg(long, global = true, conflicts_with_all = ["csv", "quiet", "format"])]
    pub json: bool,

    /// Print CSV
    #[arg(long, global = true, conflicts_with_all = ["quiet", "format"])]
    pub csv: bool,

    /// Print only ids
    #[arg(short, long, global = true, conflicts_with = "format")]
    pub quiet: bool,

    /// Print each record through a template, e.g. '{id} {description}'
    #[arg(short, long, global = true, value_name = "TEMPLATE")]
    pub format: Option<String>,
}

impl OutputArgs {
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.csv {
            OutputFormat::Csv
        } else if self.quiet {
            OutputFormat::Quiet
        } else if let Some(template) = &self.format {
            OutputFormat::Template(template.clone())
        } else {
            OutputFormat::Table
        }
    }
}

/// Fields of a time entry given on the command line.
#[derive(Args, Debug, Clone, Default)]
pub struct EntryArgs {
    /// Project id (or name with --allow-name-for-id)
    #[arg(short, long)]
    pub project: Option<String>,

    /// Task id (or name with --allow-name-for-id)
    #[arg(long)]
    pub task: Option<String>,

    /// Description of the work
    #[arg(short, long)]
    pub description: Option<String>,

    /// Tag id or name; repeat for several tags
    #[arg(short = 'T', long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Start: now, 09:30, yesterday 17:00, 2024-03-01 09:00, -15m
    #[arg(short = 's', long, value_name = "WHEN")]
    pub when: Option<String>,

    /// End, in the same forms as --when
    #[arg(short = 'e', long, value_name = "WHEN")]
    pub when_to_close: Option<String>,

    /// Mark the entry billable
    #[arg(long, conflicts_with = "not_billable")]
    pub billable: bool,

    /// Mark the entry not billable
    #[arg(long)]
    pub not_billable: bool,
}

impl EntryArgs {
    pub fn billable(&self) -> Option<bool> {
        super::commands::toggle(self.billable, self.not_billable)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    // ========== Time entries ==========
    /// Start a time entry, stopping the running one
    #[command(
        name = "in",
        long_about = "Start a new time entry.\n\n\
            Empty fields are filled from the nearest .clockify-defaults.yaml, \
            flags override them, and with --interactive every field is asked. \
            A running entry is stopped at the new entry's start.",
        after_help = "\
EXAMPLES:
    clockify-cli in -p 5f1d0ab2c3e4f5a6b7c8d9e0 -d 'Code review'
    clockify-cli in --allow-name-for-id -p cli -T meeting -s 09:30"
    )]
    In(EntryArgs),

    /// Add a finished time entry
    #[command(name = "manual")]
    Manual(EntryArgs),

    /// Stop the running time entry
    #[command(name = "out")]
    Out {
        /// When the entry stops (default: now)
        #[arg(short = 'e', long = "when", value_name = "WHEN")]
        when: Option<String>,
    },

    /// Edit a time entry (id, current or last)
    #[command(name = "edit")]
    Edit {
        /// Entry id, `current` or `last`
        id: String,
        #[command(flatten)]
        entry: EntryArgs,
    },

    /// Start a new entry copying another (id or last)
    #[command(name = "clone")]
    CloneEntry {
        /// Entry id, `current` or `last`
        id: String,
        #[command(flatten)]
        entry: EntryArgs,
    },

    /// Show a time entry (id, current or last)
    #[command(name = "show")]
    Show {
        /// Entry id, `current` or `last`
        #[arg(default_value = "current")]
        id: String,
    },

    /// Delete time entries
    #[command(name = "delete")]
    Delete {
        /// Entry ids, `current` or `last`
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Mark time entries as invoiced
    #[command(name = "mark-invoiced")]
    MarkInvoiced {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Mark time entries as not invoiced
    #[command(name = "mark-not-invoiced")]
    MarkNotInvoiced {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List the entries of one day
    #[command(name = "log", args_conflicts_with_subcommands = true)]
    Log(LogArgs),

    /// List entries over a range of days
    #[command(
        name = "report",
        after_help = "\
RANGES:
    today, yesterday, this-week, last-week, this-month, last-month,
    last-week-day, or a start date and optional end date

EXAMPLES:
    clockify-cli report this-week
    clockify-cli report 2024-03-01 2024-03-15 --fill-missing-dates"
    )]
    Report(ReportArgs),

    // ========== Workspace entities ==========
    /// Manage projects
    #[command(name = "project", subcommand)]
    Project(ProjectAction),

    /// Manage tasks of a project
    #[command(name = "task", subcommand)]
    Task(TaskAction),

    /// Manage tags
    #[command(name = "tag", subcommand)]
    Tag(TagAction),

    /// Manage clients
    #[command(name = "client", subcommand)]
    Client(ClientAction),

    /// List users of the workspace
    #[command(name = "user", subcommand)]
    User(UserAction),

    /// List workspaces
    #[command(name = "workspace", subcommand)]
    Workspace(WorkspaceAction),

    // ========== Local state ==========
    /// Read and write the configuration file
    #[command(name = "config", subcommand)]
    Config(ConfigAction),

    /// Manage the folder defaults file
    #[command(name = "defaults", subcommand)]
    Defaults(DefaultsAction),

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    clockify-cli completion bash > ~/.local/share/bash-completion/completions/clockify-cli
    clockify-cli completion zsh > ~/.zfunc/_clockify-cli"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Day to list (default: today)
    #[arg(short, long)]
    pub date: Option<String>,

    #[command(subcommand)]
    pub action: Option<LogAction>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum LogAction {
    /// Show the running entry
    InProgress,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// A range name, or a start date and optional end date
    #[arg(required = true, num_args = 1..=2, value_name = "RANGE")]
    pub range: Vec<String>,

    /// Add an empty row for days without entries
    #[arg(long)]
    pub fill_missing_dates: bool,

    /// Only entries whose description contains this text
    #[arg(long)]
    pub description: Option<String>,

    /// Only entries of this project
    #[arg(short, long)]
    pub project: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProjectAction {
    /// List projects
    List {
        /// Only projects whose name contains this text
        #[arg(short, long)]
        name: Option<String>,
        /// Only projects of these clients
        #[arg(short, long = "client", value_name = "CLIENT")]
        clients: Vec<String>,
        /// List archived projects instead of active ones
        #[arg(long)]
        archived: bool,
        /// Include tasks and memberships
        #[arg(long)]
        hydrated: bool,
    },
    /// Create a project
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        client: Option<String>,
        /// #RGB or #RRGGBB
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        billable: bool,
        #[arg(long)]
        public: bool,
        #[arg(long)]
        note: Option<String>,
    },
    /// Show a project
    Get {
        project: String,
        /// Include tasks and memberships
        #[arg(long)]
        hydrated: bool,
    },
    /// Change a project
    Edit {
        project: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        client: Option<String>,
        /// #RGB or #RRGGBB
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long, conflicts_with = "not_billable")]
        billable: bool,
        #[arg(long)]
        not_billable: bool,
        #[arg(long, conflicts_with = "private")]
        public: bool,
        #[arg(long)]
        private: bool,
        #[arg(long, conflicts_with = "active")]
        archived: bool,
        #[arg(long)]
        active: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskAction {
    /// List tasks of a project
    List {
        #[arg(short, long)]
        project: String,
        #[arg(short, long)]
        name: Option<String>,
        /// Only tasks still active
        #[arg(long, conflicts_with = "done")]
        active: bool,
        /// Only tasks marked done
        #[arg(long)]
        done: bool,
    },
    /// Create a task
    Add {
        #[arg(short, long)]
        project: String,
        #[arg(short, long)]
        name: String,
        /// User id (or name); repeat for several
        #[arg(short = 'A', long = "assignee", value_name = "USER")]
        assignees: Vec<String>,
        /// Estimate such as 1h30m or PT1H30M
        #[arg(long)]
        estimate: Option<String>,
        #[arg(long)]
        billable: bool,
    },
    /// Change a task
    Edit {
        #[arg(short, long)]
        project: String,
        task: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short = 'A', long = "assignee", value_name = "USER")]
        assignees: Vec<String>,
        #[arg(long)]
        estimate: Option<String>,
        #[arg(long, conflicts_with = "not_billable")]
        billable: bool,
        #[arg(long)]
        not_billable: bool,
        #[arg(long, conflicts_with = "active")]
        done: bool,
        #[arg(long)]
        active: bool,
    },
    /// Delete a task
    Delete {
        #[arg(short, long)]
        project: String,
        task: String,
    },
    /// Mark a task as done
    Done {
        #[arg(short, long)]
        project: String,
        task: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum TagAction {
    /// List tags
    List {
        #[arg(short, long)]
        name: Option<String>,
        /// List archived tags instead of active ones
        #[arg(long)]
        archived: bool,
    },
    /// Create a tag
    Add {
        #[arg(short, long)]
        name: String,
    },
    /// Rename or archive a tag
    Edit {
        tag: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "active")]
        archived: bool,
        #[arg(long)]
        active: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ClientAction {
    /// List clients
    List {
        #[arg(short, long)]
        name: Option<String>,
        /// List archived clients instead of active ones
        #[arg(long)]
        archived: bool,
    },
    /// Create a client
    Add {
        #[arg(short, long)]
        name: String,
    },
    /// Show a client
    Get { client: String },
    /// Rename or archive a client
    Edit {
        client: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "active")]
        archived: bool,
        #[arg(long)]
        active: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum UserAction {
    /// List users of the workspace
    List {
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Show the user who owns the API key
    Me,
}

#[derive(Subcommand, Debug, Clone)]
pub enum WorkspaceAction {
    /// List workspaces visible to the API key
    List {
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Set up token, workspace and user
    Init,
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DefaultsAction {
    /// Write the defaults file in the current directory
    Set {
        #[arg(short, long)]
        project: Option<String>,
        #[arg(long)]
        task: Option<String>,
        #[arg(short = 'T', long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        #[arg(long, conflicts_with = "not_billable")]
        billable: bool,
        #[arg(long)]
        not_billable: bool,
    },
    /// Show the defaults that apply here
    Show,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn output_flags_conflict() {
        let err = Cli::try_parse_from(["clockify-cli", "tag", "list", "--json", "--csv"]);
        assert!(err.is_err());
    }

    #[test]
    fn global_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "clockify-cli",
            "log",
            "-i",
            "--allow-name-for-id",
            "--token",
            "abc",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let layer = cli.config_layer();
        assert_eq!(layer.token.as_deref(), Some("abc"));
        assert_eq!(layer.interactive, Some(true));
        assert_eq!(layer.allow_name_for_id, Some(true));
        assert_eq!(layer.log_level, Some(LogLevel::Debug));
        assert_eq!(layer.workspace, None);
    }

    #[test]
    fn entry_flags_parse() {
        let cli = Cli::try_parse_from([
            "clockify-cli",
            "in",
            "-p",
            "cli",
            "-T",
            "a",
            "-T",
            "b",
            "--not-billable",
        ])
        .unwrap();
        match cli.command {
            Command::In(entry) => {
                assert_eq!(entry.project.as_deref(), Some("cli"));
                assert_eq!(entry.tags, vec!["a", "b"]);
                assert_eq!(entry.billable(), Some(false));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn format_selection() {
        let cli = Cli::try_parse_from(["clockify-cli", "log", "--format", "{id}"]).unwrap();
        assert_eq!(cli.output.format(), OutputFormat::Template("{id}".into()));
        let cli = Cli::try_parse_from(["clockify-cli", "log"]).unwrap();
        assert_eq!(cli.output.format(), OutputFormat::Table);
    }
}
