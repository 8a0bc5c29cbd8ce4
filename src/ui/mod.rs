//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - The [`Ui`] trait and prompt errors
//! - [`terminal`] - [`TerminalUi`], prompts drawn with crossterm
//! - [`scripted`] - [`ScriptedUi`], canned answers for tests
//! - [`format`] - Table, JSON, CSV, id and template output
//! - [`output`] - Messages and verbosity
//!
//! # Design
//!
//! All output and prompts go through this module so interactive and
//! non-interactive runs behave the same way apart from the prompts.

pub mod format;
pub mod output;
pub mod prompts;
pub mod scripted;
pub mod terminal;

pub use format::{render, render_one, OutputFormat, Record, RenderOptions};
pub use output::Verbosity;
pub use prompts::{NoUi, PromptError, Ui};
pub use scripted::{Answer, ScriptedUi};
pub use terminal::TerminalUi;
