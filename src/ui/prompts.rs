//! ui::prompts
//!
//! Interactive prompts and confirmations.
//!
//! # Design
//!
//! Prompts go through the [`Ui`] trait so the pipeline can be driven by
//! the terminal ([`TerminalUi`](super::terminal::TerminalUi)) or by a
//! script in tests ([`ScriptedUi`](super::scripted::ScriptedUi)).
//! Prompts are only shown in interactive mode. A terminal interrupt
//! (Ctrl-C, Esc) during any prompt surfaces as [`PromptError::Interrupted`].

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::search::{is_similar, normalize};

/// Errors from prompts.
#[derive(Debug, Clone, Error)]
pub enum PromptError {
    #[error("interrupted")]
    Interrupted,

    #[error("not in interactive mode")]
    NotInteractive,

    #[error("there are no options to choose from")]
    NoOptions,

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for PromptError {
    fn from(e: std::io::Error) -> Self {
        PromptError::IoError(e.to_string())
    }
}

/// Suggestions for a partially typed value.
pub type SuggestFn<'a> = &'a (dyn Fn(&str) -> Vec<String> + Sync);

/// Turns typed text into an instant. `Err` carries the message shown
/// before asking again; `Ok(None)` accepts an empty answer.
pub type ConvertFn<'a> = &'a (dyn Fn(&str) -> Result<Option<DateTime<Utc>>, String> + Sync);

/// Decides whether an option is shown for the typed filter.
pub type FilterFn<'a> = &'a (dyn Fn(&str, &str) -> bool + Sync);

/// Checks a multi-selection before it is accepted.
pub type ValidateFn<'a> = &'a (dyn Fn(&[String]) -> Result<(), String> + Sync);

/// The default select filter: every typed term occurs in the option, with
/// the same normalization the resolver uses.
pub fn default_filter(filter: &str, option: &str) -> bool {
    is_similar(&normalize(filter), &normalize(option))
}

/// Terminal widgets used by the composition pipeline and `config init`.
pub trait Ui: Send + Sync {
    /// Single-line input. Empty input returns `default` (or `""`).
    fn ask_text(
        &self,
        message: &str,
        default: Option<&str>,
        suggest: Option<SuggestFn<'_>>,
    ) -> Result<String, PromptError>;

    /// Input repeated until `convert` accepts it.
    fn ask_date_time(
        &self,
        message: &str,
        default: Option<&str>,
        convert: ConvertFn<'_>,
    ) -> Result<Option<DateTime<Utc>>, PromptError>;

    fn ask_int(&self, message: &str, default: i64) -> Result<i64, PromptError>;

    /// Single select. Returns the chosen option.
    fn ask_from_options(
        &self,
        message: &str,
        options: &[String],
        default: Option<&str>,
        filter: Option<FilterFn<'_>>,
    ) -> Result<String, PromptError>;

    /// Multi select. Returns the chosen options in option order.
    fn ask_many_from_options(
        &self,
        message: &str,
        options: &[String],
        defaults: &[String],
        validate: Option<ValidateFn<'_>>,
    ) -> Result<Vec<String>, PromptError>;

    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError>;

    /// Masked input (API keys).
    fn ask_secret(&self, message: &str) -> Result<String, PromptError>;
}

/// A [`Ui`] for non-interactive runs: every prompt fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUi;

impl Ui for NoUi {
    fn ask_text(
        &self,
        _message: &str,
        _default: Option<&str>,
        _suggest: Option<SuggestFn<'_>>,
    ) -> Result<String, PromptError> {
        Err(PromptError::NotInteractive)
    }

    fn ask_date_time(
        &self,
        _message: &str,
        _default: Option<&str>,
        _convert: ConvertFn<'_>,
    ) -> Result<Option<DateTime<Utc>>, PromptError> {
        Err(PromptError::NotInteractive)
    }

    fn ask_int(&self, _message: &str, _default: i64) -> Result<i64, PromptError> {
        Err(PromptError::NotInteractive)
    }

    fn ask_from_options(
        &self,
        _message: &str,
        _options: &[String],
        _default: Option<&str>,
        _filter: Option<FilterFn<'_>>,
    ) -> Result<String, PromptError> {
        Err(PromptError::NotInteractive)
    }

    fn ask_many_from_options(
        &self,
        _message: &str,
        _options: &[String],
        _defaults: &[String],
        _validate: Option<ValidateFn<'_>>,
    ) -> Result<Vec<String>, PromptError> {
        Err(PromptError::NotInteractive)
    }

    fn confirm(&self, _message: &str, _default: bool) -> Result<bool, PromptError> {
        Err(PromptError::NotInteractive)
    }

    fn ask_secret(&self, _message: &str) -> Result<String, PromptError> {
        Err(PromptError::NotInteractive)
    }
}
