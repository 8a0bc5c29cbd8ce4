//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Layer flags over the config file and environment
//! - Start logging and the async runtime, and cancel the run on Ctrl-C
//! - Delegate to command handlers and map the outcome to an exit code
//!
//! # Exit Codes
//!
//! - `0` success
//! - `1` any error
//! - `2` the user interrupted the run (Ctrl-C, Esc in a prompt, or a
//!   declined confirmation)

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use crate::api::ApiError;
use crate::core::cancel::CancelToken;
use crate::core::config::{Config, LogLevel};
use crate::engine::PipelineError;
use crate::factory::{Factory, FactoryError};
use crate::search::ResolveError;
use crate::ui::output::{self, Verbosity};
use crate::ui::PromptError;

const INTERRUPTED: u8 = 2;

/// Install the `tracing` subscriber on stderr.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies to
/// this crate only. Level `none` installs nothing.
fn init_tracing(level: LogLevel) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match level.directive() {
            Some(directive) => EnvFilter::new(format!("clockify_cli={directive}")),
            None => return,
        },
    };
    // A second initialization (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Whether `err` was caused by the user stopping the run.
pub fn is_interrupted(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<PipelineError>()
            .is_some_and(PipelineError::is_interrupted)
            || matches!(
                cause.downcast_ref::<PromptError>(),
                Some(PromptError::Interrupted)
            )
            || cause
                .downcast_ref::<ApiError>()
                .is_some_and(ApiError::is_cancelled)
            || cause
                .downcast_ref::<FactoryError>()
                .is_some_and(FactoryError::is_cancelled)
            || matches!(
                cause.downcast_ref::<ResolveError>(),
                Some(ResolveError::Api(e)) if e.is_cancelled()
            )
    })
}

fn report(err: &anyhow::Error, level: LogLevel) -> ExitCode {
    if is_interrupted(err) {
        output::error("interrupted");
        return ExitCode::from(INTERRUPTED);
    }
    if level == LogLevel::Debug {
        output::error(format!("{err:?}"));
    } else {
        output::error(format!("{err:#}"));
    }
    ExitCode::FAILURE
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> ExitCode {
    let cli = Cli::parse_args();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return report(&e.into(), LogLevel::None),
    };
    config.apply_overrides(cli.config_layer());
    let level = config.log_level();
    init_tracing(level);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => return report(&anyhow::anyhow!("failed to start the async runtime: {e}"), level),
    };

    let verbosity = Verbosity::from_flags(cli.output.quiet, level == LogLevel::Debug);
    let format = cli.output.format();
    let cancel = CancelToken::new();

    let result = runtime.block_on(async {
        let watcher = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received Ctrl-C, cancelling");
                watcher.cancel();
            }
        });

        let mut ctx = commands::Context::new(Factory::new(config, cancel.clone()), format, verbosity);
        commands::dispatch(cli.command, &mut ctx).await
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err, level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interruptions_are_recognised_through_context() {
        let err = anyhow::Error::new(PipelineError::Interrupted).context("start time entry");
        assert!(is_interrupted(&err));

        let err = anyhow::Error::new(ApiError::Cancelled.in_op("get tags"));
        assert!(is_interrupted(&err));

        let err = anyhow::Error::new(PromptError::Interrupted);
        assert!(is_interrupted(&err));

        let err = anyhow::anyhow!("boom");
        assert!(!is_interrupted(&err));
    }
}
