//! clockify-cli - A command-line client for a hosted time-tracking service
//!
//! Start, stop, edit and report time entries, and manage the projects,
//! tasks, clients, tags and users of a workspace.
//!
//! # Architecture
//!
//! The codebase is layered, each layer only calling the ones below it:
//!
//! - [`cli`] - Command-line interface layer (parses args, dispatches handlers)
//! - [`factory`] - Builds the client, resolver, prompts and pipeline for a run
//! - [`engine`] - Composes time entries: defaults, flags, names, prompts, validation
//! - [`search`] - Resolves names to ids with fuzzy matching
//! - [`api`] - Typed, paginated and concurrent access to the REST service
//! - [`ui`] - Prompts and output rendering
//! - [`core`] - Domain types, configuration, folder defaults and time parsing
//!
//! # Invariants
//!
//! 1. Nothing is submitted unless every composition step succeeded
//! 2. Every request is validated before it leaves the process
//! 3. A cancelled run never reports a result that arrived after the cancel

pub mod api;
pub mod cli;
pub mod core;
pub mod engine;
pub mod factory;
pub mod search;
pub mod ui;
