//! core
//!
//! Core domain types and local state for the time tracker.
//!
//! # Modules
//!
//! - [`types`] - Entities and strong types: EntityId, HexColor, TimeEntry, etc.
//! - [`defaults`] - Folder-scoped defaults discovery and storage
//! - [`config`] - Configuration schema, layering and persistence
//! - [`timefmt`] - Time expressions, zones, durations and date ranges
//! - [`cancel`] - Cancellation token shared by one command run
//!
//! # Design Principles
//!
//! - Ids are validated once at the boundary and carried as strong types
//! - Local files are read at most once per command run

pub mod cancel;
pub mod config;
pub mod defaults;
pub mod timefmt;
pub mod types;
