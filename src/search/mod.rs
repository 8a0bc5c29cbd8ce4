//! search
//!
//! Name-to-id resolution without a search endpoint.
//!
//! # Modules
//!
//! - [`normalize`] - the shared fuzzy-match normalization
//! - [`resolver`] - matching a reference against candidates, one or many
//! - [`lookup`] - [`Resolver`], per-entity lookups over the API
//!
//! # Example
//!
//! ```
//! use clockify_cli::search::{resolve, Candidate, EntityKind, Filters};
//!
//! let clients = vec![
//!     Candidate::new("c1", "Coderockr"),
//!     Candidate::new("c2", "Other"),
//! ];
//! assert_eq!(resolve("other", EntityKind::Client, &clients, &Filters::new()).unwrap(), "c2");
//! assert!(resolve("xx", EntityKind::Client, &clients, &Filters::new()).is_err());
//! ```

pub mod lookup;
pub mod normalize;
pub mod resolver;

pub use lookup::{Resolver, ResolverOptions};
pub use normalize::{is_similar, normalize};
pub use resolver::{
    resolve, resolve_many, resolve_one, Candidate, EntityKind, Filters, ResolveError,
};
