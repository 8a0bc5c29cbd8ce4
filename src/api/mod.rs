//! api
//!
//! Access to the remote time-tracking service.
//!
//! # Layers
//!
//! - [`transport`] - one authenticated JSON request, typed errors, debug log
//! - [`pagination`] - sequential page walking for list endpoints
//! - [`client`] - [`HttpClient`], the [`Api`] implementation over HTTPS
//! - [`mock`] - [`MockApi`](mock::MockApi), an in-memory implementation for tests
//!
//! [`Api`] is the seam every other layer depends on; the factory decides
//! which implementation is used.

pub mod client;
pub mod mock;
pub mod pagination;
pub mod params;
pub mod traits;
pub mod transport;

pub use client::HttpClient;
pub use pagination::{paginate, PaginationParam, MAX_PAGE_SIZE};
pub use params::*;
pub use traits::{Api, ApiError};
pub use transport::Transport;
