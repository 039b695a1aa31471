//! Fetcher implementations.
//!
//! # Available Fetchers
//!
//! - `HttpFetcher` - reqwest-backed HTTP with a browser user agent
//! - `ValidatedFetcher` - SSRF validation wrapper for any fetcher
//! - `MockFetcher` - For testing
//!
//! # Example
//!
//! ```rust,ignore
//! use spec_compare::fetchers::{HttpFetcher, ValidatedFetcher};
//!
//! let fetcher = ValidatedFetcher::new(HttpFetcher::new());
//! ```

mod http;
mod mock;
mod validated;

pub use http::HttpFetcher;
pub use mock::MockFetcher;
pub use validated::ValidatedFetcher;

// Re-export from traits for convenience
pub use crate::traits::fetcher::{FetchedBody, Fetcher};
