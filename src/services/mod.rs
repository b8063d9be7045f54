//! Service Layer
//!
//! Runtime plumbing and backend access for the provider.

mod http_fetcher;
mod runtime;

pub use http_fetcher::*;
pub use runtime::*;
