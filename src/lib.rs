//! remote-grid
//!
//! Windowed access to a remote, possibly still growing, record set for
//! virtualized data grids: sparse row cache, debounced range fetches with
//! cancellation, and loading notifications.

pub mod config;
pub mod constants;
pub mod error;
pub mod helpers;
pub mod provider;
pub mod services;
