//! Tokio Runtime Bridge
//!
//! Providers spawn their debounced fetches on a tokio runtime. Callers that
//! live inside one (async tests, services) use it directly; callers outside
//! any runtime (the CLI's main thread, a GUI event loop) fall back to this
//! lazily created global runtime.

use std::sync::OnceLock;
use tokio::runtime::{Builder, Runtime};

/// Global tokio runtime instance
static TOKIO_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get or initialize the global tokio runtime
fn get_runtime() -> &'static Runtime {
    TOKIO_RUNTIME.get_or_init(|| {
        Builder::new_multi_thread()
            .thread_name("remote-grid-worker")
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime")
    })
}

/// Get a handle to the global tokio runtime
pub fn runtime_handle() -> tokio::runtime::Handle {
    get_runtime().handle().clone()
}
