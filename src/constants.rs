//! Provider Constants
//!
//! Centralized defaults shared by the provider, config and fetchers.

/// Delay between a range request and the fetch it schedules
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Cancellation reason used when a newer range request replaces a pending one
pub const REASON_SUPERSEDED: &str = "superseded";

/// Cancellation reason used when `clear` drops a pending fetch
pub const REASON_CLEARED: &str = "cleared";

/// Cancellation reason used by an explicit `cancel_pending`
pub const REASON_USER_CANCEL: &str = "user cancel";

/// HTTP backend defaults
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_RECORDS_PATH: &str = "/api/records";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Config file name inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "remote-grid.toml";
