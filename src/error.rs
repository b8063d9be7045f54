//! Error types for remote-grid
//!
//! Centralized error handling using snafu for ergonomic error definitions.

use snafu::Snafu;

/// Main error type for the crate
#[derive(Debug, Snafu)]
pub enum Error {
    /// Invalid input or configuration value
    #[snafu(display("Invalid: {message}"))]
    Invalid { message: String },

    /// A range was requested before a fetcher was registered
    #[snafu(display("Configuration error: {message}"))]
    Configuration { message: String },

    /// The fetch was superseded or explicitly cancelled
    #[snafu(display("Cancelled: {reason}"))]
    Cancelled { reason: String },

    /// The backend rejected or failed the request
    #[snafu(display("Backend error: {message}"))]
    Backend { message: String },

    /// HTTP transport error
    #[snafu(display("HTTP error: {source}"))]
    Http { source: reqwest::Error },

    /// IO error (config file operations)
    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    /// JSON serialization/deserialization error
    #[snafu(display("JSON error: {source}"))]
    Json { source: serde_json::Error },

    /// TOML deserialization error
    #[snafu(display("TOML parse error: {source}"))]
    TomlDe { source: toml::de::Error },

    /// TOML serialization error
    #[snafu(display("TOML serialize error: {source}"))]
    TomlSe { source: toml::ser::Error },
}

impl Error {
    /// Whether this error only reports a cancelled fetch
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }

    pub(crate) fn cancelled(reason: impl Into<String>) -> Self {
        Error::Cancelled {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::Json { source }
    }
}

impl From<toml::de::Error> for Error {
    fn from(source: toml::de::Error) -> Self {
        Error::TomlDe { source }
    }
}

impl From<toml::ser::Error> for Error {
    fn from(source: toml::ser::Error) -> Self {
        Error::TomlSe { source }
    }
}

impl From<reqwest::Error> for Error {
    fn from(source: reqwest::Error) -> Self {
        Error::Http { source }
    }
}

/// Result type alias for convenience
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_is_distinguishable() {
        assert!(Error::cancelled("superseded").is_cancelled());
        let backend = Error::Backend {
            message: "HTTP 500".to_string(),
        };
        assert!(!backend.is_cancelled());
        assert_eq!(backend.to_string(), "Backend error: HTTP 500");
    }
}
