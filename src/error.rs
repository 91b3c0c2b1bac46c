//! Error types for the TRIGGERcmd gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the TRIGGERcmd gateway
#[derive(Debug, Error)]
pub enum Error {
    /// No usable credentials attached, or an invalid configuration
    #[error("{0}")]
    Config(String),

    /// Trigger request failed validation before any network call
    #[error("{0}")]
    Validation(String),

    /// Test-connection probe called without a token
    #[error("missing token")]
    MissingToken,

    /// Remote API answered with a non-success status
    #[error("List failed: {status}")]
    Remote {
        /// HTTP status code returned by the remote API
        status: u16,
    },

    /// Typed property evaluation failed
    #[error("{0}")]
    Evaluation(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error (unreachable host, TLS, body read)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Short machine-readable kind, used in logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Validation(_) => "validation",
            Self::MissingToken => "missing_token",
            Self::Remote { .. } => "remote",
            Self::Evaluation(_) => "evaluation",
            Self::Io(_) => "io",
            Self::Http(_) => "http",
            Self::Serialization(_) => "serialization",
            Self::Toml(_) => "toml",
        }
    }
}
