//! Error type shared by every MAAS client operation.

use thiserror::Error;

/// Errors that can occur while talking to MAAS.
#[derive(Error, Debug)]
pub enum MaasError {
    /// Invalid client configuration (malformed API key, bad endpoint).
    /// Always detected before any network call.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Transport failure (connection, DNS, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// MAAS answered with a status outside the acceptable set.
    /// The body is the raw response text, never parsed.
    #[error("API error: status: {status}, message: {body}")]
    Api { status: u16, body: String },

    /// An acceptable response carried JSON of the wrong shape.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local I/O failure (reading an image file for upload).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A client-side precondition of a derived operation does not hold.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A lookup returned no matching entry.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl MaasError {
    /// HTTP status of an API error, if this is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MaasError>;
