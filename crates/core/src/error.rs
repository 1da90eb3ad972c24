//! Error types for yadisk-core

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for yadisk-core
pub type Result<T> = std::result::Result<T, Error>;

/// Fallback text when an error body carries no usable field
const UNKNOWN_API_ERROR: &str = "unknown API error";

/// Main error type for yadisk-core
#[derive(Error, Debug)]
pub enum Error {
    /// Request exceeded the client-wide timeout
    #[error("Operation timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// Connection, TLS or body-stream failure
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The request could not be built or sent
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Request body could not be serialized
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Structured error returned by the API
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Non-2xx response without a usable error body
    #[error("API request failed with status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// A 2xx body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The API answered without a transfer URL
    #[error("No transfer URL returned for {0}")]
    MissingTransferUrl(String),

    /// The byte-transfer request answered with an unexpected status
    #[error("Transfer failed with status: {status}")]
    TransferStatus { status: u16 },

    /// Upload source does not exist
    #[error("Local file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Upload source exists but could not be read
    #[error("Failed to read local file {}: {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Download destination could not be created or written
    #[error("Failed to write {}: {source}", path.display())]
    DestinationWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidConfig(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// True for failures that happened before a response was received.
    ///
    /// These are the only errors a caller may reasonably retry; everything
    /// else is either an answer from the API or a local problem.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::Network(_) | Error::HttpClient(_) | Error::Encode(_)
        )
    }

    /// HTTP status observed for API and transfer errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(err) => Some(err.status),
            Error::UnexpectedStatus { status, .. } | Error::TransferStatus { status } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err)
        } else if err.is_builder() {
            Error::HttpClient(err)
        } else {
            Error::Network(err)
        }
    }
}

/// Error body returned by the API on non-2xx responses.
///
/// `status` is not part of the body; it is filled in from the response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub error: String,
    #[serde(skip)]
    pub status: u16,
}

/// Explicit `null` reads the same as a missing field
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ApiError {
    /// Most human-readable text available: description, then message,
    /// then the raw error code.
    pub fn best_message(&self) -> &str {
        [&self.description, &self.message, &self.error]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_API_ERROR)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.best_message())
    }
}

impl std::error::Error for ApiError {}
