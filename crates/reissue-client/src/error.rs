//! Client error types.

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error code from server, `unknown` when the body carried none.
        code: String,
        /// Error message from server.
        message: String,
    },

    /// The server rejected the credentials, even after a token reissue.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token store failure outside of the refresh path.
    #[error("Token store error: {0}")]
    Store(#[from] StoreError),

    /// The access token expired and could not be reissued.
    ///
    /// The caller has to log in again.
    #[error("Session expired: {0}")]
    SessionExpired(#[from] RefreshError),
}

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_)) || matches!(self, Error::Api { status: 404, .. })
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_)) || matches!(self, Error::Api { status: 401, .. })
    }

    /// Check if the stored session is unusable and a fresh login is needed.
    pub fn requires_login(&self) -> bool {
        matches!(self, Error::SessionExpired(_) | Error::Auth(_))
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }

    /// Check if the request timed out before a response arrived.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Http(e) if e.is_timeout())
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error response from the server.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(alias = "error")]
    pub message: String,
}

/// Why a token reissue failed.
///
/// Cloneable so every caller awaiting a shared refresh receives the outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    /// No refresh token is stored.
    #[error("no refresh token stored")]
    MissingToken,

    /// The reissue request never produced a response.
    #[error("reissue request failed: {0}")]
    Transport(String),

    /// The reissue endpoint answered with a non-success status.
    #[error("reissue rejected with status {status}")]
    Rejected { status: u16 },

    /// The reissue response body was not a token pair.
    #[error("invalid reissue response: {0}")]
    InvalidResponse(String),

    /// The reissued tokens could not be persisted.
    #[error("failed to persist reissued tokens: {0}")]
    Store(String),
}

/// Token store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read or write the backing file.
    #[error("token file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Backing file content is not a JSON object of strings.
    #[error("token file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Result type for token store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
