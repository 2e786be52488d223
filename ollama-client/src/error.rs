//! Error types for the Ollama client.
//!
//! [`Error`] covers every failure mode of a call against the Ollama server:
//! transport problems, unexpected HTTP statuses, malformed JSON, error
//! payloads reported by the server, unreadable files and invalid arguments.
//!
//! Whether these errors reach the caller is decided by the process-wide
//! exception policy, see [`crate::policy`].

use std::path::PathBuf;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for all client operations.
///
/// Each variant represents a distinct failure mode, enabling callers to
/// pattern-match on specific cases.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Connect, write or read failure, including timeouts.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// The server's `error` text, or the raw body when it carried none.
        message: String,
    },

    /// The model named in the request does not exist on the server (HTTP 404).
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// A reply body or the final streamed frame could not be parsed.
    #[error("Invalid JSON: {message}")]
    InvalidJson {
        /// Parser diagnostic.
        message: String,
        /// The offending payload.
        payload: String,
    },

    /// A successful reply whose JSON carries an `error` field.
    #[error("Ollama response returned error: {0}")]
    Server(String),

    /// A file (image, Modelfile) could not be read.
    #[error("Unable to read {path}: {source}")]
    File {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A request is missing a required field or carries an unusable value.
    #[error("Bad argument: {0}")]
    BadArgument(String),
}

impl Error {
    /// Create a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
        }
    }

    /// Create a model-not-found error.
    #[must_use]
    pub fn model_not_found(model: impl Into<String>) -> Self {
        Self::ModelNotFound(model.into())
    }

    /// Create an invalid JSON error.
    #[must_use]
    pub fn invalid_json(message: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::InvalidJson {
            message: message.into(),
            payload: payload.into(),
        }
    }

    /// Create a server error from the payload's `error` text.
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server(message.into())
    }

    /// Create a file error.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Create a bad argument error.
    #[must_use]
    pub fn bad_argument(message: impl Into<String>) -> Self {
        Self::BadArgument(message.into())
    }

    /// Check whether this error reports a missing model (including a bare 404).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound(_) | Self::HttpStatus { status: 404, .. }
        )
    }

    /// Check whether this error originated in the transport layer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::transport(format!("Request timed out: {err}"))
        } else if err.is_connect() {
            Self::transport(format!("Connection failed: {err}"))
        } else {
            Self::transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_json(err.to_string(), String::new())
    }
}
