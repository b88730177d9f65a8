//! Error types for designsync-engine.

use std::path::PathBuf;

use thiserror::Error;

use designsync_core::DocumentError;

/// All errors that can arise from engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The database URL is malformed, relative, or not http/https.
    ///
    /// Raised before any I/O and never retried.
    #[error("invalid database URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A query row or document body broke the expected shape.
    #[error("malformed database response: {0}")]
    Document(#[from] DocumentError),

    /// The database answered with a non-success status code.
    #[error("database returned HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// The request never completed (DNS, connection refused, timeout, ...).
    #[error("transport failure for {url}: {message}")]
    Transport { url: String, message: String },

    /// The response body was not the JSON shape the wire contract promises.
    #[error("unexpected response from {url}: {message}")]
    UnexpectedResponse { url: String, message: String },

    /// The bounded push loop exhausted its retries with drift still present.
    ///
    /// Another writer kept moving the database between our fetches and
    /// writes; `attempts` counts the bulk writes issued.
    #[error("push did not converge after {attempts} bulk writes; database is being modified concurrently")]
    DidNotConverge { attempts: u32 },

    /// An I/O error from the assembler, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`EngineError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.into(),
        source,
    }
}
