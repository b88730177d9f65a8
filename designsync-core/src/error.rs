//! Error types for designsync-core.

use thiserror::Error;

/// All errors that can arise from constructing or extracting design documents.
///
/// Each malformed-row shape gets its own variant so callers can tell exactly
/// which contract the database response broke. None of these are retryable.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A document JSON object has no string `_id` member.
    #[error("document has no string `_id` member")]
    MissingId,

    /// A document is not a JSON object at all.
    #[error("document is not a JSON object")]
    NotAnObject,

    /// An `_all_docs` row has no string `key` member.
    #[error("query row has no string `key` member")]
    RowMissingKey,

    /// An `_all_docs` row has no string `id` member (doc-less listing rows).
    #[error("query row has no string `id` member")]
    RowMissingId,

    /// A row key does not carry the `_design/` prefix.
    #[error("row key '{key}' is not a design document id")]
    KeyNotDesign { key: String },

    /// A row has no `value` object.
    #[error("row '{key}' has no `value` object")]
    RowMissingValue { key: String },

    /// A row's `value` object has no string `rev` member.
    #[error("row '{key}' has no `value.rev` revision")]
    RowMissingRevision { key: String },

    /// A row has no `doc` object (query was made without `include_docs`?).
    #[error("row '{key}' has no `doc` object")]
    RowMissingDoc { key: String },
}
