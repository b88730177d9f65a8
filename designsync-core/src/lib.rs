//! Design-document domain model for designsync.
//!
//! Public API surface:
//! - [`document`] — [`DesignDocument`] and revision-blind content equality
//! - [`extract`] — `_all_docs` row extraction into a [`DocumentSet`]
//! - [`error`] — [`DocumentError`]

pub mod document;
pub mod error;
pub mod extract;

pub use document::{DesignDocument, DESIGN_PREFIX};
pub use error::DocumentError;
pub use extract::{extract, extract_revisions, DocumentSet};
