//! # designsync-engine
//!
//! The reconciliation engine: diffs a file-system-derived design-document set
//! against the set persisted in a CouchDB database and converges the database
//! toward the file system.
//!
//! Construct an [`Engine`] from a [`Database`] implementation (usually
//! [`HttpDatabase`]) and a [`DocumentAssembler`], then call
//! [`Engine::check_if_changed`], [`Engine::push_if_changed`] or
//! [`Engine::purge_database`].

pub mod database;
pub mod diff;
pub mod engine;
pub mod error;
pub mod events;

pub use database::{Credentials, Database, DatabaseUrl, HttpDatabase};
pub use diff::changed_documents;
pub use engine::{generate, DocumentAssembler, Engine, RetryPolicy};
pub use error::EngineError;
pub use events::{EventSink, LogSink, SyncEvent};
