//! Reconciliation engine: check, push, purge.
//!
//! ## Push convergence
//!
//! A bulk write can race another writer: revisions move between our fetch and
//! our write, and CouchDB rejects the stale updates. The engine never
//! resubmits a failed or stale request; instead it re-fetches, recomputes the
//! diff against the fixed file-system set, and writes again. The loop is
//! bounded by [`RetryPolicy`] with exponential backoff, and surfaces
//! [`EngineError::DidNotConverge`] when the bound is exhausted.

use std::thread;
use std::time::Duration;

use serde_json::Value;

use designsync_core::{extract, extract_revisions, DocumentSet};

use crate::database::Database;
use crate::diff::changed_documents;
use crate::error::EngineError;
use crate::events::{EventSink, LogSink, SyncEvent};

/// Rows requested per purge page.
const PURGE_BATCH_SIZE: usize = 1000;

/// Assembles the file-system truth: one design document per top-level folder.
///
/// Synchronous; failures are whatever the underlying source propagates.
pub trait DocumentAssembler {
    fn assemble(&self) -> Result<DocumentSet, EngineError>;
}

/// Bound and pacing for the push convergence loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of bulk writes before giving up.
    pub max_attempts: u32,
    /// Delay before the second write; doubles on each further attempt.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Orchestrates check/push/purge against one database.
///
/// Holds its collaborators by composition: a [`Database`], a
/// [`DocumentAssembler`], and an [`EventSink`] for observability. One engine
/// per target database; calls are sequential, never concurrent.
pub struct Engine<D, A> {
    database: D,
    assembler: A,
    sink: Box<dyn EventSink>,
    retry: RetryPolicy,
}

impl<D: Database, A: DocumentAssembler> Engine<D, A> {
    pub fn new(database: D, assembler: A) -> Self {
        Self {
            database,
            assembler,
            sink: Box::new(LogSink),
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the default log-backed sink (tests use a recording sink).
    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether the database's design documents drift from the file system.
    ///
    /// No mutation: one fetch, one assembly, one diff.
    pub fn check_if_changed(&self) -> Result<bool, EngineError> {
        let from_database = self.fetch_database_documents()?;
        let from_file_system = self.assemble_documents()?;
        Ok(!changed_documents(&from_file_system, &from_database).is_empty())
    }

    /// Converge the database's design documents toward the file system.
    ///
    /// The file-system set is assembled once; every iteration re-fetches the
    /// database set, so drift introduced by concurrent writers is detected
    /// and corrected on the next pass.
    pub fn push_if_changed(&self) -> Result<(), EngineError> {
        let from_file_system = self.assemble_documents()?;

        let mut attempt: u32 = 0;
        loop {
            let from_database = self.fetch_database_documents()?;
            let changed = changed_documents(&from_file_system, &from_database);
            if changed.is_empty() {
                if attempt == 0 {
                    self.sink.emit(SyncEvent::NoChanges);
                }
                self.sink.emit(SyncEvent::Converged { writes: attempt });
                return Ok(());
            }
            if attempt >= self.retry.max_attempts {
                return Err(EngineError::DidNotConverge { attempts: attempt });
            }
            if attempt > 0 {
                let delay = self.retry.backoff(attempt);
                self.sink.emit(SyncEvent::PushRetry { attempt, delay });
                thread::sleep(delay);
            }

            for doc in &changed {
                let event = if doc.is_new() {
                    SyncEvent::DocumentNew {
                        id: doc.id().to_owned(),
                    }
                } else {
                    SyncEvent::DocumentChanged {
                        id: doc.id().to_owned(),
                    }
                };
                self.sink.emit(event);
            }

            let docs: Vec<Value> = changed.iter().map(|doc| doc.to_json()).collect();
            self.database.bulk_write(&docs)?;
            self.sink.emit(SyncEvent::BulkWriteIssued { count: docs.len() });
            attempt += 1;
        }
    }

    /// Delete every document in the database, in bounded batches.
    ///
    /// Unconditionally destructive: no diff against any source of truth, and
    /// not limited to design documents. Terminates when a page comes back
    /// empty.
    pub fn purge_database(&self) -> Result<(), EngineError> {
        loop {
            let rows = self.database.all_docs_page(PURGE_BATCH_SIZE)?;
            if rows.is_empty() {
                return Ok(());
            }
            let docs: Vec<Value> = extract_revisions(&rows)?
                .into_iter()
                .map(|(id, rev)| {
                    serde_json::json!({ "_id": id, "_rev": rev, "_deleted": true })
                })
                .collect();
            self.database.bulk_write(&docs)?;
            self.sink.emit(SyncEvent::BatchPurged { count: docs.len() });
        }
    }

    fn fetch_database_documents(&self) -> Result<DocumentSet, EngineError> {
        let rows = self.database.design_document_rows()?;
        let documents = extract(&rows)?;
        self.sink.emit(SyncEvent::DatabaseFetched {
            count: documents.len(),
        });
        Ok(documents)
    }

    fn assemble_documents(&self) -> Result<DocumentSet, EngineError> {
        let documents = self.assembler.assemble()?;
        self.sink.emit(SyncEvent::FileSystemAssembled {
            count: documents.len(),
        });
        Ok(documents)
    }
}

/// Render every assembled document as pretty-printed JSON.
///
/// Needs no database; this backs `designsync generate`.
pub fn generate<A: DocumentAssembler>(assembler: &A) -> Result<Vec<String>, EngineError> {
    let documents = assembler.assemble()?;
    documents
        .values()
        .map(|doc| serde_json::to_string_pretty(&doc.to_json()).map_err(EngineError::from))
        .collect()
}
