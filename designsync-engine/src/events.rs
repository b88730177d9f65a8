//! Engine observability events.
//!
//! The engine reports progress through an injected [`EventSink`] rather than
//! a global logger, so tests can capture and assert on the exact sequence of
//! events. [`LogSink`] is the production sink and forwards to the `log`
//! facade.

use std::cell::RefCell;
use std::time::Duration;

/// One observable step of a check/push/purge run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Design documents were fetched from the database.
    DatabaseFetched { count: usize },
    /// Design documents were assembled from the file system.
    FileSystemAssembled { count: usize },
    /// A document exists on disk but not in the database.
    DocumentNew { id: String },
    /// A document's content differs between disk and database.
    DocumentChanged { id: String },
    /// The diff was empty; nothing to write.
    NoChanges,
    /// One bulk write with `count` documents was issued.
    BulkWriteIssued { count: usize },
    /// Residual drift detected after a write; the loop will retry.
    PushRetry { attempt: u32, delay: Duration },
    /// Push finished with the database matching the file system.
    Converged { writes: u32 },
    /// One purge batch of `count` documents was deleted.
    BatchPurged { count: usize },
}

/// Receiver for [`SyncEvent`]s emitted during an engine run.
pub trait EventSink {
    fn emit(&self, event: SyncEvent);
}

/// Production sink: forwards every event to the `log` facade.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: SyncEvent) {
        match event {
            SyncEvent::DatabaseFetched { count } => {
                log::info!("{count} design documents downloaded from database")
            }
            SyncEvent::FileSystemAssembled { count } => {
                log::info!("{count} design documents assembled from file system")
            }
            SyncEvent::DocumentNew { id } => log::info!("design document {id} is new"),
            SyncEvent::DocumentChanged { id } => log::info!("design document {id} has changed"),
            SyncEvent::NoChanges => log::info!("no design documents have changed"),
            SyncEvent::BulkWriteIssued { count } => {
                log::info!("pushing {count} design documents to database")
            }
            SyncEvent::PushRetry { attempt, delay } => log::warn!(
                "drift remains after write; retry {attempt} in {}ms",
                delay.as_millis()
            ),
            SyncEvent::Converged { writes } => {
                log::info!("database in sync after {writes} bulk writes")
            }
            SyncEvent::BatchPurged { count } => log::info!("purged batch of {count} documents"),
        }
    }
}

/// Test sink: records every event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RefCell<Vec<SyncEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.borrow().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: SyncEvent) {
        self.events.borrow_mut().push(event);
    }
}
