//! Session snapshot persistence
//!
//! Features:
//! - Versioned JSON envelope
//! - File store with write-then-rename, in-memory store for tests
//! - Background worker with an observable busy flag
//! - I/O failures absorbed into flag state, never surfaced mid-frame

pub mod service;
pub mod snapshot;
pub mod store;

pub use service::{Persistence, SessionStore};
pub use snapshot::{BodyRecord, ColumnRecord, EntityRecord, SNAPSHOT_VERSION, Snapshot};
pub use store::{FileStore, MemoryStore, SnapshotStore};

use thiserror::Error;

/// Errors produced by the persistence layer
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("no snapshot stored for session `{0}`")]
    NotFound(String),

    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("unsupported snapshot version {0}")]
    Version(u32),

    #[error("persistence worker has shut down")]
    WorkerGone,
}
