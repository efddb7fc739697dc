//! Embedded database service
//!
//! One redb database file holds everything: the reservation event log and
//! snapshots (hot path) plus the read-mostly floor plan and operating
//! schedule. Each repository opens its own tables on construction; the
//! `Database` handle is shared via `Arc`.
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate` by default: once `commit()`
//! returns, the admission decision survives power loss. The database file is
//! copy-on-write and always consistent.

use redb::Database;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Storage errors shared by every repository in the crate
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Reservation not found: {0}")]
    ReservationNotFound(i64),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Duplicate(String),

    #[error("Resource in use: {0}")]
    InUse(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Database service - opens the embedded store and hands out the shared handle
#[derive(Clone)]
pub struct DbService {
    db: Arc<Database>,
}

impl DbService {
    /// Open or create the database file at the given path
    pub fn new(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Shared handle to the underlying database
    pub fn database(&self) -> Arc<Database> {
        self.db.clone()
    }
}
