// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistent Storage Module
//!
//! SQLite-backed storage for the durable hit queue and the campaign
//! datastore (registration ledger, last synced rules URL).

#[cfg(feature = "testing")]
pub mod datastore;
#[cfg(not(feature = "testing"))]
mod datastore;

mod error;

#[cfg(feature = "testing")]
pub mod hits;
#[cfg(not(feature = "testing"))]
mod hits;

pub mod migration;

pub use error::StorageError;
pub use hits::QueuedHit;

use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

/// Storage shared between the hit queue, the ledger and the sync coordinator.
pub type SharedStorage = Arc<Mutex<Storage>>;

/// SQLite-based storage implementation.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens or creates a storage database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Io(format!("{}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path)?;
        let storage = Storage { conn };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Creates an in-memory storage (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Storage { conn };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Runs all pending schema migrations.
    fn run_migrations(&self) -> Result<(), StorageError> {
        let migrations = migration::all_migrations();
        migration::MigrationRunner::run(&self.conn, &migrations)
    }

    /// Returns the current schema version.
    pub fn schema_version(&self) -> Result<u32, StorageError> {
        migration::MigrationRunner::current_version(&self.conn)
    }

    /// Wraps this storage for sharing across components.
    pub fn into_shared(self) -> SharedStorage {
        Arc::new(Mutex::new(self))
    }
}
