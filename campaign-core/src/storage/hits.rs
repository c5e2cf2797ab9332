// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Hit queue storage operations.

use rusqlite::params;

use super::{Storage, StorageError};

/// A persisted hit queue row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedHit {
    /// Autoincrement id; ascending order is enqueue order.
    pub id: i64,
    /// Serialized hit record.
    pub data: String,
    /// Enqueue time (epoch millis).
    pub created_at: i64,
}

impl Storage {
    // === Hit Queue Operations ===

    /// Appends a serialized hit; returns its queue id.
    pub fn push_hit(&self, data: &str, created_at: i64) -> Result<i64, StorageError> {
        self.conn.execute(
            "INSERT INTO hit_queue (data, created_at) VALUES (?1, ?2)",
            params![data, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Returns the oldest hit without removing it.
    pub fn peek_hit(&self) -> Result<Option<QueuedHit>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, data, created_at FROM hit_queue ORDER BY id LIMIT 1")?;

        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_queued_hit(row)?)),
            None => Ok(None),
        }
    }

    /// Deletes a hit by id.
    pub fn delete_hit(&self, id: i64) -> Result<bool, StorageError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM hit_queue WHERE id = ?1", params![id])?;
        Ok(rows_affected > 0)
    }

    /// Counts queued hits.
    pub fn count_hits(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM hit_queue", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Deletes every queued hit; returns how many were removed.
    pub fn clear_hits(&self) -> Result<usize, StorageError> {
        let rows_affected = self.conn.execute("DELETE FROM hit_queue", [])?;
        Ok(rows_affected)
    }
}

fn row_to_queued_hit(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueuedHit> {
    Ok(QueuedHit {
        id: row.get(0)?,
        data: row.get(1)?,
        created_at: row.get(2)?,
    })
}
