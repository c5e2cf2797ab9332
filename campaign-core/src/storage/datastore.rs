// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Key/value datastore operations.

use rusqlite::{params, OptionalExtension};

use super::{Storage, StorageError};

impl Storage {
    // === Datastore Operations ===

    /// Reads a string value.
    pub fn get_value(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM datastore WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Reads an integer value; `default` if absent or not a number.
    pub fn get_i64(&self, key: &str, default: i64) -> Result<i64, StorageError> {
        Ok(self
            .get_value(key)?
            .and_then(|v| v.parse().ok())
            .unwrap_or(default))
    }

    /// Writes a string value, replacing any previous one.
    pub fn set_value(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO datastore (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Removes a value; returns whether it existed.
    pub fn remove_value(&self, key: &str) -> Result<bool, StorageError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM datastore WHERE key = ?1", params![key])?;
        Ok(rows_affected > 0)
    }

    /// Removes every datastore value.
    pub fn clear_datastore(&self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM datastore", [])?;
        Ok(())
    }
}
