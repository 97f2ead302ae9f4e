// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable round-robin assignment cursor.

use ordesk_core::OrdeskError;
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::sql_err;

/// Atomically advance the named cursor and return its pre-increment value.
///
/// A missing row is created at position 1 and reported as slot 0. The
/// statement is a single upsert, so two callers can never read the same slot.
pub fn advance(conn: &Connection, name: &str) -> Result<i64, OrdeskError> {
    conn.query_row(
        "INSERT INTO assignment_cursor (name, position) VALUES (?1, 1)
         ON CONFLICT (name) DO UPDATE SET position = position + 1
         RETURNING position - 1",
        params![name],
        |row| row.get(0),
    )
    .map_err(sql_err)
}

/// Current cursor position without advancing it (0 when never used).
pub fn peek(conn: &Connection, name: &str) -> Result<i64, OrdeskError> {
    let position: Option<i64> = conn
        .query_row(
            "SELECT position FROM assignment_cursor WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()
        .map_err(sql_err)?;
    Ok(position.unwrap_or(0))
}
