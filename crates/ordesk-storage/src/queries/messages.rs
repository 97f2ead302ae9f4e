// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation message queries. The table is append-only (enforced by triggers).

use ordesk_core::{Message, OrdeskError};
use rusqlite::{params, Connection};

use crate::database::sql_err;
use crate::queries::{collect_rows, enum_col};

const MESSAGE_COLUMNS: &str =
    "seq, id, ticket_id, sender_id, sender_role, body, attachment, kind, created_at";

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        seq: row.get(0)?,
        id: row.get(1)?,
        ticket_id: row.get(2)?,
        sender_id: row.get(3)?,
        sender_role: enum_col(row, 4)?,
        body: row.get(5)?,
        attachment: row.get(6)?,
        kind: enum_col(row, 7)?,
        created_at: row.get(8)?,
    })
}

/// Append a message. `msg.seq` is ignored; the assigned sequence is returned.
pub fn insert(conn: &Connection, msg: &Message) -> Result<i64, OrdeskError> {
    conn.execute(
        "INSERT INTO messages (id, ticket_id, sender_id, sender_role, body, attachment, kind, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            msg.id,
            msg.ticket_id,
            msg.sender_id,
            msg.sender_role.to_string(),
            msg.body,
            msg.attachment,
            msg.kind.to_string(),
            msg.created_at,
        ],
    )
    .map_err(sql_err)?;
    Ok(conn.last_insert_rowid())
}

/// Latest `created_at` recorded for a ticket, if it has any messages.
pub fn latest_created_at(
    conn: &Connection,
    ticket_id: &str,
) -> Result<Option<String>, OrdeskError> {
    conn.query_row(
        "SELECT MAX(created_at) FROM messages WHERE ticket_id = ?1",
        params![ticket_id],
        |row| row.get(0),
    )
    .map_err(sql_err)
}

/// Messages for a ticket in conversation order. `None` returns everything.
pub fn list(
    conn: &Connection,
    ticket_id: &str,
    limit: Option<i64>,
) -> Result<Vec<Message>, OrdeskError> {
    list_after(conn, ticket_id, 0, limit)
}

/// Messages appended after sequence `after_seq`, in conversation order.
///
/// Conversation order is `seq` order. Passing the `seq` of the last message
/// already seen resumes a listing without gaps or repeats, whatever the
/// stored timestamps say.
pub fn list_after(
    conn: &Connection,
    ticket_id: &str,
    after_seq: i64,
    limit: Option<i64>,
) -> Result<Vec<Message>, OrdeskError> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE ticket_id = ?1 AND seq > ?2
             ORDER BY seq ASC
             LIMIT ?3"
        ))
        .map_err(sql_err)?;
    // SQLite treats a negative LIMIT as unbounded.
    let rows = stmt
        .query_map(params![ticket_id, after_seq, limit.unwrap_or(-1)], row_to_message)
        .map_err(sql_err)?;
    collect_rows(rows)
}
