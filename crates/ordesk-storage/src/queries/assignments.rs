// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket assignment history.

use ordesk_core::types::{AssignmentReason, AssignmentRecord};
use ordesk_core::OrdeskError;
use rusqlite::{params, Connection};

use crate::database::sql_err;
use crate::queries::{collect_rows, enum_col};

/// Append one assignment. Returns the history row id.
pub fn record(
    conn: &Connection,
    ticket_id: &str,
    agent_id: &str,
    reason: AssignmentReason,
    slot: Option<i64>,
    assigned_at: &str,
) -> Result<i64, OrdeskError> {
    conn.execute(
        "INSERT INTO ticket_assignments (ticket_id, agent_id, reason, slot, assigned_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![ticket_id, agent_id, reason.to_string(), slot, assigned_at],
    )
    .map_err(sql_err)?;
    Ok(conn.last_insert_rowid())
}

/// Every assignment a ticket has had, oldest first.
pub fn history(conn: &Connection, ticket_id: &str) -> Result<Vec<AssignmentRecord>, OrdeskError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, ticket_id, agent_id, reason, slot, assigned_at
             FROM ticket_assignments WHERE ticket_id = ?1 ORDER BY id ASC",
        )
        .map_err(sql_err)?;
    let rows = stmt
        .query_map(params![ticket_id], |row| {
            Ok(AssignmentRecord {
                id: row.get(0)?,
                ticket_id: row.get(1)?,
                agent_id: row.get(2)?,
                reason: enum_col(row, 3)?,
                slot: row.get(4)?,
                assigned_at: row.get(5)?,
            })
        })
        .map_err(sql_err)?;
    collect_rows(rows)
}
