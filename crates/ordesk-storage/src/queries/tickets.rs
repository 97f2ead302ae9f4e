// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket queries.
//!
//! The one-ticket-per-order rule lives in the schema (`UNIQUE (order_id)`);
//! [`insert`] translates that constraint failure into
//! [`OrdeskError::DuplicateTicket`].

use ordesk_core::{OrdeskError, Ticket, TicketStatus};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use crate::database::sql_err;
use crate::queries::{collect_rows, enum_col};

const TICKET_COLUMNS: &str = "id, order_id, assigned_agent_id, status, channel_id, \
                              channel_pending, created_at, updated_at";

fn row_to_ticket(row: &rusqlite::Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: row.get(0)?,
        order_id: row.get(1)?,
        assigned_agent_id: row.get(2)?,
        status: enum_col(row, 3)?,
        channel_id: row.get(4)?,
        channel_pending: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn is_order_uniqueness_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                && message
                    .as_deref()
                    .is_some_and(|m| m.contains("tickets.order_id"))
        }
        _ => false,
    }
}

pub fn insert(conn: &Connection, ticket: &Ticket) -> Result<(), OrdeskError> {
    let result = conn.execute(
        &format!(
            "INSERT INTO tickets ({TICKET_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ),
        params![
            ticket.id,
            ticket.order_id,
            ticket.assigned_agent_id,
            ticket.status.to_string(),
            ticket.channel_id,
            ticket.channel_pending,
            ticket.created_at,
            ticket.updated_at,
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(e) if is_order_uniqueness_violation(&e) => Err(OrdeskError::DuplicateTicket {
            order_id: ticket.order_id.clone(),
        }),
        Err(e) => Err(sql_err(e)),
    }
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Ticket>, OrdeskError> {
    conn.query_row(
        &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"),
        params![id],
        row_to_ticket,
    )
    .optional()
    .map_err(sql_err)
}

pub fn get_by_order(conn: &Connection, order_id: &str) -> Result<Option<Ticket>, OrdeskError> {
    conn.query_row(
        &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE order_id = ?1"),
        params![order_id],
        row_to_ticket,
    )
    .optional()
    .map_err(sql_err)
}

/// Tickets currently assigned to an agent, oldest first, optionally by status.
pub fn list_for_agent(
    conn: &Connection,
    agent_id: &str,
    status: Option<TicketStatus>,
) -> Result<Vec<Ticket>, OrdeskError> {
    let status = status.map(|s| s.to_string());
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets
             WHERE assigned_agent_id = ?1 AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at ASC, id ASC"
        ))
        .map_err(sql_err)?;
    let rows = stmt
        .query_map(params![agent_id, status], row_to_ticket)
        .map_err(sql_err)?;
    collect_rows(rows)
}

pub fn update_status(
    conn: &Connection,
    id: &str,
    status: TicketStatus,
    updated_at: &str,
) -> Result<(), OrdeskError> {
    conn.execute(
        "UPDATE tickets SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.to_string(), updated_at, id],
    )
    .map_err(sql_err)?;
    Ok(())
}

pub fn update_assignee(
    conn: &Connection,
    id: &str,
    agent_id: &str,
    updated_at: &str,
) -> Result<(), OrdeskError> {
    conn.execute(
        "UPDATE tickets SET assigned_agent_id = ?1, updated_at = ?2 WHERE id = ?3",
        params![agent_id, updated_at, id],
    )
    .map_err(sql_err)?;
    Ok(())
}

/// Replace a placeholder channel id with the real one.
///
/// Only applies while the ticket is still pending, so a late backfill can
/// never overwrite a channel that was attached in the meantime.
pub fn attach_channel(
    conn: &Connection,
    id: &str,
    channel_id: &str,
    updated_at: &str,
) -> Result<bool, OrdeskError> {
    let changed = conn
        .execute(
            "UPDATE tickets SET channel_id = ?1, channel_pending = 0, updated_at = ?2
             WHERE id = ?3 AND channel_pending = 1",
            params![channel_id, updated_at, id],
        )
        .map_err(sql_err)?;
    Ok(changed > 0)
}

/// Tickets still carrying a placeholder channel id that were created at or
/// before `created_before`, oldest first.
pub fn list_channel_pending(
    conn: &Connection,
    created_before: &str,
    limit: i64,
) -> Result<Vec<Ticket>, OrdeskError> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets
             WHERE channel_pending = 1 AND created_at <= ?1
             ORDER BY created_at ASC LIMIT ?2"
        ))
        .map_err(sql_err)?;
    let rows = stmt
        .query_map(params![created_before, limit], row_to_ticket)
        .map_err(sql_err)?;
    collect_rows(rows)
}

pub fn count(conn: &Connection) -> Result<i64, OrdeskError> {
    conn.query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))
        .map_err(sql_err)
}

pub fn count_channel_pending(conn: &Connection) -> Result<i64, OrdeskError> {
    conn.query_row(
        "SELECT COUNT(*) FROM tickets WHERE channel_pending = 1",
        [],
        |row| row.get(0),
    )
    .map_err(sql_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{open_seeded, order_with_ticket, ticket, TS};

    #[tokio::test]
    async fn second_ticket_for_same_order_is_duplicate() {
        let (db, _dir) = open_seeded().await;
        db.call(|conn| order_with_ticket(conn, "order-1", "ticket-1", "agent-a"))
            .await
            .unwrap();

        let err = db
            .call(|conn| insert(conn, &ticket("ticket-2", "order-1", "agent-b")))
            .await
            .unwrap_err();
        assert!(
            matches!(err, OrdeskError::DuplicateTicket { ref order_id } if order_id == "order-1"),
            "got {err:?}"
        );
        assert_eq!(db.call(|conn| count(conn)).await.unwrap(), 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_by_order_finds_the_ticket() {
        let (db, _dir) = open_seeded().await;
        db.call(|conn| order_with_ticket(conn, "order-1", "ticket-1", "agent-a"))
            .await
            .unwrap();

        let found = db
            .call(|conn| get_by_order(conn, "order-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "ticket-1");
        assert_eq!(found.status, TicketStatus::Open);
        assert!(db.call(|conn| get_by_order(conn, "nope")).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn attach_channel_only_replaces_placeholders() {
        let (db, _dir) = open_seeded().await;
        db.call(|conn| order_with_ticket(conn, "order-1", "ticket-1", "agent-a"))
            .await
            .unwrap();

        let first = db
            .call(|conn| attach_channel(conn, "ticket-1", "chan-real", TS))
            .await
            .unwrap();
        let second = db
            .call(|conn| attach_channel(conn, "ticket-1", "chan-late", TS))
            .await
            .unwrap();
        assert!(first);
        assert!(!second, "an attached channel must not be overwritten");

        let stored = db.call(|conn| get(conn, "ticket-1")).await.unwrap().unwrap();
        assert_eq!(stored.channel_id, "chan-real");
        assert!(!stored.channel_pending);
        assert_eq!(db.call(|conn| count_channel_pending(conn)).await.unwrap(), 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_channel_pending_skips_tickets_newer_than_cutoff() {
        let (db, _dir) = open_seeded().await;
        db.call(|conn| {
            order_with_ticket(conn, "order-1", "ticket-old", "agent-a")?;
            crate::queries::orders::insert(conn, &crate::fixtures::order("order-2"))?;
            insert(
                conn,
                &Ticket {
                    created_at: "2026-01-01T00:05:00.000Z".into(),
                    ..ticket("ticket-new", "order-2", "agent-a")
                },
            )
        })
        .await
        .unwrap();

        let due = db
            .call(|conn| list_channel_pending(conn, "2026-01-01T00:01:00.000Z", 10))
            .await
            .unwrap();
        let ids: Vec<&str> = due.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["ticket-old"]);

        let all = db
            .call(|conn| list_channel_pending(conn, "2026-01-01T00:05:00.000Z", 10))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_for_agent_filters_by_assignee_and_status() {
        let (db, _dir) = open_seeded().await;
        db.call(|conn| {
            order_with_ticket(conn, "order-1", "ticket-1", "agent-a")?;
            order_with_ticket(conn, "order-2", "ticket-2", "agent-b")?;
            order_with_ticket(conn, "order-3", "ticket-3", "agent-a")?;
            update_status(conn, "ticket-3", TicketStatus::Closed, TS)
        })
        .await
        .unwrap();

        let all = db.call(|conn| list_for_agent(conn, "agent-a", None)).await.unwrap();
        assert_eq!(all.len(), 2);
        let open = db
            .call(|conn| list_for_agent(conn, "agent-a", Some(TicketStatus::Open)))
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "ticket-1");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn tickets_cannot_be_deleted() {
        let (db, _dir) = open_seeded().await;
        db.call(|conn| order_with_ticket(conn, "order-1", "ticket-1", "agent-a"))
            .await
            .unwrap();
        let result = db
            .call(|conn| {
                conn.execute("DELETE FROM tickets WHERE id = 'ticket-1'", [])
                    .map_err(sql_err)
            })
            .await;
        assert!(result.is_err());
        db.close().await.unwrap();
    }
}
