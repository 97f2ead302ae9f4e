// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order queries. Reference fields are written once and never updated.

use ordesk_core::{OrdeskError, Order};
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::sql_err;
use crate::queries::{collect_rows, enum_col};

const ORDER_COLUMNS: &str =
    "id, package_id, brand_id, creator_id, quantity, total_amount, currency, status, created_at";

fn row_to_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        package_id: row.get(1)?,
        brand_id: row.get(2)?,
        creator_id: row.get(3)?,
        quantity: row.get(4)?,
        total_amount: row.get(5)?,
        currency: row.get(6)?,
        status: enum_col(row, 7)?,
        created_at: row.get(8)?,
    })
}

pub fn insert(conn: &Connection, order: &Order) -> Result<(), OrdeskError> {
    conn.execute(
        &format!("INSERT INTO orders ({ORDER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
        params![
            order.id,
            order.package_id,
            order.brand_id,
            order.creator_id,
            order.quantity,
            order.total_amount,
            order.currency,
            order.status.to_string(),
            order.created_at,
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Order>, OrdeskError> {
    conn.query_row(
        &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
        params![id],
        row_to_order,
    )
    .optional()
    .map_err(sql_err)
}

/// Orders placed by a brand, newest first.
pub fn list_for_brand(conn: &Connection, brand_id: &str) -> Result<Vec<Order>, OrdeskError> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE brand_id = ?1
             ORDER BY created_at DESC, id ASC"
        ))
        .map_err(sql_err)?;
    let rows = stmt.query_map(params![brand_id], row_to_order).map_err(sql_err)?;
    collect_rows(rows)
}

pub fn count(conn: &Connection) -> Result<i64, OrdeskError> {
    conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
        .map_err(sql_err)
}

/// Orders with no ticket. Always empty while the one-ticket invariant holds.
pub fn list_without_ticket(conn: &Connection) -> Result<Vec<Order>, OrdeskError> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o
             WHERE NOT EXISTS (SELECT 1 FROM tickets t WHERE t.order_id = o.id)
             ORDER BY created_at ASC"
        ))
        .map_err(sql_err)?;
    let rows = stmt.query_map([], row_to_order).map_err(sql_err)?;
    collect_rows(rows)
}
