// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Creator package catalog queries.

use ordesk_core::types::Package;
use ordesk_core::OrdeskError;
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::sql_err;

pub fn insert(conn: &Connection, package: &Package) -> Result<(), OrdeskError> {
    conn.execute(
        "INSERT INTO packages (id, creator_id, title, price, currency, active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            package.id,
            package.creator_id,
            package.title,
            package.price,
            package.currency,
            package.active,
            package.created_at,
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Package>, OrdeskError> {
    conn.query_row(
        "SELECT id, creator_id, title, price, currency, active, created_at
         FROM packages WHERE id = ?1",
        params![id],
        |row| {
            Ok(Package {
                id: row.get(0)?,
                creator_id: row.get(1)?,
                title: row.get(2)?,
                price: row.get(3)?,
                currency: row.get(4)?,
                active: row.get(5)?,
                created_at: row.get(6)?,
            })
        },
    )
    .optional()
    .map_err(sql_err)
}
