// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for storage entities.
//!
//! Every function takes a plain `&rusqlite::Connection` so it can run either
//! standalone through [`Database::call`](crate::Database::call) or as one
//! step of a [`Database::transaction`](crate::Database::transaction)
//! (a `Transaction` derefs to `Connection`).

pub mod assignments;
pub mod cursor;
pub mod messages;
pub mod orders;
pub mod packages;
pub mod tickets;
pub mod users;

use std::str::FromStr;

/// Read a text column and parse it into a strum-backed enum.
pub(crate) fn enum_col<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Collect mapped rows, converting the first failure into a storage error.
pub(crate) fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>, ordesk_core::OrdeskError> {
    rows.collect::<rusqlite::Result<Vec<T>>>()
        .map_err(crate::database::sql_err)
}
