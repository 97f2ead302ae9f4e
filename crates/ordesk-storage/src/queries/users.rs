// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account queries, including the agent directory lookup.

use ordesk_core::types::User;
use ordesk_core::{AccountStatus, Agent, OrdeskError, UserRole};
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::sql_err;
use crate::queries::{collect_rows, enum_col};

const USER_COLUMNS: &str = "id, display_name, role, status, created_at";

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        display_name: row.get(1)?,
        role: enum_col(row, 2)?,
        status: enum_col(row, 3)?,
        created_at: row.get(4)?,
    })
}

/// Insert an account, or update its name, role, and status if it exists.
pub fn upsert(conn: &Connection, user: &User) -> Result<(), OrdeskError> {
    conn.execute(
        "INSERT INTO users (id, display_name, role, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (id) DO UPDATE SET
             display_name = excluded.display_name,
             role = excluded.role,
             status = excluded.status",
        params![
            user.id,
            user.display_name,
            user.role.to_string(),
            user.status.to_string(),
            user.created_at,
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<User>, OrdeskError> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        row_to_user,
    )
    .optional()
    .map_err(sql_err)
}

/// Change an account's status. Returns false when the account does not exist.
pub fn set_status(conn: &Connection, id: &str, status: AccountStatus) -> Result<bool, OrdeskError> {
    let changed = conn
        .execute(
            "UPDATE users SET status = ?1 WHERE id = ?2",
            params![status.to_string(), id],
        )
        .map_err(sql_err)?;
    Ok(changed > 0)
}

/// List accounts ordered by id, optionally restricted to one role.
pub fn list(conn: &Connection, role: Option<UserRole>) -> Result<Vec<User>, OrdeskError> {
    let role = role.map(|r| r.to_string());
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE (?1 IS NULL OR role = ?1)
             ORDER BY id ASC"
        ))
        .map_err(sql_err)?;
    let rows = stmt.query_map(params![role], row_to_user).map_err(sql_err)?;
    collect_rows(rows)
}

/// Support-capable accounts that pass [`ordesk_core::is_eligible`], ascending by id.
///
/// The id ordering is what the round-robin selector indexes into; it must
/// stay stable across calls.
pub fn list_eligible_agents(conn: &Connection) -> Result<Vec<Agent>, OrdeskError> {
    let roles = UserRole::SUPPORT_CAPABLE
        .iter()
        .map(|role| format!("'{role}'"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE role IN ({roles}) AND status = 'active'
             ORDER BY id ASC"
        ))
        .map_err(sql_err)?;
    let rows = stmt.query_map([], row_to_user).map_err(sql_err)?;
    let agents = collect_rows(rows)?
        .into_iter()
        .map(Agent::from)
        .filter(Agent::is_eligible)
        .collect();
    Ok(agents)
}
