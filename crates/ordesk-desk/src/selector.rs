// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Round-robin agent selection over the persisted assignment cursor.
//!
//! The cursor lives in SQLite and is advanced with a single upsert on the
//! writer thread, so concurrent checkouts can never observe the same slot.

use ordesk_core::{Agent, OrdeskError};
use ordesk_storage::queries::cursor;
use ordesk_storage::Database;
use rusqlite::Connection;
use tracing::debug;

use crate::directory;

/// Agent for `slot` given the directory order. Pure.
pub fn pick(agents: &[Agent], slot: i64) -> Result<&Agent, OrdeskError> {
    if agents.is_empty() {
        return Err(OrdeskError::NoEligibleAgents);
    }
    let index = slot.rem_euclid(agents.len() as i64) as usize;
    Ok(&agents[index])
}

#[derive(Debug, Clone)]
pub struct RoundRobinSelector {
    cursor_name: String,
}

impl RoundRobinSelector {
    pub fn new(cursor_name: impl Into<String>) -> Self {
        Self {
            cursor_name: cursor_name.into(),
        }
    }

    pub fn cursor_name(&self) -> &str {
        &self.cursor_name
    }

    /// Advance the cursor and pick the agent for the pre-increment slot.
    ///
    /// Must run on the writer connection, normally inside the caller's
    /// transaction so a rollback also rolls the cursor back.
    pub fn select_next(
        &self,
        conn: &Connection,
        agents: &[Agent],
    ) -> Result<(Agent, i64), OrdeskError> {
        if agents.is_empty() {
            return Err(OrdeskError::NoEligibleAgents);
        }
        let slot = cursor::advance(conn, &self.cursor_name)?;
        let agent = pick(agents, slot)?.clone();
        debug!(slot, agent_id = %agent.id, pool = agents.len(), "round-robin pick");
        Ok((agent, slot))
    }

    /// Resolve the directory and select in one transaction.
    pub async fn select_next_agent(&self, db: &Database) -> Result<(Agent, i64), OrdeskError> {
        let selector = self.clone();
        db.transaction(move |tx| {
            let agents = directory::eligible_agents(tx)?;
            selector.select_next(tx, &agents)
        })
        .await
    }

    /// Current cursor value without advancing it.
    pub async fn position(&self, db: &Database) -> Result<i64, OrdeskError> {
        let name = self.cursor_name.clone();
        db.call(move |conn| cursor::peek(conn, &name)).await
    }
}
