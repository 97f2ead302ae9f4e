// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent directory: the pool of accounts tickets may be assigned to.

use ordesk_core::types::User;
use ordesk_core::{now_timestamp, AccountStatus, Agent, OrdeskError, UserRole};
use ordesk_storage::queries::users;
use ordesk_storage::Database;
use rusqlite::Connection;
use tracing::info;

/// Eligible agents ordered by id, or `NoEligibleAgents` when there are none.
///
/// Synchronous so it can run inside the checkout transaction.
pub fn eligible_agents(conn: &Connection) -> Result<Vec<Agent>, OrdeskError> {
    let agents = users::list_eligible_agents(conn)?;
    if agents.is_empty() {
        return Err(OrdeskError::NoEligibleAgents);
    }
    Ok(agents)
}

/// Read and provisioning access to support accounts.
#[derive(Clone)]
pub struct AgentDirectory {
    db: Database,
}

impl AgentDirectory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All active, support-capable accounts in ascending id order.
    pub async fn list_eligible_agents(&self) -> Result<Vec<Agent>, OrdeskError> {
        self.db.call(|conn| eligible_agents(conn)).await
    }

    /// Every support-capable account regardless of status.
    pub async fn list_all(&self) -> Result<Vec<User>, OrdeskError> {
        self.db
            .call(|conn| {
                let mut all = users::list(conn, None)?;
                all.retain(|u| u.role.is_support_capable());
                Ok(all)
            })
            .await
    }

    /// Create a support account, or update the name and role of an existing one.
    pub async fn add_agent(
        &self,
        id: &str,
        display_name: &str,
        role: UserRole,
    ) -> Result<User, OrdeskError> {
        if !role.is_support_capable() {
            return Err(OrdeskError::Validation(format!(
                "role `{role}` cannot handle support tickets"
            )));
        }
        if id.trim().is_empty() {
            return Err(OrdeskError::Validation("agent id must not be empty".into()));
        }
        let user = User {
            id: id.to_string(),
            display_name: display_name.to_string(),
            role,
            status: AccountStatus::Active,
            created_at: now_timestamp(),
        };
        let stored = user.clone();
        self.db.call(move |conn| users::upsert(conn, &stored)).await?;
        info!(agent_id = %user.id, role = %user.role, "agent provisioned");
        Ok(user)
    }

    /// Change an agent's status. Agents are never deleted, only suspended.
    pub async fn set_status(&self, id: &str, status: AccountStatus) -> Result<(), OrdeskError> {
        let agent_id = id.to_string();
        let found = self
            .db
            .call(move |conn| match users::get(conn, &agent_id)? {
                Some(user) if user.role.is_support_capable() => {
                    users::set_status(conn, &agent_id, status)
                }
                _ => Ok(false),
            })
            .await?;
        if !found {
            return Err(OrdeskError::AgentNotFound(id.to_string()));
        }
        info!(agent_id = id, %status, "agent status changed");
        Ok(())
    }
}
