// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ordesk agent` subcommands: local provisioning of support accounts.

use clap::Subcommand;
use ordesk_config::model::OrdeskConfig;
use ordesk_core::{AccountStatus, OrdeskError, StorageAdapter, UserRole};
use ordesk_desk::AgentDirectory;
use ordesk_storage::SqliteStorage;

#[derive(Subcommand, Debug)]
pub enum AgentAction {
    /// Create a support account, or update an existing one's name and role.
    Add {
        id: String,
        /// Display name (defaults to the id).
        #[arg(long)]
        name: Option<String>,
        /// agent, admin, or super_admin.
        #[arg(long, default_value = "agent")]
        role: UserRole,
    },
    /// Stop assigning new tickets to an agent.
    Suspend { id: String },
    /// Resume assigning tickets to an agent.
    Activate { id: String },
    /// List support accounts and their rotation eligibility.
    List,
}

pub async fn run_agent(config: &OrdeskConfig, action: AgentAction) -> Result<(), OrdeskError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let directory = AgentDirectory::new(storage.database()?.clone());

    let result = execute(&directory, action).await;
    storage.close().await?;
    result
}

async fn execute(directory: &AgentDirectory, action: AgentAction) -> Result<(), OrdeskError> {
    match action {
        AgentAction::Add { id, name, role } => {
            let name = name.unwrap_or_else(|| id.clone());
            let user = directory.add_agent(&id, &name, role).await?;
            println!("added {} ({}, {})", user.id, user.role, user.status);
        }
        AgentAction::Suspend { id } => {
            directory.set_status(&id, AccountStatus::Suspended).await?;
            println!("suspended {id}");
        }
        AgentAction::Activate { id } => {
            directory.set_status(&id, AccountStatus::Active).await?;
            println!("activated {id}");
        }
        AgentAction::List => {
            let accounts = directory.list_all().await?;
            if accounts.is_empty() {
                println!("no support accounts");
                return Ok(());
            }
            println!("  {:<24} {:<12} {:<10} {}", "ID", "ROLE", "STATUS", "IN ROTATION");
            for user in accounts {
                let in_rotation = ordesk_core::is_eligible(user.role, user.status);
                println!(
                    "  {:<24} {:<12} {:<10} {}",
                    user.id,
                    user.role.to_string(),
                    user.status.to_string(),
                    if in_rotation { "yes" } else { "no" }
                );
            }
        }
    }
    Ok(())
}
