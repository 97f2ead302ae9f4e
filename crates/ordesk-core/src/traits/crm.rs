// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRM-sync collaborator trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::OrdeskError;
use crate::traits::adapter::PluginAdapter;
use crate::types::TicketStatus;

/// Ticket lifecycle moments the CRM is told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TicketSyncKind {
    Created,
    Reassigned,
    StatusChanged,
    Closed,
}

/// Payload forwarded to the CRM for bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSyncEvent {
    pub kind: TicketSyncKind,
    pub ticket_id: String,
    pub order_id: String,
    pub agent_id: String,
    pub status: TicketStatus,
    pub occurred_at: String,
}

/// Adapter for external relationship-management bookkeeping.
///
/// Calls are best-effort: callers log failures and never roll back
/// core state because of them.
#[async_trait]
pub trait CrmSync: PluginAdapter {
    async fn sync_ticket_event(&self, event: &TicketSyncEvent) -> Result<(), OrdeskError>;
}
