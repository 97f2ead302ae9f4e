// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for the order/ticket core.

use thiserror::Error;

use crate::types::TicketStatus;

/// The primary error type used across Ordesk services, storage, and adapters.
#[derive(Debug, Error)]
pub enum OrdeskError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Input failed shape, range, or reference validation. Nothing was persisted.
    #[error("validation error: {0}")]
    Validation(String),

    /// The agent directory is empty; no ticket can be assigned.
    #[error("no eligible support agents are available")]
    NoEligibleAgents,

    /// The order already has a ticket (unique constraint on `tickets.order_id`).
    #[error("order {order_id} already has a ticket")]
    DuplicateTicket { order_id: String },

    /// A checkout for the same cart item was submitted again inside the guard window.
    #[error("duplicate checkout for package {package_id} by brand {brand_id}")]
    DuplicateOrder {
        brand_id: String,
        package_id: String,
    },

    /// The requested status change does not move the ticket forward.
    #[error("invalid ticket transition from {from} to {to}")]
    InvalidTransition {
        from: TicketStatus,
        to: TicketStatus,
    },

    /// The ticket is closed and can no longer be reassigned.
    #[error("ticket {ticket_id} is closed")]
    TicketClosed { ticket_id: String },

    #[error("ticket not found: {0}")]
    TicketNotFound(String),

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat-transport collaborator errors.
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// CRM-sync collaborator errors.
    #[error("crm sync error: {message}")]
    Crm {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OrdeskError {
    /// Whether a caller may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrdeskError::NoEligibleAgents
                | OrdeskError::Storage { .. }
                | OrdeskError::Timeout { .. }
        )
    }

    /// Whether the error originated in an external collaborator (chat, CRM).
    ///
    /// Collaborator errors are logged and swallowed on the order/ticket path.
    pub fn is_collaborator(&self) -> bool {
        matches!(
            self,
            OrdeskError::Channel { .. } | OrdeskError::Crm { .. } | OrdeskError::Timeout { .. }
        )
    }

    /// Reference errors (unknown ticket, order, or agent).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            OrdeskError::TicketNotFound(_)
                | OrdeskError::OrderNotFound(_)
                | OrdeskError::AgentNotFound(_)
        )
    }
}
