// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Ordesk.
//!
//! Provides the domain types (orders, tickets, agents, messages), the error
//! taxonomy, and the collaborator traits that storage, chat transport, and
//! CRM adapters implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::OrdeskError;
pub use types::{
    is_eligible, now_timestamp, timestamp_before, AccountStatus, AdapterType, Agent, HealthStatus, Message,
    MessageKind, NewMessage, NewOrder, Order, OrderStatus, OrderTicket, SenderRole, Ticket,
    TicketStatus, UserRole,
};

pub use traits::{
    ChannelRequest, ChatTransport, CrmSync, PluginAdapter, StorageAdapter, TicketSyncEvent,
    TicketSyncKind,
};
