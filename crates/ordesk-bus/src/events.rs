// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event payloads carried on the bus.

use ordesk_core::TicketStatus;
use serde::{Deserialize, Serialize};

/// Envelope stamped by [`EventBus::publish`](crate::EventBus::publish).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEvent {
    pub event_id: String,
    pub timestamp: String,
    pub payload: DeskEvent,
}

/// Something that happened to a ticket after its transaction committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    TicketCreated {
        ticket_id: String,
        order_id: String,
        agent_id: String,
        /// Round-robin slot, absent for manual assignment.
        slot: Option<i64>,
    },
    TicketStatusChanged {
        ticket_id: String,
        order_id: String,
        agent_id: String,
        from: TicketStatus,
        to: TicketStatus,
    },
    TicketReassigned {
        ticket_id: String,
        order_id: String,
        from_agent: String,
        to_agent: String,
        status: TicketStatus,
    },
    MessageAppended {
        ticket_id: String,
        message_id: String,
        seq: i64,
    },
    ChannelAttached {
        ticket_id: String,
        channel_id: String,
    },
}

impl DeskEvent {
    /// The ticket every event refers to.
    pub fn ticket_id(&self) -> &str {
        match self {
            DeskEvent::TicketCreated { ticket_id, .. }
            | DeskEvent::TicketStatusChanged { ticket_id, .. }
            | DeskEvent::TicketReassigned { ticket_id, .. }
            | DeskEvent::MessageAppended { ticket_id, .. }
            | DeskEvent::ChannelAttached { ticket_id, .. } => ticket_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DeskEvent::TicketCreated { .. } => "ticket_created",
            DeskEvent::TicketStatusChanged { .. } => "ticket_status_changed",
            DeskEvent::TicketReassigned { .. } => "ticket_reassigned",
            DeskEvent::MessageAppended { .. } => "message_appended",
            DeskEvent::ChannelAttached { .. } => "channel_attached",
        }
    }
}
