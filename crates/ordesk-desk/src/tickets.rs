// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket lifecycle: creation, forward-only status transitions, and
//! reassignment.
//!
//! Every mutation commits first, then publishes a [`DeskEvent`] and
//! notifies the chat channel on a best-effort basis.

use std::sync::Arc;
use std::time::Duration;

use ordesk_bus::{DeskEvent, EventBus};
use ordesk_core::types::{AssignmentReason, AssignmentRecord};
use ordesk_core::{
    now_timestamp, Agent, ChatTransport, Message, NewMessage, OrdeskError, Order, Ticket,
    TicketStatus,
};
use ordesk_storage::queries::{assignments, orders, tickets, users};
use ordesk_storage::Database;
use rusqlite::Connection;
use tracing::info;

use crate::channels::best_effort;
use crate::conversation::ConversationLog;

/// Insert an open ticket for `order` assigned to `agent` and record the
/// assignment. Runs inside the caller's transaction.
pub fn open_ticket(
    conn: &Connection,
    order: &Order,
    agent: &Agent,
    channel_id: &str,
    channel_pending: bool,
    slot: Option<i64>,
) -> Result<Ticket, OrdeskError> {
    let now = now_timestamp();
    let ticket = Ticket {
        id: uuid::Uuid::new_v4().to_string(),
        order_id: order.id.clone(),
        assigned_agent_id: agent.id.clone(),
        status: TicketStatus::Open,
        channel_id: channel_id.to_string(),
        channel_pending,
        created_at: now.clone(),
        updated_at: now.clone(),
    };
    tickets::insert(conn, &ticket)?;
    let reason = if slot.is_some() {
        AssignmentReason::RoundRobin
    } else {
        AssignmentReason::Manual
    };
    assignments::record(conn, &ticket.id, &agent.id, reason, slot, &now)?;
    Ok(ticket)
}

fn load_ticket(conn: &Connection, ticket_id: &str) -> Result<Ticket, OrdeskError> {
    tickets::get(conn, ticket_id)?.ok_or_else(|| OrdeskError::TicketNotFound(ticket_id.to_string()))
}

/// Resolve `agent_id` to an account that may hold tickets right now.
fn eligible_agent(conn: &Connection, agent_id: &str) -> Result<Agent, OrdeskError> {
    let user = users::get(conn, agent_id)?
        .filter(|u| u.role.is_support_capable())
        .ok_or_else(|| OrdeskError::AgentNotFound(agent_id.to_string()))?;
    let agent = Agent::from(user);
    if !agent.is_eligible() {
        return Err(OrdeskError::Validation(format!(
            "agent {agent_id} is {} and cannot take tickets",
            agent.status
        )));
    }
    Ok(agent)
}

#[derive(Clone)]
pub struct TicketService {
    db: Database,
    bus: EventBus,
    conversation: ConversationLog,
    transport: Arc<dyn ChatTransport>,
    collaborator_timeout: Duration,
}

impl TicketService {
    pub fn new(
        db: Database,
        bus: EventBus,
        transport: Arc<dyn ChatTransport>,
        collaborator_timeout: Duration,
    ) -> Self {
        Self {
            conversation: ConversationLog::new(db.clone(), bus.clone()),
            db,
            bus,
            transport,
            collaborator_timeout,
        }
    }

    pub fn conversation(&self) -> &ConversationLog {
        &self.conversation
    }

    /// Create the ticket for an existing order with an explicitly chosen agent.
    ///
    /// Fails with `DuplicateTicket` when the order already has one.
    pub async fn create_ticket(
        &self,
        order_id: &str,
        agent_id: &str,
        channel_id: &str,
    ) -> Result<Ticket, OrdeskError> {
        let (order_id, agent_id, channel_id) =
            (order_id.to_string(), agent_id.to_string(), channel_id.to_string());
        let ticket = self
            .db
            .transaction(move |tx| {
                let order = orders::get(tx, &order_id)?
                    .ok_or_else(|| OrdeskError::OrderNotFound(order_id.clone()))?;
                let agent = eligible_agent(tx, &agent_id)?;
                open_ticket(tx, &order, &agent, &channel_id, false, None)
            })
            .await?;

        info!(
            ticket_id = %ticket.id,
            order_id = %ticket.order_id,
            agent_id = %ticket.assigned_agent_id,
            "ticket created with manual assignment"
        );
        self.bus.publish(DeskEvent::TicketCreated {
            ticket_id: ticket.id.clone(),
            order_id: ticket.order_id.clone(),
            agent_id: ticket.assigned_agent_id.clone(),
            slot: None,
        });
        Ok(ticket)
    }

    pub async fn get(&self, ticket_id: &str) -> Result<Ticket, OrdeskError> {
        let id = ticket_id.to_string();
        self.db.call(move |conn| load_ticket(conn, &id)).await
    }

    pub async fn get_by_order(&self, order_id: &str) -> Result<Ticket, OrdeskError> {
        let id = order_id.to_string();
        self.db
            .call(move |conn| {
                tickets::get_by_order(conn, &id)?
                    .ok_or_else(|| OrdeskError::TicketNotFound(format!("for order {id}")))
            })
            .await
    }

    /// Tickets assigned to an agent, newest first, optionally by status.
    pub async fn list_for_agent(
        &self,
        agent_id: &str,
        status: Option<TicketStatus>,
    ) -> Result<Vec<Ticket>, OrdeskError> {
        let id = agent_id.to_string();
        self.db
            .call(move |conn| {
                if users::get(conn, &id)?.is_none() {
                    return Err(OrdeskError::AgentNotFound(id));
                }
                tickets::list_for_agent(conn, &id, status)
            })
            .await
    }

    /// Every agent the ticket has been assigned to, oldest first.
    pub async fn assignment_history(
        &self,
        ticket_id: &str,
    ) -> Result<Vec<AssignmentRecord>, OrdeskError> {
        let id = ticket_id.to_string();
        self.db
            .call(move |conn| {
                load_ticket(conn, &id)?;
                assignments::history(conn, &id)
            })
            .await
    }

    /// Move the ticket forward. `-> closed` is allowed from any open state.
    pub async fn transition_status(
        &self,
        ticket_id: &str,
        next: TicketStatus,
    ) -> Result<Ticket, OrdeskError> {
        let id = ticket_id.to_string();
        let (ticket, from) = self
            .db
            .transaction(move |tx| {
                let mut ticket = load_ticket(tx, &id)?;
                let from = ticket.status;
                if !from.can_transition_to(next) {
                    return Err(OrdeskError::InvalidTransition { from, to: next });
                }
                let now = now_timestamp();
                tickets::update_status(tx, &id, next, &now)?;
                ticket.status = next;
                ticket.updated_at = now;
                Ok((ticket, from))
            })
            .await?;

        info!(
            ticket_id = %ticket.id,
            order_id = %ticket.order_id,
            from = %from,
            to = %next,
            "ticket status changed"
        );
        self.bus.publish(DeskEvent::TicketStatusChanged {
            ticket_id: ticket.id.clone(),
            order_id: ticket.order_id.clone(),
            agent_id: ticket.assigned_agent_id.clone(),
            from,
            to: next,
        });

        if !ticket.channel_pending {
            let notice = format!("Ticket status changed from {from} to {next}.");
            best_effort(
                "status notice",
                &ticket.id,
                self.collaborator_timeout,
                self.transport.post_system_message(&ticket.channel_id, &notice),
            )
            .await;
        }
        Ok(ticket)
    }

    /// Hand the ticket to another eligible agent.
    ///
    /// Reassigning to the current agent returns the ticket unchanged.
    pub async fn reassign(&self, ticket_id: &str, agent_id: &str) -> Result<Ticket, OrdeskError> {
        let (id, target) = (ticket_id.to_string(), agent_id.to_string());
        let (ticket, previous) = self
            .db
            .transaction(move |tx| {
                let mut ticket = load_ticket(tx, &id)?;
                if ticket.status.is_closed() {
                    return Err(OrdeskError::TicketClosed { ticket_id: id });
                }
                let agent = eligible_agent(tx, &target)?;
                if agent.id == ticket.assigned_agent_id {
                    return Ok((ticket, None));
                }
                let now = now_timestamp();
                tickets::update_assignee(tx, &id, &agent.id, &now)?;
                assignments::record(tx, &id, &agent.id, AssignmentReason::Reassigned, None, &now)?;
                let previous = std::mem::replace(&mut ticket.assigned_agent_id, agent.id);
                ticket.updated_at = now;
                Ok((ticket, Some(previous)))
            })
            .await?;

        let Some(previous) = previous else {
            return Ok(ticket);
        };

        info!(
            ticket_id = %ticket.id,
            from_agent = %previous,
            agent_id = %ticket.assigned_agent_id,
            "ticket reassigned"
        );
        self.bus.publish(DeskEvent::TicketReassigned {
            ticket_id: ticket.id.clone(),
            order_id: ticket.order_id.clone(),
            from_agent: previous.clone(),
            to_agent: ticket.assigned_agent_id.clone(),
            status: ticket.status,
        });

        if !ticket.channel_pending {
            let limit = self.collaborator_timeout;
            let channel = ticket.channel_id.as_str();
            best_effort(
                "add participant",
                &ticket.id,
                limit,
                self.transport.add_participant(channel, &ticket.assigned_agent_id),
            )
            .await;
            best_effort(
                "remove participant",
                &ticket.id,
                limit,
                self.transport.remove_participant(channel, &previous),
            )
            .await;
            best_effort(
                "reassignment notice",
                &ticket.id,
                limit,
                self.transport.post_system_message(
                    channel,
                    &format!("Ticket reassigned to {}.", ticket.assigned_agent_id),
                ),
            )
            .await;
        }
        Ok(ticket)
    }

    /// Add to the ticket's conversation. Does not change ticket status.
    pub async fn append_message(
        &self,
        ticket_id: &str,
        message: NewMessage,
    ) -> Result<Message, OrdeskError> {
        self.conversation.append(ticket_id, message).await
    }
}
