// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across storage, services, and the gateway.
//!
//! Timestamps are ISO 8601 strings with millisecond precision
//! (`2026-01-01T00:00:00.000Z`), matching what the storage layer writes.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::OrdeskError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Current UTC time in the canonical timestamp format.
pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// The canonical timestamp `age` ago. Saturates at the earliest representable time.
pub fn timestamp_before(age: std::time::Duration) -> String {
    let now = chrono::Utc::now();
    chrono::TimeDelta::from_std(age)
        .ok()
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    ChatTransport,
    CrmSync,
}

// --- Accounts ---

/// Account role in the marketplace taxonomy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserRole {
    Brand,
    Creator,
    Agent,
    Admin,
    SuperAdmin,
}

impl UserRole {
    /// Roles that may be assigned support tickets.
    pub const SUPPORT_CAPABLE: [UserRole; 3] = [UserRole::Agent, UserRole::Admin, UserRole::SuperAdmin];

    pub fn is_support_capable(self) -> bool {
        Self::SUPPORT_CAPABLE.contains(&self)
    }
}

/// Account status. Accounts are never deleted, only moved out of `Active`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Suspended,
    Pending,
}

/// The single definition of "may receive ticket assignments".
pub fn is_eligible(role: UserRole, status: AccountStatus) -> bool {
    role.is_support_capable() && status == AccountStatus::Active
}

/// A marketplace account (brand, creator, or staff).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub role: UserRole,
    pub status: AccountStatus,
    pub created_at: String,
}

/// A support-capable account as seen by the agent directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub display_name: String,
    pub role: UserRole,
    pub status: AccountStatus,
}

impl Agent {
    pub fn is_eligible(&self) -> bool {
        is_eligible(self.role, self.status)
    }
}

impl From<User> for Agent {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            role: user.role,
            status: user.status,
        }
    }
}

// --- Catalog ---

/// A purchasable creator package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    /// Unit price in minor currency units.
    pub price: i64,
    pub currency: String,
    pub active: bool,
    pub created_at: String,
}

// --- Orders ---

/// Order fulfillment status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }
}

/// A persisted purchase of a package by a brand from a creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub package_id: String,
    pub brand_id: String,
    pub creator_id: String,
    pub quantity: u32,
    /// Total in minor currency units.
    pub total_amount: i64,
    pub currency: String,
    pub status: OrderStatus,
    pub created_at: String,
}

/// Caller-supplied order input, validated before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub package_id: String,
    pub brand_id: String,
    pub creator_id: String,
    pub quantity: u32,
    pub total_amount: i64,
    pub currency: String,
}

impl NewOrder {
    /// Shape and range checks. Reference resolution happens in storage.
    pub fn validate(&self) -> Result<(), OrdeskError> {
        let mut problems = Vec::new();
        if self.package_id.trim().is_empty() {
            problems.push("package_id must not be empty".to_string());
        }
        if self.brand_id.trim().is_empty() {
            problems.push("brand_id must not be empty".to_string());
        }
        if self.creator_id.trim().is_empty() {
            problems.push("creator_id must not be empty".to_string());
        }
        if self.quantity < 1 {
            problems.push(format!("quantity must be at least 1, got {}", self.quantity));
        }
        if self.total_amount < 0 {
            problems.push(format!(
                "total_amount must be non-negative, got {}",
                self.total_amount
            ));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            problems.push(format!(
                "currency must be a 3-letter ISO code, got `{}`",
                self.currency
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(OrdeskError::Validation(problems.join("; ")))
        }
    }
}

// --- Tickets ---

/// Ticket state machine: `open -> in_progress -> resolved -> closed`,
/// plus `-> closed` from any non-closed state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn is_closed(self) -> bool {
        self == TicketStatus::Closed
    }

    /// Whether `self -> next` is a legal forward move.
    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        match (self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (Open, InProgress) | (InProgress, Resolved) => true,
            _ => false,
        }
    }
}

/// The support-conversation anchor for exactly one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub order_id: String,
    pub assigned_agent_id: String,
    pub status: TicketStatus,
    /// Opaque handle owned by the chat-transport collaborator.
    pub channel_id: String,
    /// True while `channel_id` is a placeholder awaiting backfill.
    pub channel_pending: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// An order together with its ticket, as returned by checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTicket {
    pub order: Order,
    pub ticket: Ticket,
}

/// Why an agent was put on a ticket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssignmentReason {
    RoundRobin,
    /// Agent chosen explicitly when the ticket was created.
    Manual,
    Reassigned,
}

/// One row of a ticket's assignment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id: i64,
    pub ticket_id: String,
    pub agent_id: String,
    pub reason: AssignmentReason,
    /// Pre-increment cursor value for round-robin assignments.
    pub slot: Option<i64>,
    pub assigned_at: String,
}

// --- Conversation ---

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SenderRole {
    Brand,
    Creator,
    Agent,
    System,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageKind {
    Text,
    File,
    System,
}

/// One immutable entry in a ticket's conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Insertion sequence; breaks ties between equal timestamps.
    pub seq: i64,
    pub id: String,
    pub ticket_id: String,
    pub sender_id: String,
    pub sender_role: SenderRole,
    pub body: String,
    pub attachment: Option<String>,
    pub kind: MessageKind,
    pub created_at: String,
}

/// Input for appending to a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub sender_id: String,
    pub sender_role: SenderRole,
    pub body: String,
    #[serde(default)]
    pub attachment: Option<String>,
    pub kind: MessageKind,
}

impl NewMessage {
    /// A system-authored text entry.
    pub fn system(body: impl Into<String>) -> Self {
        Self {
            sender_id: "system".to_string(),
            sender_role: SenderRole::System,
            body: body.into(),
            attachment: None,
            kind: MessageKind::System,
        }
    }
}
