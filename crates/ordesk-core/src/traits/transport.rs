// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-transport collaborator trait.
//!
//! The core only stores and forwards channel identifiers; it never
//! interprets their structure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OrdeskError;
use crate::traits::adapter::PluginAdapter;

/// Everything a transport needs to open a support channel for a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRequest {
    pub ticket_id: String,
    pub order_id: String,
    /// Brand, creator, and assigned agent.
    pub participants: Vec<String>,
}

/// Adapter for the external chat service hosting ticket conversations.
#[async_trait]
pub trait ChatTransport: PluginAdapter {
    /// Creates (or returns the existing) channel for a ticket.
    async fn create_channel(&self, request: &ChannelRequest) -> Result<String, OrdeskError>;

    async fn add_participant(&self, channel_id: &str, user_id: &str) -> Result<(), OrdeskError>;

    async fn remove_participant(&self, channel_id: &str, user_id: &str)
        -> Result<(), OrdeskError>;

    /// Posts a system-authored notice into the channel.
    async fn post_system_message(&self, channel_id: &str, body: &str) -> Result<(), OrdeskError>;
}
