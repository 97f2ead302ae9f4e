// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process chat transport for deployments without an external chat service.

use async_trait::async_trait;
use ordesk_core::{
    AdapterType, ChannelRequest, ChatTransport, HealthStatus, OrdeskError, PluginAdapter,
};
use tracing::debug;

/// Derives `ticket-<ticket_id>` channel ids and accepts every membership change.
///
/// The conversation log is the source of truth either way; this transport
/// only gives tickets a stable channel handle.
#[derive(Debug, Default, Clone)]
pub struct LoopbackTransport;

impl LoopbackTransport {
    pub fn new() -> Self {
        Self
    }

    pub fn channel_id_for(ticket_id: &str) -> String {
        format!("ticket-{ticket_id}")
    }
}

#[async_trait]
impl PluginAdapter for LoopbackTransport {
    fn name(&self) -> &str {
        "loopback"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ChatTransport
    }

    async fn health_check(&self) -> Result<HealthStatus, OrdeskError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), OrdeskError> {
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for LoopbackTransport {
    async fn create_channel(&self, request: &ChannelRequest) -> Result<String, OrdeskError> {
        let channel_id = Self::channel_id_for(&request.ticket_id);
        debug!(
            ticket_id = %request.ticket_id,
            channel_id = %channel_id,
            participants = request.participants.len(),
            "loopback channel created"
        );
        Ok(channel_id)
    }

    async fn add_participant(&self, channel_id: &str, user_id: &str) -> Result<(), OrdeskError> {
        debug!(channel_id, user_id, "loopback participant added");
        Ok(())
    }

    async fn remove_participant(&self, channel_id: &str, user_id: &str) -> Result<(), OrdeskError> {
        debug!(channel_id, user_id, "loopback participant removed");
        Ok(())
    }

    async fn post_system_message(&self, channel_id: &str, body: &str) -> Result<(), OrdeskError> {
        debug!(channel_id, body, "loopback system message");
        Ok(())
    }
}
