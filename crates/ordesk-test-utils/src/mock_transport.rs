// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat transport for deterministic testing.
//!
//! `MockTransport` implements `ChatTransport`, captures every call for
//! assertions, and can be switched to fail or to hang on channel creation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ordesk_core::{
    AdapterType, ChannelRequest, ChatTransport, HealthStatus, OrdeskError, PluginAdapter,
};

/// A participant change observed by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantChange {
    Added { channel_id: String, user_id: String },
    Removed { channel_id: String, user_id: String },
}

/// A mock chat service.
///
/// Channel ids are `mock-<ticket_id>`.
#[derive(Default)]
pub struct MockTransport {
    failing: AtomicBool,
    stalled: AtomicBool,
    channels: Mutex<Vec<ChannelRequest>>,
    participants: Mutex<Vec<ParticipantChange>>,
    notices: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel_id_for(ticket_id: &str) -> String {
        format!("mock-{ticket_id}")
    }

    /// Make every call return a channel error until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make `create_channel` hang until switched back.
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    /// Successful channel creations, in call order.
    pub async fn created_channels(&self) -> Vec<ChannelRequest> {
        self.channels.lock().await.clone()
    }

    pub async fn participant_changes(&self) -> Vec<ParticipantChange> {
        self.participants.lock().await.clone()
    }

    /// `(channel_id, body)` for every system notice posted.
    pub async fn notices(&self) -> Vec<(String, String)> {
        self.notices.lock().await.clone()
    }

    fn check(&self) -> Result<(), OrdeskError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(OrdeskError::Channel {
                message: "mock transport is failing".into(),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ChatTransport
    }

    async fn health_check(&self) -> Result<HealthStatus, OrdeskError> {
        if self.failing.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("failing".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), OrdeskError> {
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn create_channel(&self, request: &ChannelRequest) -> Result<String, OrdeskError> {
        while self.stalled.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.check()?;
        self.channels.lock().await.push(request.clone());
        Ok(Self::channel_id_for(&request.ticket_id))
    }

    async fn add_participant(&self, channel_id: &str, user_id: &str) -> Result<(), OrdeskError> {
        self.check()?;
        self.participants.lock().await.push(ParticipantChange::Added {
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
        });
        Ok(())
    }

    async fn remove_participant(&self, channel_id: &str, user_id: &str) -> Result<(), OrdeskError> {
        self.check()?;
        self.participants.lock().await.push(ParticipantChange::Removed {
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
        });
        Ok(())
    }

    async fn post_system_message(&self, channel_id: &str, body: &str) -> Result<(), OrdeskError> {
        self.check()?;
        self.notices
            .lock()
            .await
            .push((channel_id.to_string(), body.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChannelRequest {
        ChannelRequest {
            ticket_id: "t-1".into(),
            order_id: "o-1".into(),
            participants: vec!["brand-1".into()],
        }
    }

    #[tokio::test]
    async fn records_created_channels() {
        let transport = MockTransport::new();
        let id = transport.create_channel(&request()).await.unwrap();
        assert_eq!(id, "mock-t-1");
        assert_eq!(transport.created_channels().await.len(), 1);
    }

    #[tokio::test]
    async fn failing_mode_rejects_and_records_nothing() {
        let transport = MockTransport::new();
        transport.set_failing(true);
        assert!(transport.create_channel(&request()).await.is_err());
        assert!(transport.post_system_message("c", "hi").await.is_err());
        assert!(transport.created_channels().await.is_empty());
        assert_eq!(
            transport.health_check().await.unwrap(),
            HealthStatus::Unhealthy("failing".into())
        );
    }

    #[tokio::test]
    async fn stalled_create_channel_times_out() {
        let transport = MockTransport::new();
        transport.set_stalled(true);
        let result =
            tokio::time::timeout(Duration::from_millis(50), transport.create_channel(&request()))
                .await;
        assert!(result.is_err());
    }
}
