// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRM sink that records every synced ticket event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use ordesk_core::{
    AdapterType, CrmSync, HealthStatus, OrdeskError, PluginAdapter, TicketSyncEvent,
};

#[derive(Default)]
pub struct RecordingCrm {
    failing: AtomicBool,
    events: Mutex<Vec<TicketSyncEvent>>,
    notify: Notify,
}

impl RecordingCrm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn events(&self) -> Vec<TicketSyncEvent> {
        self.events.lock().await.clone()
    }

    /// Wait until at least `count` events arrived, or `timeout` elapsed.
    /// Returns whatever was recorded.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<TicketSyncEvent> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            {
                let events = self.events.lock().await;
                if events.len() >= count {
                    return events.clone();
                }
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.events().await;
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for RecordingCrm {
    fn name(&self) -> &str {
        "recording-crm"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::CrmSync
    }

    async fn health_check(&self) -> Result<HealthStatus, OrdeskError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), OrdeskError> {
        Ok(())
    }
}

#[async_trait]
impl CrmSync for RecordingCrm {
    async fn sync_ticket_event(&self, event: &TicketSyncEvent) -> Result<(), OrdeskError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(OrdeskError::Crm {
                message: "recording crm is failing".into(),
                source: None,
            });
        }
        self.events.lock().await.push(event.clone());
        self.notify.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordesk_core::{TicketStatus, TicketSyncKind};

    fn event() -> TicketSyncEvent {
        TicketSyncEvent {
            kind: TicketSyncKind::Created,
            ticket_id: "t-1".into(),
            order_id: "o-1".into(),
            agent_id: "agent-a".into(),
            status: TicketStatus::Open,
            occurred_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[tokio::test]
    async fn wait_for_returns_once_enough_events_arrive() {
        let crm = std::sync::Arc::new(RecordingCrm::new());
        let writer = crm.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.sync_ticket_event(&event()).await.unwrap();
        });
        let events = crm.wait_for(1, Duration::from_secs(2)).await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn wait_for_gives_up_after_timeout() {
        let crm = RecordingCrm::new();
        let events = crm.wait_for(1, Duration::from_millis(30)).await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn failing_mode_drops_events() {
        let crm = RecordingCrm::new();
        crm.set_failing(true);
        assert!(crm.sync_ticket_event(&event()).await.is_err());
        assert!(crm.events().await.is_empty());
    }
}
