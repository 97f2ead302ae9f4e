// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRM synchronization.
//!
//! [`CrmSyncWorker`] listens on the event bus and forwards ticket events to
//! a [`CrmSync`] adapter in the background. CRM failures are logged and
//! dropped; they never reach the order/ticket path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ordesk_bus::{BusEvent, DeskEvent, EventBus};
use ordesk_core::{
    AdapterType, CrmSync, HealthStatus, OrdeskError, PluginAdapter, TicketStatus, TicketSyncEvent,
    TicketSyncKind,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Translate a bus event into the CRM's view. Conversation and channel
/// events are not synced.
pub fn to_sync_event(event: &BusEvent) -> Option<TicketSyncEvent> {
    let occurred_at = event.timestamp.clone();
    match &event.payload {
        DeskEvent::TicketCreated {
            ticket_id,
            order_id,
            agent_id,
            ..
        } => Some(TicketSyncEvent {
            kind: TicketSyncKind::Created,
            ticket_id: ticket_id.clone(),
            order_id: order_id.clone(),
            agent_id: agent_id.clone(),
            status: TicketStatus::Open,
            occurred_at,
        }),
        DeskEvent::TicketReassigned {
            ticket_id,
            order_id,
            to_agent,
            status,
            ..
        } => Some(TicketSyncEvent {
            kind: TicketSyncKind::Reassigned,
            ticket_id: ticket_id.clone(),
            order_id: order_id.clone(),
            agent_id: to_agent.clone(),
            status: *status,
            occurred_at,
        }),
        DeskEvent::TicketStatusChanged {
            ticket_id,
            order_id,
            agent_id,
            to,
            ..
        } => Some(TicketSyncEvent {
            kind: if to.is_closed() {
                TicketSyncKind::Closed
            } else {
                TicketSyncKind::StatusChanged
            },
            ticket_id: ticket_id.clone(),
            order_id: order_id.clone(),
            agent_id: agent_id.clone(),
            status: *to,
            occurred_at,
        }),
        DeskEvent::MessageAppended { .. } | DeskEvent::ChannelAttached { .. } => None,
    }
}

/// Background forwarder from the bus to a CRM adapter.
pub struct CrmSyncWorker {
    crm: Arc<dyn CrmSync>,
}

impl CrmSyncWorker {
    pub fn new(crm: Arc<dyn CrmSync>) -> Self {
        Self { crm }
    }

    /// Subscribe now and forward events until `cancel` fires.
    ///
    /// The subscription is taken before the task starts, so events published
    /// after this call returns are never missed.
    pub fn spawn(self, bus: &EventBus, cancel: CancellationToken) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            info!(crm = self.crm.name(), "crm sync worker started");
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = rx.recv() => match received {
                        Ok(event) => event,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "crm sync worker lagged, events dropped");
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    },
                };
                self.forward(&event).await;
            }
            debug!("crm sync worker stopped");
        })
    }

    async fn forward(&self, event: &BusEvent) {
        let Some(sync) = to_sync_event(event) else {
            return;
        };
        match self.crm.sync_ticket_event(&sync).await {
            Ok(()) => debug!(ticket_id = %sync.ticket_id, kind = %sync.kind, "crm synced"),
            Err(e) => warn!(
                ticket_id = %sync.ticket_id,
                kind = %sync.kind,
                error = %e,
                "crm sync failed"
            ),
        }
    }
}

/// Posts each [`TicketSyncEvent`] as JSON to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookCrm {
    client: reqwest::Client,
    url: String,
}

impl WebhookCrm {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, OrdeskError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OrdeskError::Crm {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for WebhookCrm {
    fn name(&self) -> &str {
        "webhook"
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
impl CrmSync for WebhookCrm {
    async fn sync_ticket_event(&self, event: &TicketSyncEvent) -> Result<(), OrdeskError> {
        let response = self
            .client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(|e| OrdeskError::Crm {
                message: format!("webhook request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(OrdeskError::Crm {
            message: format!("webhook returned {status}: {body}"),
            source: None,
        })
    }
}

/// CRM adapter used when syncing is disabled.
#[derive(Debug, Default, Clone)]
pub struct NoopCrm;

#[async_trait]
impl PluginAdapter for NoopCrm {
    fn name(&self) -> &str {
        "noop"
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
impl CrmSync for NoopCrm {
    async fn sync_ticket_event(&self, _event: &TicketSyncEvent) -> Result<(), OrdeskError> {
        Ok(())
    }
}
