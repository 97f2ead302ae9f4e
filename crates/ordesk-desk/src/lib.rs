// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core services for Ordesk: the agent directory, round-robin selection,
//! ticket lifecycle, order-to-ticket orchestration, the conversation log,
//! and the chat and CRM collaborators around them.

pub mod channels;
pub mod conversation;
pub mod crm;
pub mod directory;
pub mod orchestrator;
pub mod selector;
pub mod tickets;
pub mod transport;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use ordesk_bus::EventBus;
use ordesk_config::model::{CrmConfig, OrdeskConfig};
use ordesk_core::{ChatTransport, CrmSync, OrdeskError};
use ordesk_storage::Database;

pub use channels::{BackfillReport, ChannelBackfill, ChannelProvisioner};
pub use conversation::ConversationLog;
pub use crm::{CrmSyncWorker, NoopCrm, WebhookCrm};
pub use directory::AgentDirectory;
pub use orchestrator::{OrchestratorSettings, OrderOrchestrator};
pub use selector::RoundRobinSelector;
pub use tickets::TicketService;
pub use transport::LoopbackTransport;

/// Every desk service wired to one database, bus, and chat transport.
#[derive(Clone)]
pub struct Desk {
    pub db: Database,
    pub bus: EventBus,
    pub directory: AgentDirectory,
    pub selector: RoundRobinSelector,
    pub tickets: TicketService,
    pub conversation: ConversationLog,
    pub orchestrator: OrderOrchestrator,
    pub channels: ChannelProvisioner,
}

impl Desk {
    pub fn new(
        config: &OrdeskConfig,
        db: Database,
        bus: EventBus,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        let timeout = Duration::from_millis(config.chat.channel_timeout_ms);
        let selector = RoundRobinSelector::new(config.assignment.cursor_name.clone());
        let channels = ChannelProvisioner::new(db.clone(), bus.clone(), transport.clone(), timeout);
        let tickets = TicketService::new(db.clone(), bus.clone(), transport, timeout);
        let orchestrator = OrderOrchestrator::new(
            db.clone(),
            bus.clone(),
            selector.clone(),
            channels.clone(),
            OrchestratorSettings {
                placeholder_prefix: config.chat.placeholder_prefix.clone(),
                max_items: config.checkout.max_items,
            },
        );
        Self {
            directory: AgentDirectory::new(db.clone()),
            conversation: tickets.conversation().clone(),
            db,
            bus,
            selector,
            tickets,
            orchestrator,
            channels,
        }
    }

    pub fn backfill(&self) -> ChannelBackfill {
        ChannelBackfill::new(self.channels.clone())
    }
}

/// The CRM adapter selected by `[crm]`.
pub fn build_crm(config: &CrmConfig) -> Result<Arc<dyn CrmSync>, OrdeskError> {
    match (config.enabled, config.webhook_url.as_deref()) {
        (true, Some(url)) => Ok(Arc::new(WebhookCrm::new(
            url,
            Duration::from_secs(config.timeout_secs),
        )?)),
        (true, None) => Err(OrdeskError::Config(
            "crm.enabled requires crm.webhook_url".into(),
        )),
        (false, _) => Ok(Arc::new(NoopCrm)),
    }
}
