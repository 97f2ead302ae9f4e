// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Internal typed event bus.
//!
//! Services publish [`DeskEvent`]s after their transactions commit; the CRM
//! sync worker and any other observers subscribe. Delivery is best-effort:
//! a slow subscriber lags and drops events, it never blocks a publisher.

pub mod events;

pub use events::{BusEvent, DeskEvent};

use tokio::sync::broadcast;
use tracing::{debug, trace};

const DEFAULT_CAPACITY: usize = 1024;

/// Broadcast bus for [`BusEvent`]s. Cloning shares the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Wrap `payload` in an envelope and broadcast it.
    ///
    /// Returns the number of subscribers that received it. Zero subscribers
    /// is not an error.
    pub fn publish(&self, payload: DeskEvent) -> usize {
        let kind = payload.kind();
        let event = BusEvent {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: ordesk_core::now_timestamp(),
            payload,
        };
        match self.tx.send(event) {
            Ok(receivers) => {
                debug!(kind, receivers, "event published");
                receivers
            }
            Err(_) => {
                trace!(kind, "event published with no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
