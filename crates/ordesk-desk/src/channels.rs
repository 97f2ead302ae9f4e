// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat channel provisioning outside the checkout transaction.
//!
//! Tickets are committed with a placeholder channel id. A real id is
//! requested afterwards under a timeout; tickets whose request failed stay
//! `channel_pending` until [`ChannelBackfill`] attaches one. The backfill
//! leaves tickets younger than its minimum age alone so it never races the
//! request a checkout still has in flight.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ordesk_bus::{DeskEvent, EventBus};
use ordesk_core::{now_timestamp, timestamp_before, ChannelRequest, ChatTransport, OrdeskError, Order, Ticket};
use ordesk_storage::queries::{orders, tickets};
use ordesk_storage::Database;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Placeholder stored in `tickets.channel_id` until a real channel exists.
/// Keyed by order id, which is unique per ticket.
pub fn placeholder_channel_id(prefix: &str, order_id: &str) -> String {
    format!("{prefix}{order_id}")
}

pub(crate) fn channel_request(order: &Order, ticket: &Ticket) -> ChannelRequest {
    ChannelRequest {
        ticket_id: ticket.id.clone(),
        order_id: order.id.clone(),
        participants: vec![
            order.brand_id.clone(),
            order.creator_id.clone(),
            ticket.assigned_agent_id.clone(),
        ],
    }
}

/// Await a collaborator call, converting an elapsed deadline into `Timeout`.
pub(crate) async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, OrdeskError>
where
    F: Future<Output = Result<T, OrdeskError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| OrdeskError::Timeout { duration: limit })?
}

/// Run a collaborator call whose failure must not affect the caller.
pub(crate) async fn best_effort<F>(what: &'static str, ticket_id: &str, limit: Duration, fut: F)
where
    F: Future<Output = Result<(), OrdeskError>>,
{
    if let Err(e) = bounded(limit, fut).await {
        warn!(ticket_id, error = %e, "{what} failed");
    }
}

/// Requests channels and records them on tickets.
#[derive(Clone)]
pub struct ChannelProvisioner {
    db: Database,
    bus: EventBus,
    transport: Arc<dyn ChatTransport>,
    timeout: Duration,
}

impl ChannelProvisioner {
    pub fn new(
        db: Database,
        bus: EventBus,
        transport: Arc<dyn ChatTransport>,
        timeout: Duration,
    ) -> Self {
        Self {
            db,
            bus,
            transport,
            timeout,
        }
    }

    pub fn transport(&self) -> &Arc<dyn ChatTransport> {
        &self.transport
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Try to replace a ticket's placeholder. Never fails: on error the
    /// ticket is returned unchanged and stays pending.
    pub async fn provision(&self, order: &Order, ticket: Ticket) -> Ticket {
        if !ticket.channel_pending {
            return ticket;
        }
        match self.try_provision(order, &ticket).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!(
                    ticket_id = %ticket.id,
                    order_id = %order.id,
                    error = %e,
                    "channel creation failed, placeholder kept for backfill"
                );
                ticket
            }
        }
    }

    async fn try_provision(&self, order: &Order, ticket: &Ticket) -> Result<Ticket, OrdeskError> {
        let request = channel_request(order, ticket);
        let channel_id = bounded(self.timeout, self.transport.create_channel(&request)).await?;
        self.attach(&ticket.id, channel_id).await
    }

    /// Store `channel_id` if the ticket still has a placeholder and return
    /// the ticket as stored. A channel attached earlier is left in place.
    pub async fn attach(&self, ticket_id: &str, channel_id: String) -> Result<Ticket, OrdeskError> {
        let id = ticket_id.to_string();
        let stored_channel = channel_id.clone();
        let (attached, ticket) = self
            .db
            .call(move |conn| {
                let attached =
                    tickets::attach_channel(conn, &id, &stored_channel, &now_timestamp())?;
                let ticket =
                    tickets::get(conn, &id)?.ok_or_else(|| OrdeskError::TicketNotFound(id.clone()))?;
                Ok((attached, ticket))
            })
            .await?;

        if attached {
            debug!(ticket_id, channel_id = %channel_id, "channel attached");
            self.bus.publish(DeskEvent::ChannelAttached {
                ticket_id: ticket_id.to_string(),
                channel_id,
            });
        }
        Ok(ticket)
    }
}

/// Outcome of one backfill sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackfillReport {
    pub attempted: usize,
    pub attached: usize,
    pub failed: usize,
}

/// Retries channel creation for tickets still holding a placeholder.
pub struct ChannelBackfill {
    provisioner: ChannelProvisioner,
    batch_size: i64,
    min_age: Duration,
}

impl ChannelBackfill {
    /// The minimum ticket age defaults to twice the provisioner timeout,
    /// which covers the bounded request plus the commit and attach writes.
    pub fn new(provisioner: ChannelProvisioner) -> Self {
        let min_age = provisioner.timeout().saturating_mul(2);
        Self {
            provisioner,
            batch_size: 100,
            min_age,
        }
    }

    pub fn with_min_age(mut self, min_age: Duration) -> Self {
        self.min_age = min_age;
        self
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// One pass over the oldest pending tickets that are at least
    /// `min_age` old.
    pub async fn run_once(&self) -> Result<BackfillReport, OrdeskError> {
        let limit = self.batch_size;
        let cutoff = timestamp_before(self.min_age);
        let pending = self
            .provisioner
            .db
            .call(move |conn| {
                tickets::list_channel_pending(conn, &cutoff, limit)?
                    .into_iter()
                    .map(|ticket| {
                        let order = orders::get(conn, &ticket.order_id)?
                            .ok_or_else(|| OrdeskError::OrderNotFound(ticket.order_id.clone()))?;
                        Ok((order, ticket))
                    })
                    .collect::<Result<Vec<_>, OrdeskError>>()
            })
            .await?;

        let mut report = BackfillReport {
            attempted: pending.len(),
            ..BackfillReport::default()
        };
        for (order, ticket) in pending {
            let result = self.provisioner.provision(&order, ticket).await;
            if result.channel_pending {
                report.failed += 1;
            } else {
                report.attached += 1;
            }
        }

        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                attached = report.attached,
                failed = report.failed,
                "channel backfill pass complete"
            );
        }
        Ok(report)
    }

    /// Sweep every `interval` until `cancel` fires.
    pub async fn run(self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("channel backfill stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        warn!(error = %e, "channel backfill pass failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{new_order, orchestrator_with, seed_agents, seed_catalog, test_db};
    use crate::testing::FlakyTransport;
    use std::sync::atomic::Ordering;

    #[test]
    fn placeholder_uses_prefix() {
        assert_eq!(placeholder_channel_id("pending-", "o1"), "pending-o1");
    }

    #[tokio::test]
    async fn bounded_converts_elapsed_deadline() {
        let err = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<(), OrdeskError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, OrdeskError::Timeout { .. }));
    }

    #[tokio::test]
    async fn attach_does_not_overwrite_existing_channel() {
        let (db, _dir) = test_db().await;
        seed_catalog(&db).await;
        seed_agents(&db, &["A"]).await;
        let bus = EventBus::default();
        let transport = Arc::new(FlakyTransport::default());
        let created = orchestrator_with(db.clone(), bus.clone(), transport.clone())
            .create_order_with_ticket(new_order())
            .await
            .unwrap();
        let provisioner = ChannelProvisioner::new(db, bus, transport, Duration::from_millis(100));

        let ticket = provisioner
            .attach(&created.ticket.id, "late-channel".into())
            .await
            .unwrap();
        assert_eq!(ticket.channel_id, created.ticket.channel_id);
        assert!(matches!(
            provisioner.attach("missing", "x".into()).await,
            Err(OrdeskError::TicketNotFound(_))
        ));
    }

    #[tokio::test]
    async fn backfill_leaves_in_flight_provisioning_alone() {
        let (db, _dir) = test_db().await;
        seed_catalog(&db).await;
        seed_agents(&db, &["A"]).await;
        let bus = EventBus::default();
        let transport = Arc::new(FlakyTransport::default());
        transport.stall.store(true, Ordering::SeqCst);
        let orch = orchestrator_with(db.clone(), bus.clone(), transport.clone());
        let backfill = ChannelBackfill::new(ChannelProvisioner::new(
            db.clone(),
            bus,
            transport.clone(),
            Duration::from_millis(100),
        ));

        let checkout = tokio::spawn(async move { orch.create_order_with_ticket(new_order()).await });
        for _ in 0..100 {
            if transport.calls.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        // The checkout's request is still stalled here.
        let report = backfill.run_once().await.unwrap();
        assert_eq!(report, BackfillReport::default());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        let created = checkout.await.unwrap().unwrap();
        assert!(created.ticket.channel_pending);

        transport.stall.store(false, Ordering::SeqCst);
        tokio::time::sleep(backfill.min_age + Duration::from_millis(20)).await;
        let report = backfill.run_once().await.unwrap();
        assert_eq!((report.attempted, report.attached), (1, 1));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert_eq!(transport.created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn backfill_loop_attaches_then_stops_on_cancel() {
        let (db, _dir) = test_db().await;
        seed_catalog(&db).await;
        seed_agents(&db, &["A"]).await;
        let bus = EventBus::default();
        let transport = Arc::new(FlakyTransport::default());
        transport.fail.store(true, Ordering::SeqCst);
        let created = orchestrator_with(db.clone(), bus.clone(), transport.clone())
            .create_order_with_ticket(new_order())
            .await
            .unwrap();
        assert!(created.ticket.channel_pending);
        transport.fail.store(false, Ordering::SeqCst);

        let backfill = ChannelBackfill::new(ChannelProvisioner::new(
            db.clone(),
            bus,
            transport,
            Duration::from_millis(100),
        ));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(backfill.run(Duration::from_millis(20), cancel.clone()));

        let mut pending = 1;
        for _ in 0..100 {
            pending = db.call(|conn| tickets::count_channel_pending(conn)).await.unwrap();
            if pending == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(pending, 0);
    }
}
