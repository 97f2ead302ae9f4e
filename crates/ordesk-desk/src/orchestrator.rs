// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order-to-ticket orchestration.
//!
//! Order insert, reference checks, agent selection, cursor advance, and
//! ticket insert share one `BEGIN IMMEDIATE` transaction: after it either
//! the order and its ticket both exist or neither does. Channel creation
//! happens after commit (see [`crate::channels`]).

use futures::future::join_all;
use ordesk_bus::{DeskEvent, EventBus};
use ordesk_core::{
    now_timestamp, AccountStatus, NewOrder, OrdeskError, Order, OrderStatus, OrderTicket,
    UserRole,
};
use ordesk_storage::queries::{orders, packages, users};
use ordesk_storage::Database;
use rusqlite::Connection;
use tracing::info;

use crate::channels::{placeholder_channel_id, ChannelProvisioner};
use crate::directory;
use crate::selector::RoundRobinSelector;
use crate::tickets::open_ticket;

/// Tunables taken from the `[chat]` and `[checkout]` config sections.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub placeholder_prefix: String,
    pub max_items: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            placeholder_prefix: "pending-".to_string(),
            max_items: 20,
        }
    }
}

/// Check that every id in `input` resolves to something that can trade.
fn check_references(conn: &Connection, input: &NewOrder) -> Result<(), OrdeskError> {
    let mut problems = Vec::new();

    match packages::get(conn, &input.package_id)? {
        None => problems.push(format!("package {} does not exist", input.package_id)),
        Some(p) if !p.active => problems.push(format!("package {} is not for sale", p.id)),
        Some(p) if p.creator_id != input.creator_id => problems.push(format!(
            "package {} does not belong to creator {}",
            p.id, input.creator_id
        )),
        Some(p) if p.currency != input.currency => problems.push(format!(
            "package {} is priced in {}, not {}",
            p.id, p.currency, input.currency
        )),
        Some(_) => {}
    }

    for (id, role) in [
        (&input.brand_id, UserRole::Brand),
        (&input.creator_id, UserRole::Creator),
    ] {
        match users::get(conn, id)? {
            Some(u) if u.role == role && u.status == AccountStatus::Active => {}
            Some(u) if u.role != role => problems.push(format!("{id} is not a {role}")),
            Some(_) => problems.push(format!("{role} {id} is not active")),
            None => problems.push(format!("{role} {id} does not exist")),
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(OrdeskError::Validation(problems.join("; ")))
    }
}

/// A committed order/ticket pair plus the cursor slot that picked the agent.
struct Created {
    pair: OrderTicket,
    slot: i64,
}

#[derive(Clone)]
pub struct OrderOrchestrator {
    db: Database,
    bus: EventBus,
    selector: RoundRobinSelector,
    channels: ChannelProvisioner,
    settings: OrchestratorSettings,
}

impl OrderOrchestrator {
    pub fn new(
        db: Database,
        bus: EventBus,
        selector: RoundRobinSelector,
        channels: ChannelProvisioner,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            db,
            bus,
            selector,
            channels,
            settings,
        }
    }

    /// Create one order and its ticket atomically.
    pub async fn create_order_with_ticket(
        &self,
        input: NewOrder,
    ) -> Result<OrderTicket, OrdeskError> {
        let mut created = self.commit(vec![input]).await?;
        let pair = created
            .pop()
            .ok_or_else(|| OrdeskError::Internal("checkout committed no orders".into()))?;
        Ok(pair)
    }

    /// Create one order and ticket per cart item, all or nothing.
    ///
    /// Every item takes its own cursor slot, so a cart of N items spreads
    /// across agents the same way N separate checkouts would.
    pub async fn checkout(&self, items: Vec<NewOrder>) -> Result<Vec<OrderTicket>, OrdeskError> {
        if items.is_empty() {
            return Err(OrdeskError::Validation("checkout has no items".into()));
        }
        if items.len() > self.settings.max_items {
            return Err(OrdeskError::Validation(format!(
                "checkout has {} items, the limit is {}",
                items.len(),
                self.settings.max_items
            )));
        }
        self.commit(items).await
    }

    async fn commit(&self, items: Vec<NewOrder>) -> Result<Vec<OrderTicket>, OrdeskError> {
        let multi = items.len() > 1;
        for (i, item) in items.iter().enumerate() {
            item.validate().map_err(|e| item_error(multi, i, e))?;
        }

        let selector = self.selector.clone();
        let prefix = self.settings.placeholder_prefix.clone();
        let created = self
            .db
            .transaction(move |tx| {
                let agents = directory::eligible_agents(tx)?;
                let mut created = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    check_references(tx, &item).map_err(|e| item_error(multi, i, e))?;
                    let order = Order {
                        id: uuid::Uuid::new_v4().to_string(),
                        package_id: item.package_id,
                        brand_id: item.brand_id,
                        creator_id: item.creator_id,
                        quantity: item.quantity,
                        total_amount: item.total_amount,
                        currency: item.currency,
                        status: OrderStatus::Pending,
                        created_at: now_timestamp(),
                    };
                    orders::insert(tx, &order)?;

                    let (agent, slot) = selector.select_next(tx, &agents)?;
                    let placeholder = placeholder_channel_id(&prefix, &order.id);
                    let ticket = open_ticket(tx, &order, &agent, &placeholder, true, Some(slot))?;
                    created.push(Created {
                        pair: OrderTicket { order, ticket },
                        slot,
                    });
                }
                Ok(created)
            })
            .await?;

        for Created { pair, slot } in &created {
            info!(
                order_id = %pair.order.id,
                ticket_id = %pair.ticket.id,
                agent_id = %pair.ticket.assigned_agent_id,
                slot,
                "order created with ticket"
            );
            self.bus.publish(DeskEvent::TicketCreated {
                ticket_id: pair.ticket.id.clone(),
                order_id: pair.order.id.clone(),
                agent_id: pair.ticket.assigned_agent_id.clone(),
                slot: Some(*slot),
            });
        }

        let provisioned = join_all(created.into_iter().map(|Created { pair, .. }| async move {
            let ticket = self.channels.provision(&pair.order, pair.ticket).await;
            OrderTicket {
                order: pair.order,
                ticket,
            }
        }))
        .await;
        Ok(provisioned)
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order, OrdeskError> {
        let id = order_id.to_string();
        self.db
            .call(move |conn| orders::get(conn, &id)?.ok_or_else(|| OrdeskError::OrderNotFound(id)))
            .await
    }
}

fn item_error(multi: bool, index: usize, err: OrdeskError) -> OrdeskError {
    match err {
        OrdeskError::Validation(msg) if multi => {
            OrdeskError::Validation(format!("item {index}: {msg}"))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::channels::ChannelBackfill;
    use crate::testing::{
        new_order, orchestrator, orchestrator_with, seed_agents, seed_catalog, test_db,
        FlakyTransport,
    };
    use ordesk_storage::queries::tickets;

    async fn counts(db: &Database) -> (i64, i64) {
        db.call(|conn| Ok((orders::count(conn)?, tickets::count(conn)?)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn first_four_checkouts_go_a_b_c_a() {
        let (db, _dir) = test_db().await;
        seed_catalog(&db).await;
        seed_agents(&db, &["A", "B", "C"]).await;
        let orch = orchestrator(db.clone(), EventBus::default());

        let mut assigned = Vec::new();
        for _ in 0..4 {
            let created = orch.create_order_with_ticket(new_order()).await.unwrap();
            assert_eq!(created.ticket.order_id, created.order.id);
            assigned.push(created.ticket.assigned_agent_id);
        }
        assert_eq!(assigned, vec!["A", "B", "C", "A"]);
        assert_eq!(counts(&db).await, (4, 4));
    }

    #[tokio::test]
    async fn no_agents_rolls_back_the_order() {
        let (db, _dir) = test_db().await;
        seed_catalog(&db).await;
        let orch = orchestrator(db.clone(), EventBus::default());

        let err = orch.create_order_with_ticket(new_order()).await.unwrap_err();
        assert!(matches!(err, OrdeskError::NoEligibleAgents));
        assert!(err.is_retryable());
        assert_eq!(counts(&db).await, (0, 0));
    }

    #[tokio::test]
    async fn bad_references_are_rejected_before_anything_persists() {
        let (db, _dir) = test_db().await;
        seed_catalog(&db).await;
        seed_agents(&db, &["A"]).await;
        let orch = orchestrator(db.clone(), EventBus::default());

        let mut unknown_package = new_order();
        unknown_package.package_id = "pkg-missing".into();
        let mut wrong_creator = new_order();
        wrong_creator.creator_id = "brand-1".into();
        let mut zero_qty = new_order();
        zero_qty.quantity = 0;

        for input in [unknown_package, wrong_creator, zero_qty] {
            assert!(matches!(
                orch.create_order_with_ticket(input).await,
                Err(OrdeskError::Validation(_))
            ));
        }
        assert_eq!(counts(&db).await, (0, 0));
        assert_eq!(
            RoundRobinSelector::new("support").position(&db).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn checkout_is_all_or_nothing() {
        let (db, _dir) = test_db().await;
        seed_catalog(&db).await;
        seed_agents(&db, &["A", "B"]).await;
        let orch = orchestrator(db.clone(), EventBus::default());

        let mut bad = new_order();
        bad.package_id = "pkg-missing".into();
        let err = orch
            .checkout(vec![new_order(), new_order(), bad])
            .await
            .unwrap_err();
        match err {
            OrdeskError::Validation(msg) => assert!(msg.starts_with("item 2:"), "{msg}"),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(counts(&db).await, (0, 0));

        let created = orch
            .checkout(vec![new_order(), new_order(), new_order()])
            .await
            .unwrap();
        let agents: Vec<&str> = created
            .iter()
            .map(|c| c.ticket.assigned_agent_id.as_str())
            .collect();
        assert_eq!(agents, vec!["A", "B", "A"]);
        assert_eq!(counts(&db).await, (3, 3));
    }

    #[tokio::test]
    async fn empty_and_oversized_checkouts_are_rejected() {
        let (db, _dir) = test_db().await;
        let orch = orchestrator(db, EventBus::default());
        assert!(matches!(
            orch.checkout(vec![]).await,
            Err(OrdeskError::Validation(_))
        ));
        assert!(matches!(
            orch.checkout(vec![new_order(); 21]).await,
            Err(OrdeskError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_checkouts_spread_evenly() {
        let (db, _dir) = test_db().await;
        seed_catalog(&db).await;
        seed_agents(&db, &["A", "B", "C"]).await;
        let orch = orchestrator(db.clone(), EventBus::default());

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let orch = orch.clone();
                tokio::spawn(async move { orch.create_order_with_ticket(new_order()).await })
            })
            .collect();

        let mut per_agent = std::collections::HashMap::new();
        for handle in handles {
            let created = handle.await.unwrap().unwrap();
            *per_agent.entry(created.ticket.assigned_agent_id).or_insert(0) += 1;
        }
        let mut loads: Vec<i32> = per_agent.into_values().collect();
        loads.sort_unstable();
        assert_eq!(loads, vec![6, 7, 7]);
        assert_eq!(counts(&db).await, (20, 20));
    }

    #[tokio::test]
    async fn channel_is_attached_after_commit() {
        let (db, _dir) = test_db().await;
        seed_catalog(&db).await;
        seed_agents(&db, &["A"]).await;
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let orch = orchestrator(db, bus);

        let created = orch.create_order_with_ticket(new_order()).await.unwrap();
        assert!(!created.ticket.channel_pending);
        assert_eq!(created.ticket.channel_id, format!("ticket-{}", created.ticket.id));

        let first = rx.recv().await.unwrap().payload;
        let second = rx.recv().await.unwrap().payload;
        assert_eq!(first.kind(), "ticket_created");
        assert_eq!(second.kind(), "channel_attached");
    }

    #[tokio::test]
    async fn failed_channel_keeps_placeholder_until_backfill() {
        let (db, _dir) = test_db().await;
        seed_catalog(&db).await;
        seed_agents(&db, &["A"]).await;
        let bus = EventBus::default();
        let transport = Arc::new(FlakyTransport::default());
        transport.fail.store(true, Ordering::SeqCst);
        let orch = orchestrator_with(db.clone(), bus.clone(), transport.clone());

        let created = orch.create_order_with_ticket(new_order()).await.unwrap();
        assert!(created.ticket.channel_pending);
        assert!(created.ticket.channel_id.starts_with("pending-"));

        let backfill = ChannelBackfill::new(orch.channels.clone()).with_min_age(Duration::ZERO);
        let report = backfill.run_once().await.unwrap();
        assert_eq!((report.attempted, report.attached, report.failed), (1, 0, 1));

        transport.fail.store(false, Ordering::SeqCst);
        let report = backfill.run_once().await.unwrap();
        assert_eq!((report.attempted, report.attached), (1, 1));

        let stored = db
            .call(move |conn| tickets::get(conn, &created.ticket.id))
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.channel_pending);
        assert_eq!(stored.channel_id, format!("chan-{}", stored.id));
        assert_eq!(backfill.run_once().await.unwrap().attempted, 0);
    }

    #[tokio::test]
    async fn stalled_transport_times_out_without_failing_checkout() {
        let (db, _dir) = test_db().await;
        seed_catalog(&db).await;
        seed_agents(&db, &["A"]).await;
        let transport = Arc::new(FlakyTransport::default());
        transport.stall.store(true, Ordering::SeqCst);
        let orch = orchestrator_with(db.clone(), EventBus::default(), transport);

        let created = tokio::time::timeout(
            Duration::from_secs(5),
            orch.create_order_with_ticket(new_order()),
        )
        .await
        .expect("checkout must not wait on the stalled transport")
        .unwrap();
        assert!(created.ticket.channel_pending);
        assert_eq!(counts(&db).await, (1, 1));
    }
}
