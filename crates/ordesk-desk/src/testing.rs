// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixtures for unit tests in this crate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ordesk_core::types::{Package, User};
use ordesk_core::{
    AccountStatus, AdapterType, Agent, ChannelRequest, ChatTransport, HealthStatus, NewOrder,
    OrdeskError, PluginAdapter, UserRole,
};
use ordesk_storage::queries::{packages, users};
use ordesk_bus::EventBus;
use ordesk_storage::Database;
use tempfile::TempDir;

use crate::channels::ChannelProvisioner;
use crate::orchestrator::{OrchestratorSettings, OrderOrchestrator};
use crate::selector::RoundRobinSelector;
use crate::transport::LoopbackTransport;

pub(crate) const TS: &str = "2026-01-01T00:00:00.000Z";

pub(crate) async fn test_db() -> (Database, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("desk.db");
    let db = Database::open(path.to_str().unwrap()).await.unwrap();
    (db, dir)
}

pub(crate) fn agent(id: &str) -> Agent {
    Agent {
        id: id.to_string(),
        display_name: id.to_uppercase(),
        role: UserRole::Agent,
        status: AccountStatus::Active,
    }
}

fn user(id: &str, role: UserRole) -> User {
    User {
        id: id.to_string(),
        display_name: id.to_string(),
        role,
        status: AccountStatus::Active,
        created_at: TS.to_string(),
    }
}

pub(crate) async fn seed_agents(db: &Database, ids: &[&str]) {
    let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
    db.call(move |conn| {
        for id in &ids {
            users::upsert(conn, &user(id, UserRole::Agent))?;
        }
        Ok(())
    })
    .await
    .unwrap();
}

/// One brand, one creator, and one active package `pkg-1`.
pub(crate) async fn seed_catalog(db: &Database) {
    db.call(|conn| {
        users::upsert(conn, &user("brand-1", UserRole::Brand))?;
        users::upsert(conn, &user("creator-1", UserRole::Creator))?;
        packages::insert(
            conn,
            &Package {
                id: "pkg-1".into(),
                creator_id: "creator-1".into(),
                title: "Unboxing video".into(),
                price: 5_000,
                currency: "USD".into(),
                active: true,
                created_at: TS.into(),
            },
        )
    })
    .await
    .unwrap();
}

pub(crate) fn new_order() -> NewOrder {
    NewOrder {
        package_id: "pkg-1".into(),
        brand_id: "brand-1".into(),
        creator_id: "creator-1".into(),
        quantity: 1,
        total_amount: 5_000,
        currency: "USD".into(),
    }
}

/// Chat transport whose channel creation can be switched to fail or hang.
#[derive(Default)]
pub(crate) struct FlakyTransport {
    pub fail: AtomicBool,
    pub stall: AtomicBool,
    /// Every `create_channel` call, including ones that stall or fail.
    pub calls: AtomicUsize,
    pub created: AtomicUsize,
    pub notices: AtomicUsize,
}

#[async_trait]
impl PluginAdapter for FlakyTransport {
    fn name(&self) -> &str {
        "flaky"
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
impl ChatTransport for FlakyTransport {
    async fn create_channel(&self, request: &ChannelRequest) -> Result<String, OrdeskError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stall.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(OrdeskError::Channel {
                message: "transport unavailable".into(),
                source: None,
            });
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(format!("chan-{}", request.ticket_id))
    }

    async fn add_participant(&self, _channel_id: &str, _user_id: &str) -> Result<(), OrdeskError> {
        Ok(())
    }

    async fn remove_participant(
        &self,
        _channel_id: &str,
        _user_id: &str,
    ) -> Result<(), OrdeskError> {
        Ok(())
    }

    async fn post_system_message(&self, _channel_id: &str, _body: &str) -> Result<(), OrdeskError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(OrdeskError::Channel {
                message: "transport unavailable".into(),
                source: None,
            });
        }
        self.notices.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Orchestrator over the loopback transport with default settings.
pub(crate) fn orchestrator(db: Database, bus: EventBus) -> OrderOrchestrator {
    orchestrator_with(db, bus, Arc::new(LoopbackTransport::new()))
}

pub(crate) fn orchestrator_with(
    db: Database,
    bus: EventBus,
    transport: Arc<dyn ChatTransport>,
) -> OrderOrchestrator {
    let channels = ChannelProvisioner::new(
        db.clone(),
        bus.clone(),
        transport,
        Duration::from_millis(100),
    );
    OrderOrchestrator::new(
        db,
        bus,
        RoundRobinSelector::new("support"),
        channels,
        OrchestratorSettings::default(),
    )
}
