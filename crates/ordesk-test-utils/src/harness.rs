// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` opens a temp SQLite database through [`SqliteStorage`],
//! seeds a small catalog (brands, a creator, packages) and a set of support
//! agents, and wires a [`Desk`] over a [`MockTransport`].

use std::sync::Arc;

use ordesk_bus::EventBus;
use ordesk_config::model::{ChatConfig, OrdeskConfig, StorageConfig};
use ordesk_core::types::{Package, User};
use ordesk_core::{
    now_timestamp, AccountStatus, NewMessage, NewOrder, OrdeskError, StorageAdapter, UserRole,
};
use ordesk_desk::Desk;
use ordesk_storage::queries::{packages, users};
use ordesk_storage::{Database, SqliteStorage};

use crate::mock_transport::MockTransport;

pub const BRAND: &str = "brand-1";
pub const OTHER_BRAND: &str = "brand-2";
pub const CREATOR: &str = "creator-1";
pub const PACKAGE: &str = "pkg-1";
pub const PACKAGE_PRICE: i64 = 5_000;
pub const OTHER_PACKAGE: &str = "pkg-2";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    agents: Vec<String>,
    channel_timeout_ms: u64,
    transport: Option<Arc<MockTransport>>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            agents: vec!["agent-a".into(), "agent-b".into(), "agent-c".into()],
            channel_timeout_ms: 200,
            transport: None,
        }
    }

    /// Replace the default agents (`agent-a`, `agent-b`, `agent-c`).
    /// Pass an empty slice for a desk with nobody to assign to.
    pub fn with_agents(mut self, ids: &[&str]) -> Self {
        self.agents = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_channel_timeout_ms(mut self, ms: u64) -> Self {
        self.channel_timeout_ms = ms;
        self
    }

    /// Share a transport the test keeps a handle to.
    pub fn with_transport(mut self, transport: Arc<MockTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub async fn build(self) -> Result<TestHarness, OrdeskError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| OrdeskError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("ordesk-test.db");

        let config = OrdeskConfig {
            storage: StorageConfig {
                database_path: db_path.to_string_lossy().to_string(),
                ..StorageConfig::default()
            },
            chat: ChatConfig {
                channel_timeout_ms: self.channel_timeout_ms,
                ..ChatConfig::default()
            },
            ..OrdeskConfig::default()
        };

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let db = storage.database()?.clone();

        seed(&db, self.agents).await?;

        let transport = self.transport.unwrap_or_default();
        let bus = EventBus::default();
        let desk = Desk::new(&config, db, bus, transport.clone());

        Ok(TestHarness {
            desk,
            storage: Arc::new(storage),
            transport,
            config,
            _temp_dir: temp_dir,
        })
    }
}

async fn seed(db: &Database, agents: Vec<String>) -> Result<(), OrdeskError> {
    db.call(move |conn| {
        users::upsert(conn, &user(BRAND, UserRole::Brand))?;
        users::upsert(conn, &user(OTHER_BRAND, UserRole::Brand))?;
        users::upsert(conn, &user(CREATOR, UserRole::Creator))?;
        for id in &agents {
            users::upsert(conn, &user(id, UserRole::Agent))?;
        }
        packages::insert(conn, &package(PACKAGE, "Unboxing video", PACKAGE_PRICE))?;
        packages::insert(conn, &package(OTHER_PACKAGE, "Story series", 12_000))
    })
    .await
}

fn user(id: &str, role: UserRole) -> User {
    User {
        id: id.to_string(),
        display_name: id.to_string(),
        role,
        status: AccountStatus::Active,
        created_at: now_timestamp(),
    }
}

fn package(id: &str, title: &str, price: i64) -> Package {
    Package {
        id: id.to_string(),
        creator_id: CREATOR.to_string(),
        title: title.to_string(),
        price,
        currency: "USD".to_string(),
        active: true,
        created_at: now_timestamp(),
    }
}

/// A complete test environment with mock collaborators and temp storage.
pub struct TestHarness {
    pub desk: Desk,
    pub storage: Arc<SqliteStorage>,
    pub transport: Arc<MockTransport>,
    pub config: OrdeskConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with the default three agents.
    pub async fn new() -> Result<Self, OrdeskError> {
        Self::builder().build().await
    }

    pub fn db(&self) -> &Database {
        &self.desk.db
    }

    /// A valid single-unit order of the seeded package by the seeded brand.
    pub fn order(&self) -> NewOrder {
        NewOrder {
            package_id: PACKAGE.to_string(),
            brand_id: BRAND.to_string(),
            creator_id: CREATOR.to_string(),
            quantity: 1,
            total_amount: PACKAGE_PRICE,
            currency: "USD".to_string(),
        }
    }

    /// Same as [`order`](Self::order) with a different quantity.
    pub fn order_of(&self, quantity: u32) -> NewOrder {
        NewOrder {
            quantity,
            total_amount: PACKAGE_PRICE * i64::from(quantity),
            ..self.order()
        }
    }

    pub fn brand_message(&self, body: &str) -> NewMessage {
        NewMessage {
            sender_id: BRAND.to_string(),
            sender_role: ordesk_core::SenderRole::Brand,
            body: body.to_string(),
            attachment: None,
            kind: ordesk_core::MessageKind::Text,
        }
    }

    /// Add another active support agent after the harness was built.
    pub async fn add_agent(&self, id: &str) -> Result<(), OrdeskError> {
        self.desk.directory.add_agent(id, id, UserRole::Agent).await?;
        Ok(())
    }
}
