// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use ordesk_config::model::StorageConfig;
use ordesk_core::{AdapterType, HealthStatus, OrdeskError, PluginAdapter, StorageAdapter};

use crate::database::{sql_err, Database, DatabaseOptions};

/// SQLite-backed storage adapter.
///
/// Owns the lifecycle of a [`Database`] handle. The database is opened on
/// the first call to [`StorageAdapter::initialize`]; services obtain the
/// shared handle through [`SqliteStorage::database`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: StorageAdapter::initialize
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns the opened database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, OrdeskError> {
        self.db.get().ok_or_else(|| OrdeskError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    fn options(&self) -> DatabaseOptions {
        DatabaseOptions {
            wal_mode: self.config.wal_mode,
            busy_timeout_ms: self.config.busy_timeout_ms,
        }
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, OrdeskError> {
        let db = match self.db.get() {
            Some(db) => db,
            None => return Ok(HealthStatus::Unhealthy("not initialized".into())),
        };
        db.call(|conn| conn.execute_batch("SELECT 1;").map_err(sql_err))
            .await?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), OrdeskError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), OrdeskError> {
        let path = self.config.database_path.clone();
        let db = Database::open_with(&path, &self.options()).await?;
        self.db.set(db).map_err(|_| OrdeskError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), OrdeskError> {
        self.database()?.close().await
    }
}
