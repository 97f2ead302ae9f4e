// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use ordesk_core::OrdeskError;
use rusqlite::TransactionBehavior;
use tracing::debug;

use crate::migrations;

/// Connection options applied when the database is opened.
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    /// Enable write-ahead logging.
    pub wal_mode: bool,
    /// How long a writer in another process waits for the lock, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            wal_mode: true,
            busy_timeout_ms: 5_000,
        }
    }
}

/// Handle to the single-writer SQLite connection.
///
/// Cloning is cheap and every clone talks to the same background thread,
/// so closures submitted through [`Database::call`] never run concurrently.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` with default options.
    pub async fn open(path: &str) -> Result<Self, OrdeskError> {
        Self::open_with(path, &DatabaseOptions::default()).await
    }

    /// Open (or create) the database, apply PRAGMAs, and run migrations.
    pub async fn open_with(path: &str, options: &DatabaseOptions) -> Result<Self, OrdeskError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| OrdeskError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| OrdeskError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };

        let pragmas = pragma_batch(options);
        db.call(move |conn| {
            conn.execute_batch(&pragmas).map_err(sql_err)?;
            migrations::run_migrations(conn)
        })
        .await?;

        debug!(path, wal = options.wal_mode, "database opened and migrated");
        Ok(db)
    }

    /// Returns the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Run `f` on the writer thread.
    pub async fn call<F, R>(&self, f: F) -> Result<R, OrdeskError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, OrdeskError> + Send + 'static,
        R: Send + 'static,
    {
        self.conn
            .call(move |conn| Ok::<_, rusqlite::Error>(f(conn)))
            .await
            .map_err(map_tr_err)?
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// The transaction commits only when `f` returns `Ok`; any error rolls
    /// back every statement `f` executed. `IMMEDIATE` takes the write lock up
    /// front, so other processes sharing the file serialize behind it.
    pub async fn transaction<F, R>(&self, f: F) -> Result<R, OrdeskError>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<R, OrdeskError> + Send + 'static,
        R: Send + 'static,
    {
        self.call(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(sql_err)?;
            let value = f(&tx)?;
            tx.commit().map_err(sql_err)?;
            Ok(value)
        })
        .await
    }

    /// Checkpoint the WAL so the main database file is self-contained.
    pub async fn close(&self) -> Result<(), OrdeskError> {
        self.call(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(sql_err)
        })
        .await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

fn pragma_batch(options: &DatabaseOptions) -> String {
    let journal = if options.wal_mode { "WAL" } else { "DELETE" };
    format!(
        "PRAGMA journal_mode = {journal};
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = {};",
        options.busy_timeout_ms
    )
}

/// Convert a rusqlite error into OrdeskError::Storage.
pub fn sql_err(e: rusqlite::Error) -> OrdeskError {
    OrdeskError::Storage {
        source: Box::new(e),
    }
}

/// Convert a tokio-rusqlite error into OrdeskError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> OrdeskError {
    OrdeskError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_runs_migrations() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("migrate.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .call(|conn| {
                let mut stmt = conn
                    .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                    .map_err(sql_err)?;
                let rows = stmt
                    .query_map([], |row| row.get::<_, String>(0))
                    .map_err(sql_err)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
            })
            .await
            .unwrap();

        for expected in [
            "assignment_cursor",
            "messages",
            "orders",
            "packages",
            "ticket_assignments",
            "tickets",
            "users",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
        }
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let path = db_path.to_str().unwrap();

        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
        drop(db);

        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested/deeper/ordesk.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        assert!(db_path.exists());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn failed_transaction_rolls_back_every_statement() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("rollback.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let result: Result<(), OrdeskError> = db
            .transaction(|tx| {
                tx.execute(
                    "INSERT INTO assignment_cursor (name, position) VALUES ('probe', 7)",
                    [],
                )
                .map_err(sql_err)?;
                Err(OrdeskError::Internal("abort after write".into()))
            })
            .await;
        assert!(result.is_err());

        let count: i64 = db
            .call(|conn| {
                conn.query_row("SELECT COUNT(*) FROM assignment_cursor", [], |row| row.get(0))
                    .map_err(sql_err)
            })
            .await
            .unwrap();
        assert_eq!(count, 0, "write inside failed transaction must not be visible");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("fk.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let result = db
            .call(|conn| {
                conn.execute(
                    "INSERT INTO packages (id, creator_id, title, price, currency)
                     VALUES ('p', 'nobody', 't', 1, 'USD')",
                    [],
                )
                .map_err(sql_err)
            })
            .await;
        assert!(result.is_err(), "package with unknown creator must be rejected");
        db.close().await.unwrap();
    }
}
