// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Ordesk.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed query functions for
//! accounts, packages, orders, tickets, assignment history, the round-robin
//! cursor, and the append-only conversation log.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

#[cfg(test)]
mod fixtures;

pub use adapter::SqliteStorage;
pub use database::{sql_err, Database, DatabaseOptions};
