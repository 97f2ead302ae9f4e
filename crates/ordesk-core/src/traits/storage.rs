// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends.

use async_trait::async_trait;

use crate::error::OrdeskError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for storage and persistence backends.
///
/// The backend must provide a unique constraint on `tickets.order_id`,
/// an atomic increment-and-read for the assignment cursor, and
/// multi-statement transactions spanning order and ticket creation.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Opens the backend and applies pending migrations.
    async fn initialize(&self) -> Result<(), OrdeskError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), OrdeskError>;
}
