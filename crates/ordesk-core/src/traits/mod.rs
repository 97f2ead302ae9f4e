// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod crm;
pub mod storage;
pub mod transport;

pub use adapter::PluginAdapter;
pub use crm::{CrmSync, TicketSyncEvent, TicketSyncKind};
pub use storage::StorageAdapter;
pub use transport::{ChannelRequest, ChatTransport};
