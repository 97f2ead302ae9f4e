// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Ordesk integration tests.
//!
//! Provides mock collaborators and a harness that wires every desk service
//! to a temp SQLite database, without external services.
//!
//! # Components
//!
//! - [`TestHarness`] - Seeded database plus a fully wired [`ordesk_desk::Desk`]
//! - [`MockTransport`] - Chat transport that records calls and can fail or stall
//! - [`RecordingCrm`] - CRM sink that captures every synced ticket event

pub mod harness;
pub mod mock_crm;
pub mod mock_transport;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_crm::RecordingCrm;
pub use mock_transport::MockTransport;
