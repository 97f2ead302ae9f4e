// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for Ordesk.
//!
//! Exposes checkout, ticket lifecycle, and conversation operations as JSON
//! endpoints behind bearer-token auth, plus an unauthenticated `/health`.

pub mod auth;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use error::{ApiError, ErrorResponse};
pub use guard::DuplicateGuard;
pub use server::{build_router, start_server, GatewayState, ServerConfig};
