// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router construction and the HTTP server loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use ordesk_core::OrdeskError;
use ordesk_desk::Desk;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthConfig};
use crate::guard::DuplicateGuard;
use crate::handlers;

/// Shared state for every handler.
#[derive(Clone)]
pub struct GatewayState {
    pub desk: Desk,
    pub guard: Arc<DuplicateGuard>,
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(desk: Desk, duplicate_window: Duration) -> Self {
        Self {
            desk,
            guard: Arc::new(DuplicateGuard::new(duplicate_window)),
            start_time: Instant::now(),
        }
    }
}

/// Server bind and auth settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub bearer_token: Option<String>,
}

/// Build the router. `/health` is public; everything under `/v1` requires
/// the bearer token.
pub fn build_router(state: GatewayState, auth: AuthConfig) -> Router {
    let api_routes = Router::new()
        .route("/v1/orders", post(handlers::post_order))
        .route("/v1/orders/checkout", post(handlers::post_checkout))
        .route("/v1/orders/{id}", get(handlers::get_order))
        .route("/v1/tickets/{id}", get(handlers::get_ticket))
        .route("/v1/tickets/{id}/status", put(handlers::put_ticket_status))
        .route("/v1/tickets/{id}/reassign", put(handlers::put_ticket_reassign))
        .route(
            "/v1/tickets/{id}/messages",
            get(handlers::get_messages).post(handlers::post_message),
        )
        .route("/v1/agents/{id}/tickets", get(handlers::get_agent_tickets))
        .route_layer(axum_middleware::from_fn_with_state(auth, auth_middleware));

    let public_routes = Router::new().route("/health", get(handlers::get_health));

    Router::new()
        .merge(api_routes)
        .merge(public_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until `cancel` fires.
pub async fn start_server(
    config: ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), OrdeskError> {
    let auth = AuthConfig {
        bearer_token: config.bearer_token.clone(),
    };
    if auth.bearer_token.is_none() {
        tracing::warn!("gateway.bearer_token is not set; every /v1 request will be rejected");
    }
    let app = build_router(state, auth);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| OrdeskError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;
    tracing::info!(addr = %addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| OrdeskError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
