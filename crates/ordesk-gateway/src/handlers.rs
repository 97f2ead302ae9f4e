// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP handlers for order, ticket, conversation, and health endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use ordesk_core::{
    Message, NewMessage, NewOrder, Order, OrderTicket, Ticket, TicketStatus,
};
use ordesk_storage::sql_err;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::server::GatewayState;

// --- Request / response types ---

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<NewOrder>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub orders: Vec<OrderTicket>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: Order,
    pub ticket: Ticket,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub agent_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    /// Return only messages with a larger `seq`.
    pub after: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct AgentTicketsQuery {
    pub status: Option<TicketStatus>,
}

#[derive(Debug, Serialize)]
pub struct TicketsResponse {
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// --- Orders ---

/// POST /v1/orders
pub async fn post_order(
    State(state): State<GatewayState>,
    Json(order): Json<NewOrder>,
) -> Result<(StatusCode, Json<OrderTicket>), ApiError> {
    let keys = state.guard.acquire(std::slice::from_ref(&order))?;
    match state.desk.orchestrator.create_order_with_ticket(order).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(e) => {
            state.guard.release(&keys);
            Err(e.into())
        }
    }
}

/// POST /v1/orders/checkout
pub async fn post_checkout(
    State(state): State<GatewayState>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let keys = state.guard.acquire(&req.items)?;
    match state.desk.orchestrator.checkout(req.items).await {
        Ok(orders) => Ok((StatusCode::CREATED, Json(CheckoutResponse { orders }))),
        Err(e) => {
            state.guard.release(&keys);
            Err(e.into())
        }
    }
}

/// GET /v1/orders/{id}
pub async fn get_order(
    State(state): State<GatewayState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.desk.orchestrator.get_order(&order_id).await?;
    let ticket = state.desk.tickets.get_by_order(&order_id).await?;
    Ok(Json(OrderResponse { order, ticket }))
}

// --- Tickets ---

/// GET /v1/tickets/{id}
pub async fn get_ticket(
    State(state): State<GatewayState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    Ok(Json(state.desk.tickets.get(&ticket_id).await?))
}

/// PUT /v1/tickets/{id}/status
pub async fn put_ticket_status(
    State(state): State<GatewayState>,
    Path(ticket_id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = state
        .desk
        .tickets
        .transition_status(&ticket_id, req.status)
        .await?;
    Ok(Json(ticket))
}

/// PUT /v1/tickets/{id}/reassign
pub async fn put_ticket_reassign(
    State(state): State<GatewayState>,
    Path(ticket_id): Path<String>,
    Json(req): Json<ReassignRequest>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = state.desk.tickets.reassign(&ticket_id, &req.agent_id).await?;
    Ok(Json(ticket))
}

/// GET /v1/tickets/{id}/messages
pub async fn get_messages(
    State(state): State<GatewayState>,
    Path(ticket_id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let conversation = &state.desk.conversation;
    let messages = match (query.after, query.limit) {
        (None, None) => conversation.list(&ticket_id).await?,
        (after, limit) => {
            conversation
                .list_after(&ticket_id, after.unwrap_or(0), limit)
                .await?
        }
    };
    Ok(Json(MessagesResponse { messages }))
}

/// POST /v1/tickets/{id}/messages
pub async fn post_message(
    State(state): State<GatewayState>,
    Path(ticket_id): Path<String>,
    Json(input): Json<NewMessage>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let message = state.desk.conversation.append(&ticket_id, input).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /v1/agents/{id}/tickets
pub async fn get_agent_tickets(
    State(state): State<GatewayState>,
    Path(agent_id): Path<String>,
    Query(query): Query<AgentTicketsQuery>,
) -> Result<Json<TicketsResponse>, ApiError> {
    let tickets = state
        .desk
        .tickets
        .list_for_agent(&agent_id, query.status)
        .await?;
    Ok(Json(TicketsResponse { tickets }))
}

/// GET /health (unauthenticated)
pub async fn get_health(State(state): State<GatewayState>) -> (StatusCode, Json<HealthResponse>) {
    let probe = state
        .desk
        .db
        .call(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(sql_err)
        })
        .await;

    let (code, status) = match probe {
        Ok(_) => (StatusCode::OK, "healthy".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "health probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy".to_string())
        }
    };
    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: state.start_time.elapsed().as_secs(),
        }),
    )
}
