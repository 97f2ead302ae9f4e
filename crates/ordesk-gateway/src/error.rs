// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`OrdeskError`] to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ordesk_core::OrdeskError;
use serde::Serialize;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub retryable: bool,
}

/// Handler error wrapper so `?` works on [`OrdeskError`].
#[derive(Debug)]
pub struct ApiError(pub OrdeskError);

impl From<OrdeskError> for ApiError {
    fn from(err: OrdeskError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &OrdeskError) -> StatusCode {
    match err {
        OrdeskError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        OrdeskError::NoEligibleAgents => StatusCode::SERVICE_UNAVAILABLE,
        OrdeskError::DuplicateTicket { .. }
        | OrdeskError::DuplicateOrder { .. }
        | OrdeskError::InvalidTransition { .. }
        | OrdeskError::TicketClosed { .. } => StatusCode::CONFLICT,
        OrdeskError::TicketNotFound(_)
        | OrdeskError::OrderNotFound(_)
        | OrdeskError::AgentNotFound(_) => StatusCode::NOT_FOUND,
        OrdeskError::Channel { .. } | OrdeskError::Crm { .. } => StatusCode::BAD_GATEWAY,
        OrdeskError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        OrdeskError::Config(_) | OrdeskError::Storage { .. } | OrdeskError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "request rejected");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
            retryable: self.0.is_retryable(),
        };
        (status, Json(body)).into_response()
    }
}
