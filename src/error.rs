// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Errors surfaced by the request gateway.

use serde_json::Value;

use crate::storage::StorageError;

/// Error returned by [`crate::gateway::RequestGateway::dispatch`].
///
/// `AuthExpired` is the 401 case of `Http`. By the time a caller sees it the
/// session has already been torn down and the redirect issued; callers should
/// skip their own error rendering.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered outside the success set
    #[error("Request failed with HTTP {status}")]
    Http { status: u16, body: Value },

    /// The server answered 401; session teardown already ran
    #[error("Session expired or rejected (HTTP 401)")]
    AuthExpired { body: Value },

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A success payload did not match the requested type
    #[error("Unexpected response payload: {0}")]
    UnexpectedPayload(#[from] serde_json::Error),

    /// Session storage failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl GatewayError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Network(_) => "network_error",
            GatewayError::Http { .. } => "http_error",
            GatewayError::AuthExpired { .. } => "auth_expired",
            GatewayError::InvalidRequest(_) => "invalid_request",
            GatewayError::UnexpectedPayload(_) => "unexpected_payload",
            GatewayError::Storage(e) => e.error_code(),
        }
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Http { status, .. } => Some(*status),
            GatewayError::AuthExpired { .. } => Some(401),
            _ => None,
        }
    }

    /// Response body of the failed response, if there was one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            GatewayError::Http { body, .. } | GatewayError::AuthExpired { body } => Some(body),
            _ => None,
        }
    }

    /// Whether the session was torn down because of this error.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, GatewayError::AuthExpired { .. })
    }

    /// Best-effort user-facing text: the server's `message`/`error` field when
    /// present, otherwise the error's own description.
    pub fn user_message(&self) -> String {
        self.body()
            .and_then(|body| {
                body.get("message")
                    .or_else(|| body.get("error"))
                    .and_then(Value::as_str)
            })
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }
}
