// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides error types for server operations,
//! including HTTP response mapping for upstream failures.

use std::net::SocketAddr;

use api_client::{ClassifiedError, ErrorKind};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::warn;

/// Error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Task join errors for async operations
    #[error("Task join error: {source}")]
    TaskJoin {
        /// Underlying tokio join error
        #[source]
        source: tokio::task::JoinError,
    },

    /// Input validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The statistics API call failed
    #[error("Upstream error: {0}")]
    Upstream(#[from] ClassifiedError),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// HTTP status returned to callers for an upstream failure of `kind`
pub fn upstream_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::CredentialRequired | ErrorKind::ServiceUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorKind::Unauthorized
        | ErrorKind::Forbidden
        | ErrorKind::ServerError
        | ErrorKind::BadGateway
        | ErrorKind::NetworkError
        | ErrorKind::InvalidResponse => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, json_body) = match &self {
            ServerError::Config { .. }
            | ServerError::Bind { .. }
            | ServerError::Startup { .. }
            | ServerError::Shutdown { .. }
            | ServerError::TaskJoin { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({
                    "error": self.to_string(),
                    "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16()
                }),
            ),
            ServerError::ValidationError(..) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": self.to_string(),
                    "status": StatusCode::BAD_REQUEST.as_u16()
                }),
            ),
            ServerError::Upstream(error) => {
                let status = upstream_status(error.kind);
                warn!(
                    kind = %error.kind,
                    upstream_status = ?error.status,
                    detail = ?error.detail,
                    "upstream request failed"
                );
                (
                    status,
                    serde_json::json!({
                        "error": error.message,
                        "code": error.kind.code(),
                        "retryable": error.retryable,
                        "status": status.as_u16()
                    }),
                )
            }
        };

        let body = Json(json_body);
        (status, body).into_response()
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(source: tokio::task::JoinError) -> Self {
        Self::TaskJoin { source }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn upstream_kinds_map_to_http_status() {
        assert_eq!(upstream_status(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(upstream_status(ErrorKind::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            upstream_status(ErrorKind::CredentialRequired),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(upstream_status(ErrorKind::Unauthorized), StatusCode::BAD_GATEWAY);
        assert_eq!(upstream_status(ErrorKind::NetworkError), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn upstream_error_body_hides_detail() {
        let error = ClassifiedError::from_status(404, "no such chain: secret-detail");
        let response = ServerError::from(error).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["retryable"], false);
        assert_eq!(body["status"], 404);
        assert!(!body.to_string().contains("secret-detail"));
    }

    #[tokio::test]
    async fn validation_error_is_bad_request() {
        let response = ServerError::ValidationError("bad chain".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Validation error: bad chain");
    }
}
