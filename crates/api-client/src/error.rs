// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Failure classification for upstream API calls
//!
//! Every failed exchange with the statistics API is reduced to a
//! [`ClassifiedError`] once, at the point where it is observed. The retry
//! controller reads [`ClassifiedError::retryable`] from that value; it never
//! inspects transport internals.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// HTTP 400
    BadRequest,
    /// HTTP 401
    Unauthorized,
    /// HTTP 403
    Forbidden,
    /// HTTP 404
    NotFound,
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx other than 502 and 503
    ServerError,
    /// HTTP 502
    BadGateway,
    /// HTTP 503
    ServiceUnavailable,
    /// No HTTP status (connection, DNS, timeout) or an unmapped status
    NetworkError,
    /// A premium endpoint was called without a configured API key
    CredentialRequired,
    /// A successful response whose body could not be interpreted
    InvalidResponse,
}

impl ErrorKind {
    /// Map an HTTP status code to its kind
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            502 => Self::BadGateway,
            503 => Self::ServiceUnavailable,
            500..=599 => Self::ServerError,
            _ => Self::NetworkError,
        }
    }

    /// Whether a failure of this kind may succeed when attempted again
    pub const fn is_retryable(self) -> bool {
        !matches!(
            self,
            Self::BadRequest
                | Self::Unauthorized
                | Self::Forbidden
                | Self::NotFound
                | Self::CredentialRequired
                | Self::InvalidResponse
        )
    }

    /// Stable code string
    pub const fn code(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::ServerError => "SERVER_ERROR",
            Self::BadGateway => "BAD_GATEWAY",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::NetworkError => "NETWORK_ERROR",
            Self::CredentialRequired => "CREDENTIAL_REQUIRED",
            Self::InvalidResponse => "INVALID_RESPONSE",
        }
    }

    /// Message suitable for showing to an end user
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::BadRequest => "Invalid request. Please check your parameters.",
            Self::Unauthorized => "Authentication required. Please check your API key.",
            Self::Forbidden => "Access forbidden. You may have exceeded rate limits.",
            Self::NotFound => "Blockchain or resource not found.",
            Self::RateLimited => "Rate limit exceeded. Please try again later.",
            Self::ServerError => "Server error. Please try again later.",
            Self::BadGateway => "Bad gateway. The service may be temporarily unavailable.",
            Self::ServiceUnavailable => "Service unavailable. Please try again later.",
            Self::NetworkError => "Network error. Please check your connection and try again.",
            Self::CredentialRequired => "An API key is required for this endpoint.",
            Self::InvalidResponse => "The service returned an unexpected response.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A failure reduced to its kind, status and retry decision
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    /// Failure category
    pub kind: ErrorKind,
    /// HTTP status, absent for network-level failures
    pub status: Option<u16>,
    /// Whether the failed operation may be attempted again
    pub retryable: bool,
    /// User-facing message
    pub message: String,
    /// Technical detail for logs
    #[serde(skip)]
    pub detail: Option<String>,
}

impl ClassifiedError {
    fn new(kind: ErrorKind, status: Option<u16>, message: String, detail: Option<String>) -> Self {
        Self {
            kind,
            status,
            retryable: kind.is_retryable(),
            message,
            detail,
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let kind = ErrorKind::from_status(status);
        Self::new(
            kind,
            Some(status),
            kind.user_message().to_string(),
            Some(detail.into()),
        )
    }

    /// Classify a failure that produced no HTTP status
    pub fn network(detail: impl Into<String>) -> Self {
        let kind = ErrorKind::NetworkError;
        Self::new(
            kind,
            None,
            kind.user_message().to_string(),
            Some(detail.into()),
        )
    }

    /// A premium endpoint was invoked without credentials
    pub fn credential_required(endpoint: &str) -> Self {
        Self::new(
            ErrorKind::CredentialRequired,
            None,
            format!("API key is required for {endpoint}"),
            None,
        )
    }

    /// A response body did not have the expected shape
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidResponse, None, message.into(), None)
    }

    /// Attach technical detail for logs
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
