// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the statistics server,
//! including configuration, the upstream client, and coordinated cancellation.

use std::sync::Arc;

use api_client::CacheStats;
use external_apis::BlockchairClient;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::{Environment, ServerConfig};

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: ServerConfig,
    /// Upstream statistics client
    client: Arc<BlockchairClient>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `client` - Upstream statistics client
    /// * `cancellation_token` - Token for coordinated cancellation
    pub fn new(
        config: ServerConfig,
        client: Arc<BlockchairClient>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            client,
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Upstream statistics client
    pub fn client(&self) -> &Arc<BlockchairClient> {
        &self.client
    }

    /// Report service health without contacting the upstream API
    pub fn health_check(&self) -> HealthCheck {
        let status = if self.cancellation_token.is_cancelled() {
            HealthStatus::ShuttingDown
        } else {
            HealthStatus::Up
        };

        HealthCheck {
            status,
            version: Box::from(env!("CARGO_PKG_VERSION")),
            environment: self.config.environment,
            timestamp: chrono::Utc::now().to_rfc3339(),
            authenticated: self.client.has_api_key(),
            tracked_chains: self.client.config().chains.clone(),
            cache: self.client.cache_stats(),
        }
    }
}

/// Health status of the service
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Service is accepting requests
    Up,
    /// Shutdown has been requested
    ShuttingDown,
}

/// Health check status
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    /// Service status
    pub status: HealthStatus,
    /// Service version
    pub version: Box<str>,
    /// Environment
    pub environment: Environment,
    /// Timestamp
    pub timestamp: String,
    /// Whether upstream requests carry an API key
    pub authenticated: bool,
    /// Chains served by the aggregate endpoint
    pub tracked_chains: Vec<String>,
    /// Response cache counters
    pub cache: CacheStats,
}
