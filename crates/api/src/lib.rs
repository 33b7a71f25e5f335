// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Chain statistics HTTP server
//!
//! This crate exposes the Blockchair statistics client over HTTP, built with Axum
//! and designed for production use with hierarchical configuration, request
//! tracing, and graceful shutdown.
//!
//! # Module Structure
//!
//! - [`config`]: Server and upstream configuration with hierarchical loading
//! - [`error`]: Error types and HTTP response mapping of upstream failures
//! - [`state`]: Shared application state holding the upstream client
//! - [`server`]: Main server implementation, lifecycle, and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//!
//! # Endpoints
//!
//! - `GET /health`
//! - `GET /v1/stats`: every chain the upstream reports, ranked by market cap
//! - `GET /v1/chains`: configured chains fetched concurrently
//! - `GET /v1/chains/{chain}/stats`
//! - `GET /v1/chains/{chain}/blocks?limit=`
//! - `GET /v1/chains/{chain}/transactions?limit=`
//! - `GET /v1/chains/{chain}/address/{address}`
//! - `GET /v1/chains/{chain}/transaction/{hash}`
//! - `GET /v1/usage`: quota usage, requires an API key

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{BlockchairSettings, Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{Server, ShutdownConfig};
pub use state::{HealthCheck, ServerState};
