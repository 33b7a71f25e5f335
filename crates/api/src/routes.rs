// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration and handlers for the statistics server.

pub mod handlers;

use axum::{Router, routing::get};
use handlers::{
    address_handler, blocks_handler, chain_stats_handler, chains_handler, health_handler,
    stats_handler, transaction_handler, transactions_handler, usage_handler,
};

use crate::state::ServerState;

/// Create application routes
pub fn create_routes() -> Router<ServerState> {
    let health_routes = Router::new().route("/health", get(health_handler));

    let api_routes = Router::new()
        .route("/stats", get(stats_handler))
        .route("/chains", get(chains_handler))
        .route("/chains/{chain}/stats", get(chain_stats_handler))
        .route("/chains/{chain}/blocks", get(blocks_handler))
        .route("/chains/{chain}/transactions", get(transactions_handler))
        .route("/chains/{chain}/address/{address}", get(address_handler))
        .route("/chains/{chain}/transaction/{hash}", get(transaction_handler))
        .route("/usage", get(usage_handler));

    let v1 = Router::new().nest("/v1", api_routes);

    Router::new().merge(health_routes).merge(v1)
}
