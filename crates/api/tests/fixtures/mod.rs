// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared setup for HTTP endpoint tests

#![allow(missing_docs, dead_code)]

use std::net::SocketAddr;

use api::{Server, ServerConfig, ShutdownConfig};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

/// A running server whose upstream is `upstream`
pub struct TestApp {
    pub addr: SocketAddr,
    pub upstream: MockServer,
    pub http: reqwest::Client,
    shutdown: CancellationToken,
}

impl TestApp {
    pub async fn spawn(api_key: Option<&str>) -> Self {
        let upstream = MockServer::start().await;

        let mut config = ServerConfig::for_testing();
        config.blockchair.base_url = upstream.uri();
        config.blockchair.api_key = api_key.map(ToString::to_string);
        config.blockchair.max_retries = 1;
        config.blockchair.base_delay_ms = 5;
        config.blockchair.chains = vec!["bitcoin".to_string(), "ethereum".to_string()];

        let (addr, shutdown) = Server::new(config, ShutdownConfig::default())
            .expect("Failed to create server")
            .run_for_testing()
            .await
            .expect("Failed to start test server");

        Self {
            addr,
            upstream,
            http: reqwest::Client::new(),
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.http
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn mount_json(&self, endpoint: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.upstream)
            .await;
    }

    pub async fn mount_status(&self, endpoint: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "data": null,
                "context": { "code": status, "error": "upstream failure" }
            })))
            .mount(&self.upstream)
            .await;
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

pub fn chain_stats(blocks: u64, market_cap: f64) -> Value {
    json!({
        "data": {
            "blocks": blocks,
            "best_block_time": "2024-05-01 12:00:00",
            "market_price_usd": 100.0,
            "market_cap_usd": market_cap,
            "average_transaction_fee_usd_24h": 1.5
        },
        "context": { "code": 200, "request_cost": 1 }
    })
}

pub fn combined_stats() -> Value {
    json!({
        "data": {
            "litecoin": {
                "data": {
                    "blocks": 2_700_000,
                    "best_block_time": "2024-05-01 12:00:00",
                    "market_price_usd": 80.0,
                    "market_cap_usd": 6.0e9
                }
            },
            "bitcoin": {
                "data": {
                    "blocks": 840_000,
                    "best_block_time": "2024-05-01 12:00:00",
                    "market_price_usd": 60_000.0,
                    "market_cap_usd": 1.2e12
                }
            },
            "ripple": {
                "data": {
                    "ledgers": 87_000_000,
                    "best_ledger_time": "2024-05-01 12:00:00",
                    "market_price_usd": 0.5
                }
            },
            "cross-chain": { "data": { "market_cap_usd": 2.4e12 } }
        },
        "context": { "code": 200 }
    })
}

pub fn blocks_listing() -> Value {
    json!({
        "data": [
            { "id": 840_001, "hash": "00000000000000000002a", "time": "2024-05-01 12:10:00", "transaction_count": 3000, "size": 1_500_000 },
            { "id": 840_000, "hash": "00000000000000000001b", "time": "2024-05-01 12:00:00" }
        ],
        "context": { "code": 200 }
    })
}

pub fn usage_stats() -> Value {
    json!({
        "data": {
            "requests_left": 9_000,
            "requests_per_hour": 1_000,
            "requests_per_hour_left": 900,
            "requests_per_day": 10_000,
            "requests_per_day_left": 5_000,
            "plan": "premium"
        },
        "context": { "code": 200 }
    })
}
