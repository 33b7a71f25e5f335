// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the statistics endpoints against a mocked upstream

mod fixtures;

use axum::http::StatusCode;
use fixtures::{TestApp, blocks_listing, chain_stats, combined_stats, usage_stats};
use serde_json::Value;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path, query_param},
};

#[tokio::test]
async fn health_reports_configuration() {
    let app = TestApp::spawn(None).await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "up");
    assert_eq!(body["environment"], "testing");
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["tracked_chains"], serde_json::json!(["bitcoin", "ethereum"]));
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::spawn(None).await;

    let response = app.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn stats_are_ranked_by_market_cap() {
    let app = TestApp::spawn(None).await;
    app.mount_json("/stats", combined_stats()).await;

    let response = app.get("/v1/stats").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Vec<Value> = response.json().await.unwrap();
    let ids: Vec<_> = body.iter().map(|s| s["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["bitcoin", "litecoin", "ripple"]);
    assert_eq!(body[0]["blockNumber"], 840_000);
    assert_eq!(body[2]["blockLabel"], "Latest ledger");
    assert_eq!(body[2]["marketCapUsd"], 0.0);
}

#[tokio::test]
async fn chains_tolerate_partial_failure() {
    let app = TestApp::spawn(None).await;
    app.mount_json("/bitcoin/stats", chain_stats(840_000, 1.2e12))
        .await;
    app.mount_status("/ethereum/stats", 500).await;

    let response = app.get("/v1/chains").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    let chains = body["chains"].as_array().unwrap();
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0]["id"], "bitcoin");
    assert_eq!(chains[0]["feeUsd"], 1.5);
    assert_eq!(body["unavailable"], serde_json::json!(["ethereum"]));
}

#[tokio::test]
async fn single_chain_stats_are_normalized() {
    let app = TestApp::spawn(None).await;
    app.mount_json("/bitcoin/stats", chain_stats(840_000, 1.2e12))
        .await;

    let response = app.get("/v1/chains/bitcoin/stats").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], "bitcoin");
    assert_eq!(body["symbol"], "BTC");
    assert_eq!(body["blockLabel"], "Latest block");
    assert_eq!(body["marketCapUsd"], 1.2e12);
}

#[tokio::test]
async fn upstream_not_found_maps_to_404() {
    let app = TestApp::spawn(None).await;
    app.mount_status("/nosuchchain/stats", 404).await;

    let response = app.get("/v1/chains/nosuchchain/stats").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn persistent_server_errors_map_to_502() {
    let app = TestApp::spawn(None).await;
    app.mount_status("/bitcoin/stats", 500).await;

    let response = app.get("/v1/chains/bitcoin/stats").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "SERVER_ERROR");
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn invalid_chain_is_rejected_without_upstream_call() {
    let app = TestApp::spawn(None).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.upstream)
        .await;

    let response = app.get("/v1/chains/Bitcoin/stats").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/v1/chains/cross-chain/stats").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn block_listing_passes_limit() {
    let app = TestApp::spawn(None).await;
    Mock::given(method("GET"))
        .and(path("/bitcoin/blocks"))
        .and(query_param("limit", "2"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(blocks_listing()))
        .expect(1)
        .mount(&app.upstream)
        .await;

    let response = app.get("/v1/chains/bitcoin/blocks?limit=2").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Vec<Value> = response.json().await.unwrap();
    assert_eq!(body.len(), 2);
    assert_eq!(body[0]["id"], 840_001);
    assert_eq!(body[0]["transaction_count"], 3000);
}

#[tokio::test]
async fn block_listing_defaults_limit() {
    let app = TestApp::spawn(None).await;
    Mock::given(method("GET"))
        .and(path("/bitcoin/blocks"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(blocks_listing()))
        .expect(1)
        .mount(&app.upstream)
        .await;

    let response = app.get("/v1/chains/bitcoin/blocks").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn usage_without_key_is_unavailable() {
    let app = TestApp::spawn(None).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.upstream)
        .await;

    let response = app.get("/v1/usage").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "CREDENTIAL_REQUIRED");
}

#[tokio::test]
async fn usage_with_key_reports_percentages() {
    let app = TestApp::spawn(Some("test-key")).await;
    Mock::given(method("GET"))
        .and(path("/premium/stats"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(usage_stats()))
        .expect(1)
        .mount(&app.upstream)
        .await;

    let response = app.get("/v1/usage").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["plan"], "premium");
    assert_eq!(body["hourly_usage_pct"], 10.0);
    assert_eq!(body["daily_usage_pct"], 50.0);
}

#[tokio::test]
async fn address_dashboard_returns_data_section() {
    let app = TestApp::spawn(None).await;
    app.mount_json(
        "/bitcoin/dashboards/address/1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",
        serde_json::json!({
            "data": { "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa": { "address": { "balance": 5_000_000_000_u64 } } },
            "context": { "code": 200 }
        }),
    )
    .await;

    let response = app
        .get("/v1/chains/bitcoin/address/1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa")
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"]["address"]["balance"],
        5_000_000_000_u64
    );
}
