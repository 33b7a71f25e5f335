// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP server lifecycle
//!
//! [`Server`] owns the router and one shared [`BlockchairClient`]. Shutdown is
//! driven by a `CancellationToken` that a signal listener, [`Server::shutdown`]
//! or a test can cancel; once it fires the listener stops accepting and
//! in-flight requests get [`ShutdownConfig::graceful_timeout`] to finish.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderName, Request},
};
use external_apis::BlockchairClient;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn};

use crate::{
    config::ServerConfig,
    error::{ServerError, ServerResult},
    routes::create_routes,
    state::ServerState,
};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;

/// Shutdown behaviour
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Time in-flight requests get to finish once shutdown starts
    pub graceful_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Chain statistics HTTP server
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    router: Router,
    state: ServerState,
    cancellation_token: CancellationToken,
    shutdown_config: ShutdownConfig,
}

impl Server {
    /// Build the server and its upstream client from `config`
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the upstream client cannot be built.
    pub fn new(config: ServerConfig, shutdown_config: ShutdownConfig) -> ServerResult<Self> {
        let client = BlockchairClient::new(config.blockchair.client_config()).map_err(|e| {
            ServerError::Config {
                message: format!("failed to create statistics client: {e}"),
            }
        })?;
        Ok(Self::with_client(config, shutdown_config, Arc::new(client)))
    }

    /// Build the server around an existing client
    pub fn with_client(
        config: ServerConfig,
        shutdown_config: ShutdownConfig,
        client: Arc<BlockchairClient>,
    ) -> Self {
        let cancellation_token = CancellationToken::new();
        let state = ServerState::new(config.clone(), client, cancellation_token.child_token());
        let router = Self::create_router(state.clone());

        Self {
            config,
            router,
            state,
            cancellation_token,
            shutdown_config,
        }
    }

    fn create_router(state: ServerState) -> Router {
        let request_timeout = state.config().timeout_seconds.value();

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(CorsLayer::permissive())
            .layer(TimeoutLayer::new(request_timeout));

        create_routes().layer(middleware).with_state(state)
    }

    async fn bind(&self) -> ServerResult<(TcpListener, SocketAddr)> {
        let address = self.config.socket_addr();
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;
        let local = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;
        Ok((listener, local))
    }

    /// Serve until a shutdown signal or [`Server::shutdown`]
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` or `ServerError::Startup` if the listener
    /// cannot be set up, or `ServerError::Shutdown` if serving fails.
    pub async fn run(self) -> ServerResult<()> {
        let (listener, local) = self.bind().await?;

        info!(
            address = %local,
            environment = %self.config.environment,
            chains = ?self.config.blockchair.chains,
            authenticated = self.state.client().has_api_key(),
            "chain statistics server listening",
        );

        tokio::spawn(cancel_on_signal(self.cancellation_token.clone()));

        let stop_accepting = self.cancellation_token.clone();
        let router = self.router;
        let mut serving = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    stop_accepting.cancelled().await;
                    info!("no longer accepting connections");
                })
                .await
        });

        let grace = self.shutdown_config.graceful_timeout;
        let served = tokio::select! {
            joined = &mut serving => joined?,
            () = self.cancellation_token.cancelled() => {
                if let Ok(joined) = tokio::time::timeout(grace, &mut serving).await {
                    joined?
                } else {
                    warn!(grace_seconds = grace.as_secs(), "requests still running after grace period, aborting");
                    serving.abort();
                    Ok(())
                }
            }
        };

        served.map_err(|source| {
            error!(error = %source, "server terminated with an error");
            ServerError::Shutdown { source }
        })?;
        info!("chain statistics server drained");
        Ok(())
    }

    /// Token that stops the server when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Request a graceful shutdown
    pub fn shutdown(&self) {
        info!("shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Serve in the background without signal handling
    ///
    /// Returns the bound address and a token that stops the server.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` or `ServerError::Startup` if the listener
    /// cannot be set up.
    pub async fn run_for_testing(self) -> ServerResult<(SocketAddr, CancellationToken)> {
        let (listener, local) = self.bind().await?;
        let stop = self.cancellation_token.clone();
        let router = self.router;
        tokio::spawn(async move {
            let stopped = stop.clone();
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(async move { stopped.cancelled().await })
                .await
            {
                warn!(error = %e, "test server stopped with an error");
            }
        });
        Ok((local, self.cancellation_token))
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Shared request state
    pub fn state(&self) -> &ServerState {
        &self.state
    }
}

fn request_span<B>(request: &Request<B>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");
    info_span!(
        "http_request",
        request_id,
        method = %request.method(),
        path = %request.uri().path()
    )
}

/// Cancel `token` on SIGINT or SIGTERM, or return once it is cancelled elsewhere
async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        signal = wait_for_signal() => {
            warn!(signal, "shutdown signal received");
            token.cancel();
        }
        () = token.cancelled() => {}
    }
}

#[cfg(unix)]
#[allow(clippy::expect_used)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate()).expect("SIGTERM handler");
    let mut interrupt = signal(SignalKind::interrupt()).expect("SIGINT handler");
    tokio::select! {
        _ = terminate.recv() => "SIGTERM",
        _ = interrupt.recv() => "SIGINT",
    }
}

#[cfg(not(unix))]
#[allow(clippy::expect_used)]
async fn wait_for_signal() -> &'static str {
    tokio::signal::ctrl_c().await.expect("CTRL+C handler");
    "CTRL+C"
}

#[cfg(test)]
mod tests {
    use api_client::ResponseCache;
    use external_apis::BlockchairConfig;

    use super::*;
    use crate::config::{Environment, ServerPort};

    #[tokio::test]
    async fn injected_client_is_shared_with_state() {
        let config = ServerConfig::for_testing();
        let client = Arc::new(
            BlockchairClient::with_cache(
                BlockchairConfig {
                    api_key: Some("injected".to_string()),
                    ..config.blockchair.client_config()
                },
                Arc::new(ResponseCache::new()),
            )
            .unwrap(),
        );

        let server = Server::with_client(config, ShutdownConfig::default(), Arc::clone(&client));

        assert!(Arc::ptr_eq(server.state().client(), &client));
        assert!(server.state().client().has_api_key());
        assert_eq!(server.config().environment, Environment::Testing);
    }

    #[tokio::test]
    async fn shutdown_reaches_request_state() {
        let server = Server::new(ServerConfig::for_testing(), ShutdownConfig::default()).unwrap();
        assert!(!server.state().cancellation_token.is_cancelled());

        server.shutdown();

        assert!(server.state().cancellation_token.is_cancelled());
    }

    #[tokio::test]
    async fn run_returns_once_cancelled() {
        let server = Server::new(
            ServerConfig::for_testing(),
            ShutdownConfig {
                graceful_timeout: Duration::from_secs(1),
            },
        )
        .unwrap();
        let token = server.cancellation_token();
        let running = tokio::spawn(server.run());

        token.cancel();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn occupied_port_is_a_bind_error() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let mut config = ServerConfig::for_testing();
        config.port = ServerPort::new(port, Environment::Testing).unwrap();
        let server = Server::new(config, ShutdownConfig::default()).unwrap();

        let result = server.run().await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }
}
