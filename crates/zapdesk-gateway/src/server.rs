// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway. The
//! router is built separately from the listener so tests can drive it
//! without binding a port.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use zapdesk_core::ZapdeskError;
use zapdesk_pipeline::{ChannelRules, ContactResolver};
use zapdesk_storage::Database;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;
use crate::media::MediaFetcher;

/// One configured channel: where its rows live and how to read them.
#[derive(Debug, Clone)]
pub struct ChannelRoute {
    /// Channel id as it appears in URLs and conversation ids.
    pub id: String,
    /// Human-facing name shown by the dashboard.
    pub label: String,
    /// Backing SQLite table.
    pub table: String,
    /// Sender-role vocabulary for this channel.
    pub rules: ChannelRules,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Storage handle; all queries go through its background connection.
    pub db: Database,
    /// Process-wide contact name cache.
    pub resolver: Arc<ContactResolver>,
    /// Configured channels, in configuration order.
    pub channels: Arc<Vec<ChannelRoute>>,
    /// Media downloader for webhook attachments.
    pub media: MediaFetcher,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

impl GatewayState {
    /// Look up a channel by id.
    pub fn channel(&self, id: &str) -> Option<&ChannelRoute> {
        self.channels.iter().find(|c| c.id == id)
    }
}

/// Gateway server configuration (mirrors ServerConfig from zapdesk-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the gateway router.
///
/// Routes:
/// - GET /health (no auth)
/// - POST /webhook/{channel} (with auth)
/// - GET /v1/channels (with auth)
/// - GET /v1/conversations/{channel} (with auth)
/// - GET /v1/conversations/{channel}/{phone}/messages (with auth)
/// - POST /v1/conversations/{id}/status (with auth)
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    // Unauthenticated public route (health for probes and dashboards).
    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .with_state(state.clone());

    // Routes requiring authentication. The conversation routes share the
    // {id} segment name (the router wants one parameter name per position).
    let api_routes = Router::new()
        .route("/webhook/{channel}", post(handlers::post_webhook))
        .route("/v1/channels", get(handlers::get_channels))
        .route("/v1/conversations/{id}", get(handlers::get_conversations))
        .route(
            "/v1/conversations/{id}/{phone}/messages",
            get(handlers::get_messages),
        )
        .route(
            "/v1/conversations/{id}/status",
            post(handlers::post_status),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server.
///
/// Binds to the configured host:port and serves until `shutdown` is
/// cancelled; in-flight requests drain before return.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), ZapdeskError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ZapdeskError::Gateway {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| ZapdeskError::Gateway {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
