// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::path::PathBuf;
use std::time::Instant;

use axum::{Router, routing::get};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use waypin_config::model::GatewayConfig;
use waypin_core::WaypinError;
use waypin_geocode::GeocodeGateway;

use crate::handlers;

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl HealthState {
    pub fn now() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Primary-then-secondary place resolution.
    pub geocoder: GeocodeGateway,
    pub health: HealthState,
    /// Directory served under `/avatars`. `None` disables the route.
    pub avatar_dir: Option<PathBuf>,
}

impl GatewayState {
    pub fn new(geocoder: GeocodeGateway) -> Self {
        Self {
            geocoder,
            health: HealthState::now(),
            avatar_dir: None,
        }
    }

    pub fn with_avatar_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.avatar_dir = Some(dir.into());
        self
    }
}

/// Bind address for the gateway.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Build the gateway router:
/// - GET /health
/// - GET /geocode?q=
/// - GET /avatars/{object} (when an avatar directory is set)
pub fn router(state: GatewayState) -> Router {
    let avatar_dir = state.avatar_dir.clone();

    let mut app = Router::new()
        .route("/health", get(handlers::get_public_health))
        .route("/geocode", get(handlers::get_geocode))
        .with_state(state);

    if let Some(dir) = avatar_dir {
        app = app.nest_service("/avatars", ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server and serve until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), WaypinError> {
    let app = router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WaypinError::Server {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| WaypinError::Server {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway server stopped");
    Ok(())
}
