// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `waypin serve` command implementation.
//!
//! Opens the SQLite backend, builds the geocoding gateway and serves the HTTP
//! surface until SIGINT/SIGTERM. Storage is checkpointed and closed on the way
//! out, whether or not the server stopped cleanly.

use tracing::{error, info};
use waypin_bus::EventBus;
use waypin_config::model::WaypinConfig;
use waypin_core::{PluginAdapter, StorageAdapter, WaypinError};
use waypin_gateway::{GatewayState, ServerConfig, start_server};
use waypin_geocode::GeocodeGateway;
use waypin_storage::{FsAvatarStore, SqliteStorage};

use crate::shutdown;

pub async fn run_serve(config: WaypinConfig) -> Result<(), WaypinError> {
    init_tracing(&config.app.log_level);

    info!(name = %config.app.name, "starting waypin serve");

    let bus = EventBus::new(config.sync.event_buffer);
    let storage = SqliteStorage::new(config.storage.clone(), bus);
    storage.initialize().await?;

    let geocoder = GeocodeGateway::from_config(&config.geocode)?;
    let avatars = FsAvatarStore::from_config(&config.storage);
    let state = GatewayState::new(geocoder).with_avatar_dir(avatars.dir());

    let cancel = shutdown::install_signal_handler();
    let served = start_server(&ServerConfig::from(&config.gateway), state, cancel).await;
    if let Err(e) = &served {
        error!(error = %e, "gateway stopped with an error");
    }

    storage.close().await?;
    storage.shutdown().await?;
    info!("waypin serve stopped");
    served
}

/// Initializes the tracing subscriber, honouring `RUST_LOG` when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("waypin={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
