// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process;
use std::sync::Arc;

use session_token_service::{
    api::router,
    auth::{Clock, SigningKey, SystemClock},
    config::{LogFormat, ServerConfig, DEFAULT_LOG_FILTER},
    state::AppState,
    storage::{
        redb_store::DATABASE_FILE, ExpirySweeper, InMemoryRevocationStore, RedbRevocationStore,
        RevocationStore,
    },
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_env();
    init_tracing(config.as_ref().map(|c| c.log_format).unwrap_or_default());

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            process::exit(1);
        }
    };

    // One key per process; a bad secret is fatal
    let key = match SigningKey::from_secret(&config.auth.secret) {
        Ok(key) => key,
        Err(e) => {
            error!(error = %e, "Failed to derive signing key");
            process::exit(1);
        }
    };
    info!(fingerprint = key.fingerprint(), "Signing key loaded");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn RevocationStore> = match &config.data_dir {
        Some(dir) => match RedbRevocationStore::open(&dir.join(DATABASE_FILE), clock.clone()) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!(error = %e, path = %dir.display(), "Failed to open revocation database");
                process::exit(1);
            }
        },
        None => {
            warn!("DATA_DIR not set, revocation records will not survive a restart");
            Arc::new(InMemoryRevocationStore::new(clock.clone()))
        }
    };

    let shutdown = CancellationToken::new();
    let sweeper = ExpirySweeper::new(store.clone()).with_interval(config.sweep_interval);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.clone()));

    let state = AppState::new(key, &config.auth, store, clock);
    let app = router(state);

    let listener = match TcpListener::bind((config.host.as_str(), config.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, host = %config.host, port = config.port, "Failed to bind");
            process::exit(1);
        }
    };

    info!(
        host = %config.host,
        port = config.port,
        access_ttl_secs = config.auth.access_ttl.as_secs(),
        refresh_ttl_secs = config.auth.refresh_ttl.as_secs(),
        issuance_enabled = config.auth.issuer_api_key.is_some(),
        "Session token service listening (docs at /docs)"
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
    {
        error!(error = %e, "HTTP server failed");
    }

    shutdown.cancel();
    if let Err(e) = sweeper_handle.await {
        warn!(error = %e, "Revocation sweeper task ended abnormally");
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Resolves on Ctrl-C, cancelling background tasks.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}
