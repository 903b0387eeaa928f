use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use starship_inventory::{
    build_router,
    config::{AppConfig, DataSource},
    gateway::StarshipGateway,
    seed::{SeedLoader, SwapiClient},
    storage::{RecordStore, StarshipStore},
    web::{AppState, Views},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::parse();

    let store: Arc<dyn RecordStore> = match config.data_source().map_err(|e| anyhow!(e))? {
        DataSource::Memory => {
            info!("store: in-memory");
            Arc::new(StarshipStore::in_memory())
        }
        DataSource::File(path) => {
            info!(path = %path.display(), "store: snapshot file");
            Arc::new(
                StarshipStore::open(&path)
                    .with_context(|| format!("failed to open store at {}", path.display()))?,
            )
        }
    };

    // Ctrl+C during the remote fetch abandons it in favour of the fallback.
    let cancel = CancellationToken::new();
    let seed_guard = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    let mut loader = SeedLoader::new(store.clone());
    if config.offline_seed {
        info!("remote seeding disabled");
    } else {
        match SwapiClient::new(config.swapi()) {
            Ok(client) => loader = loader.with_remote(Arc::new(client)),
            Err(err) => warn!(error = %err, "catalog client unavailable, seeding offline"),
        }
    }
    let outcome = loader
        .run(&cancel)
        .await
        .context("failed to seed starship store")?;
    info!(source = outcome.source(), ?outcome, "seed step finished");

    if cancel.is_cancelled() {
        info!("shutdown requested during startup");
        return Ok(());
    }
    seed_guard.abort();

    let views = Views::new().context("failed to load page templates")?;
    let app = build_router(AppState::new(StarshipGateway::new(store), views));

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, "starship inventory started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("starship_inventory=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resolves once the process is asked to stop: Ctrl+C anywhere, SIGTERM on Unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = sigterm.recv() => info!("received SIGTERM"),
                }
                return;
            }
            Err(err) => warn!(error = %err, "SIGTERM handler unavailable, listening for Ctrl+C only"),
        }
    }

    ctrl_c().await;
}

/// Never resolves when the handler cannot be installed.
async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C"),
        Err(err) => {
            error!(error = %err, "unable to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
