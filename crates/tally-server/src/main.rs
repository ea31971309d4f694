mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use tally_api::AppStateInner;
use tally_db::{Database, MemoryStore, RedisStore, Store};

use crate::config::{Backend, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug,tally_api=debug,tally_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    match config.backend {
        Backend::Redis => {
            let store = RedisStore::connect(&config.redis_url).await?;
            serve(store, &config).await
        }
        Backend::Memory => {
            warn!("Using the in-memory store, data will not survive a restart");
            serve(MemoryStore::new(), &config).await
        }
    }
}

async fn serve<S: Store>(store: S, config: &Config) -> anyhow::Result<()> {
    let db = Database::new(store).with_queue_capacity(config.queue_capacity);
    let state = Arc::new(AppStateInner {
        db,
        block_timeout: config.block_timeout,
        max_block_timeout: config.max_block_timeout,
    });

    let app = tally_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Tally listening on {} ({:?} backend)", addr, config.backend);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
