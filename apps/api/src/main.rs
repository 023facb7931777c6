mod compose;
mod config;
mod delivery;
mod errors;
mod models;
mod render;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{BackendKind, Config};
use crate::render::{ChromiumLauncher, DocumentRenderer};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{ArtifactStore, FsBackend, MemoryBackend, S3Backend, StorageBackend};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed or missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // Artifact storage
    let backend = build_backend(&config).await?;
    let store = ArtifactStore::start(config.store_config(), backend);

    // Headless renderer
    let launcher = Arc::new(ChromiumLauncher::new(config.chrome_executable.clone()));
    let renderer = Arc::new(DocumentRenderer::new(launcher, config.renderer_config()));
    info!(
        "Renderer: max_concurrency={}, quiescence_timeout={}s, page_size={:?}",
        config.render_max_concurrency,
        config.render_quiescence_timeout.as_secs(),
        config.page_size
    );

    let state = AppState::new(config.clone(), renderer, store);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn build_backend(config: &Config) -> Result<Arc<dyn StorageBackend>> {
    Ok(match config.backend {
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
        BackendKind::Fs => Arc::new(FsBackend::open(&config.artifact_dir).await?),
        BackendKind::S3 => {
            let settings = config
                .s3
                .as_ref()
                .context("S3 backend selected without S3 settings")?;
            Arc::new(S3Backend::connect(settings).await)
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
