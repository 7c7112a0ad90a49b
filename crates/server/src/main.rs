//! Photoshare server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use photoshare_api::AppState;
use photoshare_common::{Config, LocalStorage, SharedStorage};
use tokio::signal;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photoshare=debug,tower_http=debug,sea_orm=info".into()),
        )
        .init();

    info!("Starting photoshare server...");

    let config = Config::load().context("Failed to load configuration")?;

    let db = photoshare_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    photoshare_db::migrate(&db).await?;
    info!("Migrations completed");

    let storage = LocalStorage::new(config.storage.base_path.clone());
    storage.init().await?;
    info!(path = %config.storage.base_path.display(), "Photo storage ready");
    let storage: SharedStorage = Arc::new(storage);

    let db = Arc::new(db);
    let state = AppState::new(
        Arc::clone(&db),
        storage,
        config.storage.file_extension.clone(),
    );

    let app = photoshare_api::app(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.server.max_upload_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http());

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server.host {}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, closing database connection");
    match Arc::try_unwrap(db) {
        Ok(db) => db.close().await?,
        Err(_) => info!("Database handle still shared, dropping instead of closing"),
    }

    Ok(())
}
