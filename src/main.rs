use std::future::IntoFuture;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use nexo_api::app::{app, AppState};
use nexo_api::config::AppConfig;
use nexo_api::database::DatabaseManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DB_* and JWT_SECRET
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("invalid configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();
    tracing::info!("Starting Nexo API in {:?} mode", config.environment);

    let db = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    db.migrate(config.environment)
        .await
        .context("failed to run migrations")?;

    let state = AppState::postgres(&config, &db).context("invalid JWT configuration")?;
    let app = app(state, &config.server);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Nexo API listening on http://{}", bind_addr);

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = stop_rx.changed().await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result.context("server error")?,
        () = shutdown_signal() => {
            tracing::info!("Shutdown signal received, draining connections");
            let _ = stop_tx.send(true);
            drain(server, config.server.shutdown_grace()).await?;
        }
    }

    db.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

/// Let in-flight requests finish, giving up after `grace`
async fn drain<F>(server: F, grace: Duration) -> anyhow::Result<()>
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match tokio::time::timeout(grace, server).await {
        Ok(result) => result.context("server error"),
        Err(_) => {
            tracing::warn!("Grace period of {:?} elapsed, exiting with open connections", grace);
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
