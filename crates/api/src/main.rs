//! API server entry point.

use std::sync::Arc;

use api::security::SaltedSha256Hasher;
use api::{AppState, Config};
use storage::PgStore;
use tokio::signal;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    api::telemetry::init_tracing(&config).expect("failed to initialize tracing");

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick the storage backend and build the application
    let hasher = SaltedSha256Hasher::default();
    let app = match config.database() {
        Some(database) => {
            let pool = match storage::connect_with_retry(&database, config.retry_policy()).await {
                Ok(pool) => pool,
                Err(err) => {
                    tracing::error!(error = %err, "unable to reach the database");
                    std::process::exit(1);
                }
            };
            let store = PgStore::new(pool);
            if config.run_migrations {
                if let Err(err) = store.run_migrations().await {
                    tracing::error!(error = %err, "migrations failed");
                    std::process::exit(1);
                }
                tracing::info!("migrations applied");
            }
            let state = AppState::postgres(config.app_name.clone(), store, hasher);
            api::create_app(Arc::new(state), metrics_handle)
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, using the in-memory backend");
            let state = AppState::in_memory(config.app_name.clone(), hasher);
            api::create_app(Arc::new(state), metrics_handle)
        }
    };

    // 4. Start server
    let addr = config.addr();
    tracing::info!(%addr, service = %config.app_name, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
