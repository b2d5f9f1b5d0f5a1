//! medibridge-server: HTTP server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;

use medibridge_server::config::Config;
use medibridge_server::db::{ConnectionManager, DocumentStore, SharedStore};

#[tokio::main]
async fn main() {
    // A missing .env file is fine; real environment variables still apply
    let _ = dotenvy::dotenv();

    let config = Config::from_env();

    let _log_guard =
        medibridge_server::logging::init_logging(&config).expect("Failed to initialize logging");

    // Create the pool; connections are opened lazily
    let manager = ConnectionManager::new(&config.store_config())
        .expect("Failed to create database pool");

    // Connect and provision indexes now so the first request doesn't pay for it.
    // An unreachable store is not fatal: the next operation retries.
    match manager.ping().await {
        Ok(()) => tracing::info!("Document store ready"),
        Err(e) => tracing::warn!(error = %e, "Document store not reachable at startup"),
    }

    tracing::info!(
        connect_timeout_secs = config.connect_timeout.as_secs(),
        read_timeout_ms = config.read_timeout.as_millis() as u64,
        max_connections = config.max_connections,
        "Document store configured"
    );

    let store: SharedStore = Arc::new(manager);
    let app = medibridge_server::build_app(store, &config);

    // Start server
    let addr: SocketAddr = config.bind_address.parse().expect("Invalid bind address");
    tracing::info!("Starting medibridge server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server shutdown complete");
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
