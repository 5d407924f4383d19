use std::net::SocketAddr;
use std::sync::Arc;

use console_service::{
    build_router,
    config::ConsoleConfig,
    services::{IdentityClient, MongoStore},
    AppState,
};
use console_core::observability::logging::init_tracing;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), console_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = ConsoleConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting console service"
    );

    tracing::info!("Initializing document store");
    let store = MongoStore::connect(&config.mongodb.uri, &config.mongodb.database)
        .await
        .map_err(console_core::error::AppError::DatabaseError)?;

    store
        .initialize_indexes()
        .await
        .map_err(console_core::error::AppError::DatabaseError)?;
    tracing::info!("Document store initialized successfully");

    let identity = IdentityClient::new(&config.identity)?;
    tracing::info!("Identity client initialized");

    let state = AppState::new(config.clone(), Arc::new(store), Arc::new(identity));

    let app = build_router(state).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
