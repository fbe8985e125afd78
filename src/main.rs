//! Server binary: loads settings, prepares the database, serves the API until shutdown.

use qc_records::{app, ensure_database_exists, ensure_schema, AppState, CorsPolicy, PgStore, RecordStore, Settings, TokenIssuer};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("qc_records=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    if settings.create_database {
        ensure_database_exists(&settings.database_url).await?;
    }
    let store = PgStore::connect(
        &settings.database_url,
        settings.db_max_connections,
        settings.db_acquire_timeout,
    )
    .await?;
    ensure_schema(store.pool()).await?;

    let store = Arc::new(store);
    let state = AppState::new(
        store.clone(),
        TokenIssuer::new(&settings.jwt_secret, settings.token_ttl_minutes),
        settings.password_min_length,
    );
    let router = app(state, CorsPolicy::new(settings.allowed_origins.clone()));

    let listener = TcpListener::bind(settings.bind_addr()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}
