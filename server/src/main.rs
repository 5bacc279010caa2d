//! Gatepass HTTP server.
//!
//! Event entry passes: registration, signed QR credentials and gate admission.

use anyhow::Context;
use gatepass_postgres::PostgresRegistrantRepository;
use gatepass_server::{Config, build_state};
use gatepass_web::{InMemoryRateLimiter, build_router};
use metrics_exporter_prometheus::PrometheusBuilder;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gatepass_server=info,gatepass_web=info,gatepass_core=info,gatepass_postgres=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Gatepass HTTP Server");

    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        address = %config.bind_address(),
        metrics = %config.server.metrics_addr,
        cors_origins = ?config.server.cors_origins,
        trust_proxy_headers = config.server.trust_proxy_headers,
        "Configuration loaded"
    );

    // Metrics exporter
    PrometheusBuilder::new()
        .with_http_listener(config.server.metrics_addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    gatepass_web::metrics::register_metrics();
    info!("Prometheus exporter listening");

    // Database
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    let repository = Arc::new(PostgresRegistrantRepository::new(pool));
    repository.migrate().await.context("Failed to run migrations")?;
    info!("Database connected and migrated");

    // Services
    let rate_limiter = Arc::new(InMemoryRateLimiter::new());
    spawn_rate_limit_purge(Arc::clone(&rate_limiter), config.registration_limit().window);

    let state = build_state(&config, repository, rate_limiter)
        .context("Failed to assemble services")?;

    // Build router
    let app = build_router(state, &config.router());

    // Create TCP listener
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

/// Periodically drop rate limit entries older than the window.
fn spawn_rate_limit_purge(limiter: Arc<InMemoryRateLimiter>, window: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(window.max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            let removed = limiter.purge(window);
            if removed > 0 {
                tracing::debug!(removed, remaining = limiter.tracked_keys(), "Purged rate limit entries");
            }
        }
    });
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
