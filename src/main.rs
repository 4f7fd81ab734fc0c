use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use souk::api::middleware::session::{create_session_layer, AppState};
use souk::config::Config;
use souk::db;
use souk::jobs;
use souk::services::mailer::Mailer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "souk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting souk server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create session layer
    let session_layer = create_session_layer(pool.clone()).await?;
    tracing::info!("Session layer initialized");

    // Mail transport for the subscription sweeps
    let mailer = Arc::new(Mailer::from_config(&config));

    // Register the daily maintenance sweeps
    let mut scheduler =
        jobs::start_scheduler(pool.clone(), mailer.clone(), &config.cron_schedule).await?;

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        mailer,
    };

    // Build router
    let mut app = Router::new()
        .merge(souk::api::health::router())
        .merge(souk::api::reviews::router())
        .merge(souk::api::banners::router())
        .merge(souk::api::content::router())
        .merge(souk::api::contact::router());

    if config.enable_test_routes {
        tracing::warn!("Test cron trigger routes are enabled");
        app = app.merge(souk::api::cron::router());
    }

    let app = app
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    // Start server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Scheduler shutdown failed");
    }

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, cleaning up...");
}
