//! Thread Sheet Sync
//!
//! Mirrors forum threads posted by a chat-platform bridge into one spreadsheet row per thread.

mod api;
mod auth;
mod config;
mod errors;
mod models;
mod sheets;
mod worker;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat};
use sheets::{GoogleSheetsClient, SheetSync};
use worker::{SharedStatus, SyncQueue};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub queue: SyncQueue,
    pub status: SharedStatus,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    tracing::info!("Starting Thread Sheet Sync");
    tracing::info!("Workbook: {}", config.workbook_key);
    tracing::info!("Sheet title: {}", config.sheet_title);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (SYNC_API_PSK). Authentication is disabled!");
    }
    if config.access_token.is_none() {
        tracing::warn!("No spreadsheet access token configured (SYNC_ACCESS_TOKEN)");
    }

    // Fail fast when the workbook cannot be synced into
    let backend = GoogleSheetsClient::new(&config.sheets_base_url, config.access_token.clone());
    let mut sync = SheetSync::new(backend, &config.workbook_key, &config.sheet_title);
    sync.warm_up().await?;

    // Start the single sync worker
    let status = SharedStatus::default();
    let (queue, receiver) = SyncQueue::channel(config.queue_capacity);
    let worker_handle = worker::spawn(sync, receiver, status.clone());

    let state = AppState {
        queue,
        status,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Router and its queue handles are gone; let the worker drain what is left
    tracing::info!("Draining pending sync jobs");
    worker_handle.await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        .route("/threads", post(api::submit_thread))
        .route("/threads/bulk", post(api::submit_threads_bulk))
        .route("/status", get(api::get_status))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod testing;
