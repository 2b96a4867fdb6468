use std::panic;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use coderoom::config::Config;
use coderoom::{app, AppState};

#[tokio::main]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "coderoom=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    // Make sure the uploads directory exists before the first upload arrives
    if let Err(e) = tokio::fs::create_dir_all(&config.uploads_dir).await {
        warn!("Failed to create uploads directory {}: {}", config.uploads_dir, e);
    }

    let address = config.server_address();
    let app_state = Arc::new(AppState::new(config));
    let app_routes = app(app_state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", address));

    info!("Server running on http://{}", address);
    info!("WebSocket available at ws://{}/ws", address);
    info!("Swagger UI available at http://{}/swagger", address);

    axum::serve(listener, app_routes)
        .await
        .expect("Server failed to start");
}
