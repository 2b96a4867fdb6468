pub mod config;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod rooms;
pub mod routes;
pub mod websocket;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;
use docs::ApiDoc;
use handlers::upload_image;
use rooms::ConnectionLifecycleManager;
use routes::create_api_routes;
use websocket::websocket_handler;

/// Shared state behind every handler: the room core plus the loaded config.
pub struct AppState {
    pub lifecycle: ConnectionLifecycleManager,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            lifecycle: ConnectionLifecycleManager::new(),
            config,
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    match &config.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

/// Assemble the full application router.
pub fn app(app_state: Arc<AppState>) -> Router {
    let api_routes = create_api_routes(app_state.clone());

    let core_routes = Router::new()
        .route("/ws", get(websocket_handler))
        .route("/upload", post(upload_image))
        .with_state(app_state.clone());

    Router::new()
        // Mount API routes
        .nest("/api", api_routes)
        // WebSocket and upload endpoints
        .merge(core_routes)
        // Serve stored reference images
        .nest_service("/uploads", ServeDir::new(&app_state.config.uploads_dir))
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer(&app_state.config))
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
}
