use axum::{
    Router,
    routing::{get, post},
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::SearchConfig;
use crate::sheets::SheetStore;

pub mod error;
pub mod handlers;
pub mod models;

/// Everything a request needs, handed to handlers explicitly.
#[derive(Clone)]
pub struct AppState {
    pub sheet: Arc<dyn SheetStore>,
    pub search: SearchConfig,
}

pub fn create_router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/hello", get(handlers::hello_handler))
        .route("/api/echo", post(handlers::echo_handler))
        .route("/api/search-keyword", post(handlers::search_keyword_handler))
        .with_state(state)
        // UI assets
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
