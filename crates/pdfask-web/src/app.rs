use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::settings::ServerSettings;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>, settings: &ServerSettings) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/api/process-pdf", post(handlers::process::process_pdf))
        .route("/health", get(handlers::health::health));

    if let Some(dir) = &settings.static_dir {
        tracing::info!(dir = %dir.display(), "serving static files");
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(DefaultBodyLimit::max(settings.max_upload_bytes()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
