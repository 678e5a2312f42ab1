use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session status for display
        .route("/voice/status", get(handlers::get_status))
        // Session control
        .route("/voice/start", post(handlers::start_listening))
        .route("/voice/stop", post(handlers::stop_listening))
        .route("/voice/conversing", post(handlers::enter_conversing))
        // Speech output coordination
        .route("/voice/speaking/pause", post(handlers::pause_for_speaking))
        .route("/voice/speaking/resume", post(handlers::resume_after_speaking))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
