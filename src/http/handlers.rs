use super::state::AppState;
use crate::session::SessionSnapshot;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

// ============================================================================
// Handlers
// ============================================================================

fn snapshot_response(snapshot: SessionSnapshot) -> (StatusCode, Json<SessionSnapshot>) {
    (StatusCode::OK, Json(snapshot))
}

/// GET /voice/status
/// Current state, live transcript and last error
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    snapshot_response(state.session.snapshot())
}

/// POST /voice/start
/// Start listening for the wake phrase
pub async fn start_listening(State(state): State<AppState>) -> impl IntoResponse {
    info!("Start requested over HTTP");
    snapshot_response(state.session.start().await)
}

/// POST /voice/stop
/// Stop the session and release the wake lock
pub async fn stop_listening(State(state): State<AppState>) -> impl IntoResponse {
    info!("Stop requested over HTTP");
    snapshot_response(state.session.stop().await)
}

/// POST /voice/speaking/pause
/// Speech output is starting
pub async fn pause_for_speaking(State(state): State<AppState>) -> impl IntoResponse {
    snapshot_response(state.session.pause_for_speaking().await)
}

/// POST /voice/speaking/resume
/// Speech output finished
pub async fn resume_after_speaking(State(state): State<AppState>) -> impl IntoResponse {
    snapshot_response(state.session.resume_after_speaking().await)
}

/// POST /voice/conversing
/// Enter conversation mode without a wake phrase
pub async fn enter_conversing(State(state): State<AppState>) -> impl IntoResponse {
    snapshot_response(state.session.enter_conversing().await)
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
