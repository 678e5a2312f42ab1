//! HTTP API for the dashboard and the speech output service
//!
//! - GET /voice/status - Current state, transcript and error
//! - POST /voice/start - Start listening
//! - POST /voice/stop - Stop listening
//! - POST /voice/conversing - Enter conversation mode
//! - POST /voice/speaking/pause - Speech output started
//! - POST /voice/speaking/resume - Speech output finished
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
