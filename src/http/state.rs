use crate::session::VoiceSession;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The voice session this service controls
    pub session: VoiceSession,
}

impl AppState {
    pub fn new(session: VoiceSession) -> Self {
        Self { session }
    }
}
