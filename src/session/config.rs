use crate::matcher::{DEFAULT_END_PATTERNS, DEFAULT_WAKE_PATTERNS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Silence timeout once the recognizer has finalized a fragment
pub const FINAL_SILENCE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Delay before restarting an engine that stopped unexpectedly
pub const RESTART_BACKOFF: Duration = Duration::from_millis(300);

/// Delay before listening again after speech output, so the tail of the
/// playback is not picked up
pub const RESUME_DELAY: Duration = Duration::from_millis(500);

/// Consecutive restart failures that end the session
pub const MAX_RESTART_FAILURES: u32 = 5;

/// Configuration for a voice session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier
    pub session_id: String,

    /// Quiet period that ends an utterance while the recognizer is still
    /// revising it
    /// Default: 2 seconds
    pub silence_timeout: Duration,

    /// Quiet period that ends conversation mode
    /// Default: 30 seconds
    pub conversation_idle_timeout: Duration,

    /// Wake phrase regexes in priority order
    pub wake_patterns: Vec<String>,

    /// End phrase regexes (any match ends a conversation)
    pub end_patterns: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("voice-{}", uuid::Uuid::new_v4()),
            silence_timeout: Duration::from_millis(2000),
            conversation_idle_timeout: Duration::from_millis(30_000),
            wake_patterns: DEFAULT_WAKE_PATTERNS.iter().map(|p| p.to_string()).collect(),
            end_patterns: DEFAULT_END_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}
