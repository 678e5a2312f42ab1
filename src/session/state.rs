use crate::error::SessionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Voice session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Not listening; no engine, no wake lock
    Off,
    /// Waiting for the wake phrase
    Listening,
    /// Bare wake phrase heard; greeting in flight, engine stopped
    Greeting,
    /// Free-form conversation; every utterance is dispatched
    Conversing,
    /// Collecting a single command after the wake phrase
    Capturing,
    /// Command handed to the dispatcher
    Processing,
    /// Speech output playing; engine stopped
    Speaking,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        self != SessionState::Off
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Off => "OFF",
            SessionState::Listening => "LISTENING",
            SessionState::Greeting => "GREETING",
            SessionState::Conversing => "CONVERSING",
            SessionState::Capturing => "CAPTURING",
            SessionState::Processing => "PROCESSING",
            SessionState::Speaking => "SPEAKING",
        };
        f.write_str(name)
    }
}

/// Mode to return to once speech output finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeMode {
    Listening,
    Conversing,
}

/// Point-in-time view of a session for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session identifier
    pub session_id: String,

    /// Current state
    pub state: SessionState,

    /// Live transcript (captured command, conversation text, or last heard
    /// text while waiting for the wake phrase)
    pub transcript: String,

    /// Most recent fatal error, cleared by `start()`
    pub error: Option<SessionError>,

    /// Consecutive engine restart failures
    pub restart_failures: u32,

    /// When the current state was entered
    pub since: DateTime<Utc>,
}
