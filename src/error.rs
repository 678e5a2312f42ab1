use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal session failures.
///
/// These never cross the public API as `Err`; the session stores the latest one
/// in its snapshot and drops to `OFF`. A new `start()` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionError {
    /// Microphone access refused by the user or platform
    #[error("microphone permission denied")]
    PermissionDenied,

    /// The engine could not be restarted after repeated attempts
    #[error("speech recognition failed to restart after {attempts} attempts")]
    RestartExhausted { attempts: u32 },

    /// No recognition engine on this platform
    #[error("speech recognition is not available")]
    EngineUnavailable,

    /// The very first engine start failed
    #[error("speech recognition failed to start: {reason}")]
    StartFailed { reason: String },
}
