//! Voice session management
//!
//! This module provides the `VoiceSession` abstraction that manages:
//! - Wake phrase detection and command capture
//! - Free-form conversation mode with end phrase and idle detection
//! - Pausing the microphone while speech output plays
//! - Engine restarts with a fixed backoff and a failure limit
//! - The wake lock that keeps the host awake while listening

mod config;
mod event;
mod guard;
mod handle;
mod machine;
mod state;
mod timers;
mod transcript;

pub use config::{
    SessionConfig, FINAL_SILENCE_TIMEOUT, MAX_RESTART_FAILURES, RESTART_BACKOFF, RESUME_DELAY,
};
pub use handle::VoiceSession;
pub use machine::SessionBackends;
pub use state::{ResumeMode, SessionSnapshot, SessionState};
pub use timers::TimerKind;
