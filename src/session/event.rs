use super::state::SessionSnapshot;
use super::timers::TimerKind;
use crate::dispatch::{CommandDispatcher, GreetingDispatcher};
use crate::engine::EngineEvent;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Public API calls forwarded to the session task
pub(crate) enum Command {
    Start,
    Stop,
    PauseForSpeaking,
    ResumeAfterSpeaking,
    EnterConversing,
    SetCommandDispatcher(Arc<dyn CommandDispatcher>),
    SetGreetingDispatcher(Arc<dyn GreetingDispatcher>),
}

/// A command plus the channel that receives the resulting snapshot
pub(crate) struct Request {
    pub command: Command,
    pub ack: oneshot::Sender<SessionSnapshot>,
}

/// Events the session produces for itself: engine traffic, timers,
/// settled dispatches and wake lock revocations
pub(crate) enum SessionEvent {
    Engine { run: u64, event: EngineEvent },
    /// The engine dropped its event channel
    EngineClosed { run: u64 },
    TimerFired { kind: TimerKind, token: u64 },
    GreetingSettled { seq: u64, result: anyhow::Result<()> },
    CommandSettled { seq: u64, result: anyhow::Result<()> },
    WakeLockRevoked { generation: u64 },
}
