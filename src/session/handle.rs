use super::config::SessionConfig;
use super::event::{Command, Request, SessionEvent};
use super::machine::{SessionBackends, SessionMachine};
use super::state::{SessionSnapshot, SessionState};
use crate::dispatch::{CommandDispatcher, GreetingDispatcher};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

/// Handle to a running voice session
///
/// Cloning is cheap; all clones drive the same session. The session task
/// stops the engine and releases the wake lock once the last handle is
/// dropped.
#[derive(Clone)]
pub struct VoiceSession {
    requests: mpsc::UnboundedSender<Request>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl VoiceSession {
    /// Create a voice session and spawn its task. The session starts `OFF`.
    ///
    /// Fails only if a wake or end phrase pattern does not compile.
    pub fn spawn(config: SessionConfig, backends: SessionBackends) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (request_tx, request_rx) = mpsc::unbounded_channel();

        let machine = SessionMachine::new(config, backends, event_tx)?;
        let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot());

        tokio::spawn(run(machine, request_rx, event_rx, snapshot_tx));

        Ok(Self {
            requests: request_tx,
            snapshot: snapshot_rx,
        })
    }

    /// Begin listening for the wake phrase
    pub async fn start(&self) -> SessionSnapshot {
        self.request(Command::Start).await
    }

    /// Cancel everything, stop the engine and release the wake lock
    pub async fn stop(&self) -> SessionSnapshot {
        self.request(Command::Stop).await
    }

    /// Speech output is about to play; stop listening
    pub async fn pause_for_speaking(&self) -> SessionSnapshot {
        self.request(Command::PauseForSpeaking).await
    }

    /// Speech output finished; listen again after a short delay
    pub async fn resume_after_speaking(&self) -> SessionSnapshot {
        self.request(Command::ResumeAfterSpeaking).await
    }

    /// Switch to free-form conversation without a wake phrase
    pub async fn enter_conversing(&self) -> SessionSnapshot {
        self.request(Command::EnterConversing).await
    }

    /// Replace the command dispatcher. Dispatches already in flight are not affected.
    pub async fn set_command_dispatcher(&self, dispatcher: Arc<dyn CommandDispatcher>) {
        self.request(Command::SetCommandDispatcher(dispatcher)).await;
    }

    /// Replace the greeting dispatcher. A greeting already in flight is not affected.
    pub async fn set_greeting_dispatcher(&self, dispatcher: Arc<dyn GreetingDispatcher>) {
        self.request(Command::SetGreetingDispatcher(dispatcher)).await;
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.snapshot.borrow().state
    }

    /// Watch every snapshot the session publishes
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    async fn request(&self, command: Command) -> SessionSnapshot {
        let (ack, done) = oneshot::channel();

        if self.requests.send(Request { command, ack }).is_err() {
            debug!("Voice session task is gone");
            return self.snapshot();
        }

        match done.await {
            Ok(snapshot) => snapshot,
            Err(_) => self.snapshot(),
        }
    }
}

async fn run(
    mut machine: SessionMachine,
    mut requests: mpsc::UnboundedReceiver<Request>,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    snapshot: watch::Sender<SessionSnapshot>,
) {
    loop {
        tokio::select! {
            request = requests.recv() => match request {
                Some(Request { command, ack }) => {
                    machine.handle_command(command).await;
                    let current = machine.snapshot();
                    snapshot.send_replace(current.clone());
                    let _ = ack.send(current);
                    continue;
                }
                None => break,
            },
            Some(event) = events.recv() => machine.handle_event(event).await,
        }

        snapshot.send_replace(machine.snapshot());
    }

    // Every handle is gone: tear down like stop()
    machine.stop().await;
    snapshot.send_replace(machine.snapshot());
    info!("Voice session task finished");
}
