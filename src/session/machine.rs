use super::config::{
    SessionConfig, FINAL_SILENCE_TIMEOUT, MAX_RESTART_FAILURES, RESTART_BACKOFF, RESUME_DELAY,
};
use super::event::{Command, SessionEvent};
use super::guard::ResourceGuard;
use super::state::{ResumeMode, SessionSnapshot, SessionState};
use super::timers::{TimerBank, TimerKind};
use super::transcript::Transcript;
use crate::dispatch::{CommandDispatcher, GreetingDispatcher};
use crate::engine::{EngineErrorCode, EngineEvent, RecognitionEngine, RecognitionResult};
use crate::error::SessionError;
use crate::matcher::{EndPhraseMatcher, WakeMatch, WakePhraseMatcher};
use crate::wake_lock::WakeLock;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// External collaborators a session is built from
pub struct SessionBackends {
    pub engine: Box<dyn RecognitionEngine>,
    pub command_dispatcher: Arc<dyn CommandDispatcher>,
    pub greeting_dispatcher: Arc<dyn GreetingDispatcher>,
    pub wake_lock: Arc<dyn WakeLock>,
}

/// A running engine whose events are forwarded into the session
struct EngineRun {
    id: u64,
    forwarder: JoinHandle<()>,
}

/// The voice session state machine
///
/// Owned by exactly one task. Every handler runs to completion before the
/// next one starts, and timers report back as events, so decisions are always
/// made against the current state rather than the state at arm time.
pub(crate) struct SessionMachine {
    config: SessionConfig,
    wake: WakePhraseMatcher,
    end: EndPhraseMatcher,

    engine: Box<dyn RecognitionEngine>,
    engine_run: Option<EngineRun>,
    next_run_id: u64,

    command_dispatcher: Arc<dyn CommandDispatcher>,
    greeting_dispatcher: Arc<dyn GreetingDispatcher>,
    dispatch_seq: u64,
    greeting_pending: Option<u64>,
    command_pending: Option<u64>,

    timers: TimerBank,
    guard: ResourceGuard,
    events: mpsc::UnboundedSender<SessionEvent>,

    state: SessionState,
    since: DateTime<Utc>,
    /// Cleared by `stop()` and by fatal errors; nothing restarts while false
    wants_listening: bool,
    transcript: Transcript,
    /// The utterance that carried the wake phrase is still being revised
    wake_utterance_open: bool,
    /// Last text heard while waiting for the wake phrase, display only
    heard: String,
    restart_failures: u32,
    /// Where `resume_after_speaking()` goes, recorded by `pause_for_speaking()`
    resume_mode: ResumeMode,
    /// Where a settled command returns to
    processing_origin: ResumeMode,
    last_error: Option<SessionError>,
}

impl SessionMachine {
    pub fn new(
        config: SessionConfig,
        backends: SessionBackends,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<Self> {
        let wake = WakePhraseMatcher::new(&config.wake_patterns)?;
        let end = EndPhraseMatcher::new(&config.end_patterns)?;

        info!(
            "Creating voice session {} (engine: {}, wake lock: {}, {} wake patterns)",
            config.session_id,
            backends.engine.name(),
            backends.wake_lock.name(),
            wake.len()
        );

        Ok(Self {
            wake,
            end,
            engine: backends.engine,
            engine_run: None,
            next_run_id: 0,
            command_dispatcher: backends.command_dispatcher,
            greeting_dispatcher: backends.greeting_dispatcher,
            dispatch_seq: 0,
            greeting_pending: None,
            command_pending: None,
            timers: TimerBank::new(events.clone()),
            guard: ResourceGuard::new(backends.wake_lock, events.clone()),
            events,
            state: SessionState::Off,
            since: Utc::now(),
            wants_listening: false,
            transcript: Transcript::default(),
            wake_utterance_open: false,
            heard: String::new(),
            restart_failures: 0,
            resume_mode: ResumeMode::Listening,
            processing_origin: ResumeMode::Listening,
            last_error: None,
            config,
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let transcript = match self.state {
            SessionState::Listening => self.heard.clone(),
            SessionState::Capturing | SessionState::Conversing => self.transcript.text(),
            _ => String::new(),
        };

        SessionSnapshot {
            session_id: self.config.session_id.clone(),
            state: self.state,
            transcript,
            error: self.last_error.clone(),
            restart_failures: self.restart_failures,
            since: self.since,
        }
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    pub async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start => self.start().await,
            Command::Stop => self.stop().await,
            Command::PauseForSpeaking => self.pause_for_speaking().await,
            Command::ResumeAfterSpeaking => self.resume_after_speaking(),
            Command::EnterConversing => self.enter_conversing().await,
            Command::SetCommandDispatcher(dispatcher) => {
                debug!("Command dispatcher replaced");
                self.command_dispatcher = dispatcher;
            }
            Command::SetGreetingDispatcher(dispatcher) => {
                debug!("Greeting dispatcher replaced");
                self.greeting_dispatcher = dispatcher;
            }
        }
    }

    pub async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Engine { run, event } => {
                if self.is_current_run(run) {
                    self.on_engine_event(event).await;
                } else {
                    trace!("Dropping event from stale engine run {}: {:?}", run, event);
                }
            }
            SessionEvent::EngineClosed { run } => {
                if self.is_current_run(run) {
                    debug!("Engine event channel closed");
                    self.on_engine_ended().await;
                }
            }
            SessionEvent::TimerFired { kind, token } => {
                if self.timers.take_fired(kind, token) {
                    match kind {
                        TimerKind::Silence => self.on_silence().await,
                        TimerKind::ConversationIdle => self.on_conversation_idle(),
                        TimerKind::Restart => self.on_restart().await,
                    }
                }
            }
            SessionEvent::GreetingSettled { seq, result } => {
                self.on_greeting_settled(seq, result).await
            }
            SessionEvent::CommandSettled { seq, result } => self.on_command_settled(seq, result),
            SessionEvent::WakeLockRevoked { generation } => {
                let still_wanted = self.wants_listening && self.state.is_active();
                self.guard.on_revoked(generation, still_wanted).await;
            }
        }
    }

    // ========================================================================
    // Public API
    // ========================================================================

    async fn start(&mut self) {
        if self.state.is_active() {
            debug!("Voice session {} already active", self.config.session_id);
            return;
        }

        if !self.engine.is_available() {
            error!("Recognition engine {} is not available", self.engine.name());
            self.last_error = Some(SessionError::EngineUnavailable);
            return;
        }

        self.last_error = None;
        self.restart_failures = 0;
        self.transcript.clear();
        self.heard.clear();

        if let Err(e) = self.start_engine().await {
            error!("Failed to start recognition engine: {:#}", e);
            self.last_error = Some(SessionError::StartFailed {
                reason: format!("{:#}", e),
            });
            return;
        }

        self.wants_listening = true;
        self.set_state(SessionState::Listening);
        self.guard.acquire().await;
    }

    /// Universal cancellation. A second call in a row does nothing.
    pub async fn stop(&mut self) {
        self.last_error = None;

        if !self.wants_listening && self.state == SessionState::Off && !self.guard.is_held() {
            return;
        }

        info!("Stopping voice session {}", self.config.session_id);
        self.shut_down().await;
    }

    async fn pause_for_speaking(&mut self) {
        match self.state {
            SessionState::Off => {
                debug!("pause_for_speaking ignored while OFF");
                return;
            }
            SessionState::Speaking => {
                // Resume mode was recorded by the first pause
                self.stop_engine().await;
                return;
            }
            _ => {}
        }

        self.resume_mode = self.current_mode();
        self.timers.cancel(TimerKind::Silence);
        self.heard.clear();
        self.set_state(SessionState::Speaking);
        self.stop_engine().await;
    }

    fn resume_after_speaking(&mut self) {
        if !self.wants_listening || self.state != SessionState::Speaking {
            debug!("resume_after_speaking ignored in {}", self.state);
            return;
        }

        self.transcript.clear();
        self.heard.clear();

        match self.resume_mode {
            ResumeMode::Conversing => {
                self.set_state(SessionState::Conversing);
                self.timers
                    .arm(TimerKind::ConversationIdle, self.config.conversation_idle_timeout);
            }
            ResumeMode::Listening => self.set_state(SessionState::Listening),
        }

        self.timers.arm(TimerKind::Restart, RESUME_DELAY);
    }

    async fn enter_conversing(&mut self) {
        match self.state {
            SessionState::Off => warn!("enter_conversing ignored while OFF"),
            SessionState::Speaking => self.resume_mode = ResumeMode::Conversing,
            _ => self.begin_conversation().await,
        }
    }

    // ========================================================================
    // Engine events
    // ========================================================================

    async fn on_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Started => {
                debug!("Recognition engine started ({})", self.state);
                self.restart_failures = 0;
            }
            EngineEvent::Result(results) => {
                self.restart_failures = 0;
                self.on_results(results).await;
            }
            EngineEvent::Error(code) => self.on_engine_error(code).await,
            EngineEvent::Ended => self.on_engine_ended().await,
        }
    }

    async fn on_results(&mut self, results: Vec<RecognitionResult>) {
        for (i, result) in results.iter().enumerate() {
            debug!(
                "state={} result[{}] final={}: {}",
                self.state,
                i,
                result.is_final,
                result.transcripts().collect::<Vec<_>>().join(" | ")
            );
        }

        let Some(last) = results.last() else {
            return;
        };

        match self.state {
            SessionState::Listening => {
                let wake = results.iter().find_map(|result| {
                    result
                        .transcripts()
                        .find_map(|text| self.wake.detect(text))
                        .map(|m| (m, result.is_final))
                });

                match wake {
                    Some((m, is_final)) => self.on_wake(m, is_final).await,
                    None => self.heard = last.text.trim().to_string(),
                }
            }
            SessionState::Capturing => {
                for result in &results {
                    // Revisions of the wake utterance repeat the wake phrase,
                    // possibly only in an alternative
                    let command = if self.wake_utterance_open {
                        result
                            .transcripts()
                            .find_map(|text| self.wake.detect(text))
                            .map(|m| m.command)
                    } else {
                        None
                    };

                    self.transcript
                        .push(command.as_deref().unwrap_or(&result.text), result.is_final);
                    if result.is_final {
                        self.wake_utterance_open = false;
                    }
                }
                self.arm_silence(last.is_final);
            }
            SessionState::Conversing => {
                let ended = results
                    .iter()
                    .filter(|r| r.is_final)
                    .any(|r| self.end.is_end_phrase(&r.text));
                if ended {
                    info!("End phrase heard, leaving conversation");
                    self.end_conversation();
                    return;
                }

                for result in &results {
                    self.transcript.push(&result.text, result.is_final);
                }
                self.arm_silence(last.is_final);
                self.timers
                    .arm(TimerKind::ConversationIdle, self.config.conversation_idle_timeout);
            }
            _ => trace!("Ignoring results in {}", self.state),
        }
    }

    async fn on_wake(&mut self, m: WakeMatch, is_final: bool) {
        self.heard.clear();

        if m.command.is_empty() {
            info!("Wake phrase heard without a command, greeting");
            self.set_state(SessionState::Greeting);
            self.stop_engine().await;
            self.spawn_greeting();
        } else {
            info!("Wake phrase heard, capturing command: {}", m.command);
            self.transcript.clear();
            self.transcript.push(&m.command, is_final);
            self.wake_utterance_open = !is_final;
            self.set_state(SessionState::Capturing);
            self.timers.arm(TimerKind::Silence, self.config.silence_timeout);
        }
    }

    async fn on_engine_error(&mut self, code: EngineErrorCode) {
        match code {
            EngineErrorCode::PermissionDenied => self.fail(SessionError::PermissionDenied).await,
            EngineErrorCode::NoSpeech | EngineErrorCode::Aborted => {
                debug!("Recognition engine reported {:?}", code)
            }
            EngineErrorCode::Other(reason) => warn!("Recognition engine error: {}", reason),
        }
    }

    async fn on_engine_ended(&mut self) {
        self.detach_engine();

        if !self.wants_listening {
            return;
        }

        match self.state {
            SessionState::Off | SessionState::Speaking | SessionState::Greeting => {}
            _ => {
                debug!(
                    "Recognition engine ended in {}, restarting in {} ms",
                    self.state,
                    RESTART_BACKOFF.as_millis()
                );
                self.timers.arm(TimerKind::Restart, RESTART_BACKOFF);
            }
        }
    }

    // ========================================================================
    // Timers
    // ========================================================================

    async fn on_silence(&mut self) {
        match self.state {
            SessionState::Capturing => {
                let text = self.transcript.text();
                if text.is_empty() {
                    debug!("Nothing captured after the wake phrase");
                    self.set_state(SessionState::Listening);
                } else {
                    self.dispatch_command(text, ResumeMode::Listening);
                }
            }
            SessionState::Conversing => {
                let text = self.transcript.text();
                if text.is_empty() {
                    return;
                }

                if self.end.is_end_phrase(&text) {
                    info!("End phrase heard, leaving conversation");
                    self.end_conversation();
                } else {
                    self.timers
                        .arm(TimerKind::ConversationIdle, self.config.conversation_idle_timeout);
                    self.dispatch_command(text, ResumeMode::Conversing);
                }
            }
            _ => {}
        }
    }

    fn on_conversation_idle(&mut self) {
        match self.state {
            SessionState::Conversing => {
                info!(
                    "No speech for {} s, back to waiting for the wake phrase",
                    self.config.conversation_idle_timeout.as_secs()
                );
                self.timers.cancel(TimerKind::Silence);
                self.set_state(SessionState::Listening);
            }
            SessionState::Processing => self.processing_origin = ResumeMode::Listening,
            _ => {}
        }
    }

    async fn on_restart(&mut self) {
        if !self.wants_listening || self.engine_run.is_some() {
            return;
        }

        match self.state {
            SessionState::Off | SessionState::Speaking | SessionState::Greeting => {}
            _ => self.restart_engine().await,
        }
    }

    // ========================================================================
    // Dispatcher settlement
    // ========================================================================

    async fn on_greeting_settled(&mut self, seq: u64, result: Result<()>) {
        if self.greeting_pending != Some(seq) {
            debug!("Ignoring stale greeting result");
            return;
        }
        self.greeting_pending = None;

        match result {
            Ok(()) => match self.state {
                SessionState::Greeting | SessionState::Listening => {
                    self.begin_conversation().await
                }
                SessionState::Speaking => self.resume_mode = ResumeMode::Conversing,
                _ => {}
            },
            Err(e) => {
                error!("Greeting failed: {:#}", e);
                if self.state == SessionState::Greeting {
                    self.set_state(SessionState::Listening);
                    self.timers.arm(TimerKind::Restart, RESTART_BACKOFF);
                }
            }
        }
    }

    fn on_command_settled(&mut self, seq: u64, result: Result<()>) {
        if let Err(e) = result {
            error!("Command dispatch failed: {:#}", e);
        }

        if self.command_pending != Some(seq) {
            return;
        }
        self.command_pending = None;

        if self.state != SessionState::Processing {
            return;
        }

        match self.processing_origin {
            ResumeMode::Conversing => {
                self.set_state(SessionState::Conversing);
                self.timers
                    .arm(TimerKind::ConversationIdle, self.config.conversation_idle_timeout);
            }
            ResumeMode::Listening => self.set_state(SessionState::Listening),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn set_state(&mut self, next: SessionState) {
        if next == self.state {
            return;
        }

        info!("Voice session {}: {} -> {}", self.config.session_id, self.state, next);

        // The transcript only lives inside CAPTURING and CONVERSING
        if matches!(self.state, SessionState::Capturing | SessionState::Conversing) {
            self.transcript.clear();
        }

        self.state = next;
        self.since = Utc::now();
    }

    /// Mode the session is in right now, for resuming after speech output
    fn current_mode(&self) -> ResumeMode {
        match self.state {
            SessionState::Conversing => ResumeMode::Conversing,
            SessionState::Processing => self.processing_origin,
            _ => ResumeMode::Listening,
        }
    }

    fn arm_silence(&mut self, after_final: bool) {
        let timeout = if after_final {
            FINAL_SILENCE_TIMEOUT
        } else {
            self.config.silence_timeout
        };
        self.timers.arm(TimerKind::Silence, timeout);
    }

    async fn begin_conversation(&mut self) {
        self.greeting_pending = None;
        self.timers.cancel(TimerKind::Silence);
        self.heard.clear();
        self.transcript.clear();
        self.set_state(SessionState::Conversing);
        self.timers
            .arm(TimerKind::ConversationIdle, self.config.conversation_idle_timeout);

        if self.engine_run.is_none() && !self.timers.is_armed(TimerKind::Restart) {
            self.restart_engine().await;
        }
    }

    fn end_conversation(&mut self) {
        self.timers.cancel(TimerKind::Silence);
        self.timers.cancel(TimerKind::ConversationIdle);
        self.set_state(SessionState::Listening);
    }

    fn dispatch_command(&mut self, text: String, origin: ResumeMode) {
        info!("Dispatching command: {}", text);

        self.processing_origin = origin;
        self.set_state(SessionState::Processing);

        self.dispatch_seq += 1;
        let seq = self.dispatch_seq;
        self.command_pending = Some(seq);

        let dispatcher = Arc::clone(&self.command_dispatcher);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = dispatcher.dispatch(&text).await;
            let _ = events.send(SessionEvent::CommandSettled { seq, result });
        });
    }

    fn spawn_greeting(&mut self) {
        self.dispatch_seq += 1;
        let seq = self.dispatch_seq;
        self.greeting_pending = Some(seq);

        let dispatcher = Arc::clone(&self.greeting_dispatcher);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = dispatcher.greet().await;
            let _ = events.send(SessionEvent::GreetingSettled { seq, result });
        });
    }

    /// Start the engine, counting failures towards the restart limit
    async fn restart_engine(&mut self) {
        match self.start_engine().await {
            Ok(()) => self.restart_failures = 0,
            Err(e) => {
                self.restart_failures += 1;
                warn!(
                    "Recognition engine restart failed: {:#} (attempt {})",
                    e, self.restart_failures
                );

                if self.restart_failures >= MAX_RESTART_FAILURES {
                    self.fail(SessionError::RestartExhausted {
                        attempts: self.restart_failures,
                    })
                    .await;
                } else {
                    self.timers.arm(TimerKind::Restart, RESTART_BACKOFF);
                }
            }
        }
    }

    async fn start_engine(&mut self) -> Result<()> {
        let mut rx = self.engine.start().await?;

        self.detach_engine();
        self.next_run_id += 1;
        let run = self.next_run_id;
        let events = self.events.clone();

        let forwarder = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if events.send(SessionEvent::Engine { run, event }).is_err() {
                    return;
                }
            }
            let _ = events.send(SessionEvent::EngineClosed { run });
        });

        self.engine_run = Some(EngineRun { id: run, forwarder });
        Ok(())
    }

    async fn stop_engine(&mut self) {
        self.detach_engine();
        if let Err(e) = self.engine.stop().await {
            debug!("Recognition engine stop failed: {:#}", e);
        }
    }

    /// Forget the current run; its remaining events are dropped
    fn detach_engine(&mut self) {
        if let Some(run) = self.engine_run.take() {
            run.forwarder.abort();
        }
    }

    fn is_current_run(&self, run: u64) -> bool {
        self.engine_run.as_ref().is_some_and(|r| r.id == run)
    }

    async fn fail(&mut self, err: SessionError) {
        error!("Voice session {} stopped: {}", self.config.session_id, err);
        self.shut_down().await;
        self.last_error = Some(err);
    }

    async fn shut_down(&mut self) {
        self.wants_listening = false;
        self.timers.cancel_all();
        self.greeting_pending = None;
        self.command_pending = None;
        self.heard.clear();
        self.stop_engine().await;
        self.set_state(SessionState::Off);
        self.transcript.clear();
        self.guard.release().await;
    }
}
