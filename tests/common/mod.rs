// Test doubles for driving a voice session with scripted engine events
#![allow(dead_code)]

use anyhow::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use voice_session::session::SessionBackends;
use voice_session::wake_lock::{WakeLock, WakeLockHandle, WakeLockLease};
use voice_session::{
    CommandDispatcher, EngineEvent, GreetingDispatcher, RecognitionEngine, RecognitionResult,
    SessionConfig, VoiceSession,
};

// ============================================================================
// Engine
// ============================================================================

#[derive(Default)]
struct EngineState {
    available: bool,
    starts: u32,
    stops: u32,
    failing_starts: u32,
    sender: Option<mpsc::Sender<EngineEvent>>,
}

/// Recognition engine whose events are pushed by the test
pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

/// Test-side control of a `FakeEngine`
#[derive(Clone)]
pub struct EngineControl {
    state: Arc<Mutex<EngineState>>,
}

pub fn fake_engine() -> (FakeEngine, EngineControl) {
    let state = Arc::new(Mutex::new(EngineState {
        available: true,
        ..Default::default()
    }));
    (
        FakeEngine {
            state: Arc::clone(&state),
        },
        EngineControl { state },
    )
}

#[async_trait::async_trait]
impl RecognitionEngine for FakeEngine {
    fn is_available(&self) -> bool {
        self.state.lock().unwrap().available
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<EngineEvent>> {
        let mut state = self.state.lock().unwrap();
        if state.failing_starts > 0 {
            state.failing_starts -= 1;
            anyhow::bail!("recognition already started");
        }

        let (tx, rx) = mpsc::channel(64);
        state.starts += 1;
        state.sender = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.stops += 1;
        state.sender = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

impl EngineControl {
    /// Push an event into the current run. Returns false if no run is active.
    pub fn emit(&self, event: EngineEvent) -> bool {
        let state = self.state.lock().unwrap();
        match &state.sender {
            Some(tx) => tx.try_send(event).is_ok(),
            None => false,
        }
    }

    pub fn say(&self, text: &str) -> bool {
        self.emit(EngineEvent::Result(vec![RecognitionResult::final_text(text)]))
    }

    pub fn say_interim(&self, text: &str) -> bool {
        self.emit(EngineEvent::Result(vec![RecognitionResult::interim(text)]))
    }

    /// Platform-initiated end of the current run
    pub fn end(&self) {
        let mut state = self.state.lock().unwrap();
        if let Some(tx) = state.sender.take() {
            let _ = tx.try_send(EngineEvent::Ended);
        }
    }

    pub fn fail_next_starts(&self, count: u32) {
        self.state.lock().unwrap().failing_starts = count;
    }

    pub fn set_available(&self, available: bool) {
        self.state.lock().unwrap().available = available;
    }

    pub fn starts(&self) -> u32 {
        self.state.lock().unwrap().starts
    }

    pub fn stops(&self) -> u32 {
        self.state.lock().unwrap().stops
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().unwrap().sender.is_some()
    }
}

// ============================================================================
// Dispatchers
// ============================================================================

/// Records every dispatched command; settles after `delay`
pub struct RecordingDispatcher {
    commands: Mutex<Vec<String>>,
    delay: Duration,
    fail: bool,
}

impl RecordingDispatcher {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            commands: Mutex::new(Vec::new()),
            delay,
            fail: false,
        })
    }

    pub fn failing(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            commands: Mutex::new(Vec::new()),
            delay,
            fail: true,
        })
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.commands.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl CommandDispatcher for RecordingDispatcher {
    async fn dispatch(&self, command: &str) -> Result<()> {
        self.commands.lock().unwrap().push(command.to_string());
        tokio::time::sleep(self.delay).await;
        if self.fail {
            anyhow::bail!("command handler unavailable");
        }
        Ok(())
    }
}

/// Counts greetings; settles after `delay`
pub struct CountingGreeter {
    calls: Mutex<usize>,
    delay: Duration,
    fail: bool,
}

impl CountingGreeter {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(0),
            delay,
            fail: false,
        })
    }

    pub fn failing(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(0),
            delay,
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl GreetingDispatcher for CountingGreeter {
    async fn greet(&self) -> Result<()> {
        *self.calls.lock().unwrap() += 1;
        tokio::time::sleep(self.delay).await;
        if self.fail {
            anyhow::bail!("greeting handler unavailable");
        }
        Ok(())
    }
}

// ============================================================================
// Wake lock
// ============================================================================

#[derive(Default)]
struct LockState {
    acquires: u32,
    releases: u32,
    fail: bool,
    revoke: Option<oneshot::Sender<()>>,
}

/// Wake lock that counts acquisitions and releases
#[derive(Clone, Default)]
pub struct CountingWakeLock {
    state: Arc<Mutex<LockState>>,
}

struct CountingHandle {
    state: Arc<Mutex<LockState>>,
}

#[async_trait::async_trait]
impl WakeLockHandle for CountingHandle {
    async fn release(self: Box<Self>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.releases += 1;
        state.revoke = None;
        Ok(())
    }
}

#[async_trait::async_trait]
impl WakeLock for CountingWakeLock {
    async fn acquire(&self) -> Result<WakeLockLease> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            anyhow::bail!("wake lock denied");
        }

        state.acquires += 1;
        let (tx, rx) = oneshot::channel();
        state.revoke = Some(tx);

        Ok(WakeLockLease {
            handle: Box::new(CountingHandle {
                state: Arc::clone(&self.state),
            }),
            revoked: rx,
        })
    }

    fn name(&self) -> &str {
        "counting"
    }
}

impl CountingWakeLock {
    pub fn acquires(&self) -> u32 {
        self.state.lock().unwrap().acquires
    }

    pub fn releases(&self) -> u32 {
        self.state.lock().unwrap().releases
    }

    pub fn set_failing(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    /// The platform takes the lock back
    pub fn revoke(&self) {
        if let Some(tx) = self.state.lock().unwrap().revoke.take() {
            let _ = tx.send(());
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

/// How long the fake dispatchers take unless a test says otherwise
pub const DISPATCH_DELAY: Duration = Duration::from_secs(10);

pub struct Harness {
    pub session: VoiceSession,
    pub engine: EngineControl,
    pub commands: Arc<RecordingDispatcher>,
    pub greeter: Arc<CountingGreeter>,
    pub wake_lock: CountingWakeLock,
}

pub fn harness() -> Harness {
    harness_with(
        RecordingDispatcher::new(DISPATCH_DELAY),
        CountingGreeter::new(DISPATCH_DELAY),
    )
}

pub fn harness_with(commands: Arc<RecordingDispatcher>, greeter: Arc<CountingGreeter>) -> Harness {
    let (engine, control) = fake_engine();
    let wake_lock = CountingWakeLock::default();

    let config = SessionConfig {
        session_id: "test-session".to_string(),
        ..Default::default()
    };

    let session = VoiceSession::spawn(
        config,
        SessionBackends {
            engine: Box::new(engine),
            command_dispatcher: commands.clone(),
            greeting_dispatcher: greeter.clone(),
            wake_lock: Arc::new(wake_lock.clone()),
        },
    )
    .unwrap();

    Harness {
        session,
        engine: control,
        commands,
        greeter,
        wake_lock,
    }
}

/// Let the session task and its helpers process everything queued
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
