//! Streaming speech recognition engine adapter
//!
//! The session never talks to a recognizer directly. It drives an
//! implementation of `RecognitionEngine` and consumes the `EngineEvent`s
//! delivered on the receiver handed back by `start()`.

use anyhow::Result;
use tokio::sync::mpsc;

/// One recognition hypothesis for a span of speech
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    /// Best transcript for the span
    pub text: String,

    /// Whether the recognizer will revise this span further
    pub is_final: bool,

    /// Lower-ranked transcripts, best first
    pub alternatives: Vec<String>,
}

impl RecognitionResult {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            alternatives: Vec::new(),
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
            alternatives: Vec::new(),
        }
    }

    pub fn with_alternatives(mut self, alternatives: Vec<String>) -> Self {
        self.alternatives = alternatives;
        self
    }

    /// Primary transcript followed by the alternatives
    pub fn transcripts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.text.as_str()).chain(self.alternatives.iter().map(String::as_str))
    }
}

/// Engine error codes the session distinguishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineErrorCode {
    /// Microphone access refused; fatal for the session
    PermissionDenied,
    /// Nothing was said before the recognizer gave up
    NoSpeech,
    /// The run was cancelled, usually by our own `stop()`
    Aborted,
    /// Anything else the platform reports
    Other(String),
}

/// Events emitted by a running engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Started,
    Result(Vec<RecognitionResult>),
    Error(EngineErrorCode),
    /// The run finished. May arrive without a `stop()` call.
    Ended,
}

/// Recognition engine trait
///
/// Implementations:
/// - `NatsRecognitionEngine`: transcripts published by an STT service over NATS
/// - test fakes that replay scripted event sequences
#[async_trait::async_trait]
pub trait RecognitionEngine: Send {
    /// Whether the engine can run at all on this host
    fn is_available(&self) -> bool {
        true
    }

    /// Begin a recognition run
    ///
    /// Returns a receiver for this run's events. The session drops it when it
    /// stops the engine, so an implementation must tolerate a closed channel.
    async fn start(&mut self) -> Result<mpsc::Receiver<EngineEvent>>;

    /// Stop the current run. Stopping an idle engine is not an error.
    async fn stop(&mut self) -> Result<()>;

    /// Get engine name for logging
    fn name(&self) -> &str;
}
