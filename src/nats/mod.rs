//! NATS plumbing
//!
//! - `NatsRecognitionEngine`: transcripts from the STT service
//! - `NatsCommandDispatcher` / `NatsGreetingDispatcher`: request/reply to the
//!   downstream handlers

pub mod client;
pub mod dispatch;
pub mod engine;
pub mod messages;

pub use client::NatsClient;
pub use dispatch::{NatsCommandDispatcher, NatsGreetingDispatcher};
pub use engine::NatsRecognitionEngine;
pub use messages::{CommandMessage, DispatchReply, GreetingMessage, TranscriptMessage};
