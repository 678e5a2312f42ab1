//! Downstream handlers for finished utterances
//!
//! Both are awaited off the session task. A failure is logged and never
//! changes the outcome of the session transition that triggered it.

use anyhow::Result;

/// Receives every finalized utterance captured after a wake phrase or during
/// a conversation
#[async_trait::async_trait]
pub trait CommandDispatcher: Send + Sync {
    async fn dispatch(&self, command: &str) -> Result<()>;
}

/// Invoked once when the wake phrase is said with nothing after it
#[async_trait::async_trait]
pub trait GreetingDispatcher: Send + Sync {
    async fn greet(&self) -> Result<()>;
}
