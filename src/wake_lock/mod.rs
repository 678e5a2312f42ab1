//! Platform wake lock
//!
//! Keeps the host from idling or sleeping while the session listens.
//! `ResourceGuard` in the session module decides when to hold it.

mod inhibit;

pub use inhibit::InhibitWakeLock;

use anyhow::Result;
use tokio::sync::oneshot;

/// A held lock
#[async_trait::async_trait]
pub trait WakeLockHandle: Send {
    /// Give the lock back to the platform
    async fn release(self: Box<Self>) -> Result<()>;
}

/// An acquired lock plus a signal that fires if the platform takes it back
pub struct WakeLockLease {
    pub handle: Box<dyn WakeLockHandle>,
    pub revoked: oneshot::Receiver<()>,
}

/// Platform wake lock provider
#[async_trait::async_trait]
pub trait WakeLock: Send + Sync {
    async fn acquire(&self) -> Result<WakeLockLease>;

    fn name(&self) -> &str;
}

/// Provider for hosts without a wake lock; acquisition always fails
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWakeLock;

#[async_trait::async_trait]
impl WakeLock for NoWakeLock {
    async fn acquire(&self) -> Result<WakeLockLease> {
        anyhow::bail!("Wake lock is not supported on this host")
    }

    fn name(&self) -> &str {
        "none"
    }
}
