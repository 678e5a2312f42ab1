use super::event::SessionEvent;
use crate::wake_lock::{WakeLock, WakeLockHandle};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Re-acquisitions allowed within `REACQUIRE_WINDOW` after revocations
pub(crate) const MAX_REACQUIRES: usize = 3;
pub(crate) const REACQUIRE_WINDOW: Duration = Duration::from_secs(60);

/// Holds the wake lock while the session is active
///
/// Acquisition failures are logged and the session carries on without the
/// lock. A lock the platform takes back is re-acquired as long as the session
/// still wants to listen, at most `MAX_REACQUIRES` times per
/// `REACQUIRE_WINDOW`. Past that the session runs without the lock until the
/// next release.
pub(crate) struct ResourceGuard {
    lock: Arc<dyn WakeLock>,
    events: mpsc::UnboundedSender<SessionEvent>,
    held: Option<Held>,
    generation: u64,
    reacquired: VecDeque<Instant>,
}

struct Held {
    handle: Box<dyn WakeLockHandle>,
    generation: u64,
    watcher: JoinHandle<()>,
}

impl ResourceGuard {
    pub fn new(lock: Arc<dyn WakeLock>, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            lock,
            events,
            held: None,
            generation: 0,
            reacquired: VecDeque::new(),
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    pub async fn acquire(&mut self) {
        if self.held.is_some() {
            return;
        }

        let lease = match self.lock.acquire().await {
            Ok(lease) => lease,
            Err(e) => {
                warn!("Wake lock ({}) unavailable: {:#}", self.lock.name(), e);
                return;
            }
        };

        self.generation += 1;
        let generation = self.generation;
        let events = self.events.clone();
        let revoked = lease.revoked;

        let watcher = tokio::spawn(async move {
            // Err means the lease was dropped on our side, not revoked
            if revoked.await.is_ok() {
                let _ = events.send(SessionEvent::WakeLockRevoked { generation });
            }
        });

        debug!("Wake lock held (generation {})", generation);

        self.held = Some(Held {
            handle: lease.handle,
            generation,
            watcher,
        });
    }

    pub async fn release(&mut self) {
        self.reacquired.clear();

        let Some(held) = self.held.take() else {
            return;
        };

        held.watcher.abort();
        if let Err(e) = held.handle.release().await {
            warn!("Failed to release wake lock: {:#}", e);
        }
    }

    /// The platform dropped the lock of `generation`
    pub async fn on_revoked(&mut self, generation: u64, still_wanted: bool) {
        match &self.held {
            Some(held) if held.generation == generation => {}
            _ => return,
        }

        // Already gone on the platform side; nothing to release
        self.held = None;

        if !still_wanted {
            debug!("Wake lock revoked while inactive");
            return;
        }

        let now = Instant::now();
        while let Some(&at) = self.reacquired.front() {
            if now.duration_since(at) < REACQUIRE_WINDOW {
                break;
            }
            self.reacquired.pop_front();
        }

        if self.reacquired.len() >= MAX_REACQUIRES {
            warn!(
                "Wake lock revoked {} times within {:?}, continuing without it",
                self.reacquired.len() + 1,
                REACQUIRE_WINDOW
            );
            return;
        }

        self.reacquired.push_back(now);
        info!("Wake lock revoked by the platform, re-acquiring");
        self.acquire().await;
    }
}
