use super::event::SessionEvent;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Timers owned by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Ends an utterance after a quiet period
    Silence,
    /// Ends conversation mode after a long quiet period
    ConversationIdle,
    /// Restarts the recognition engine
    Restart,
}

struct ArmedTimer {
    token: u64,
    task: JoinHandle<()>,
}

/// At most one outstanding timer per kind
///
/// A timer does not run a callback. When it elapses it posts
/// `SessionEvent::TimerFired` to the session task, which then looks at the
/// state as it is at that moment. Each arm gets a fresh token, and a firing
/// whose token is no longer armed is dropped, so a cancel or re-arm always
/// wins over a firing that is already queued.
pub(crate) struct TimerBank {
    events: mpsc::UnboundedSender<SessionEvent>,
    armed: HashMap<TimerKind, ArmedTimer>,
    next_token: u64,
}

impl TimerBank {
    pub fn new(events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            events,
            armed: HashMap::new(),
            next_token: 0,
        }
    }

    /// Cancel any timer of `kind` and schedule a new one
    pub fn arm(&mut self, kind: TimerKind, delay: Duration) {
        self.cancel(kind);

        self.next_token += 1;
        let token = self.next_token;
        let events = self.events.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(SessionEvent::TimerFired { kind, token });
        });

        trace!("Armed {:?} timer ({} ms, token {})", kind, delay.as_millis(), token);
        self.armed.insert(kind, ArmedTimer { token, task });
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        if let Some(timer) = self.armed.remove(&kind) {
            timer.task.abort();
            trace!("Cancelled {:?} timer (token {})", kind, timer.token);
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, timer) in self.armed.drain() {
            timer.task.abort();
        }
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed.contains_key(&kind)
    }

    /// Claim a firing. Returns false for a stale token; true means the timer
    /// is now consumed and no longer armed.
    pub fn take_fired(&mut self, kind: TimerKind, token: u64) -> bool {
        match self.armed.get(&kind) {
            Some(timer) if timer.token == token => {
                self.armed.remove(&kind);
                true
            }
            _ => false,
        }
    }
}

impl Drop for TimerBank {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn next_fired(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> (TimerKind, u64) {
        match rx.recv().await {
            Some(SessionEvent::TimerFired { kind, token }) => (kind, token),
            _ => panic!("expected a timer firing"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_supersedes_previous() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bank = TimerBank::new(tx);

        bank.arm(TimerKind::Silence, Duration::from_millis(2000));
        bank.arm(TimerKind::Silence, Duration::from_millis(1500));

        let (kind, token) = next_fired(&mut rx).await;
        assert_eq!(kind, TimerKind::Silence);
        assert!(bank.take_fired(kind, token));
        assert!(!bank.is_armed(TimerKind::Silence));

        // The first arm was aborted and never fires
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_firing_is_rejected() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bank = TimerBank::new(tx);

        bank.arm(TimerKind::Restart, Duration::from_millis(300));
        let (kind, token) = next_fired(&mut rx).await;

        // Re-armed after the firing was queued but before it was handled
        bank.arm(TimerKind::Restart, Duration::from_millis(300));
        assert!(!bank.take_fired(kind, token));
        assert!(bank.is_armed(TimerKind::Restart));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bank = TimerBank::new(tx);

        bank.arm(TimerKind::Silence, Duration::from_millis(100));
        bank.arm(TimerKind::ConversationIdle, Duration::from_millis(100));
        bank.arm(TimerKind::Restart, Duration::from_millis(100));
        bank.cancel_all();

        assert!(!bank.is_armed(TimerKind::Silence));
        assert!(!bank.is_armed(TimerKind::ConversationIdle));
        assert!(!bank.is_armed(TimerKind::Restart));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }
}
