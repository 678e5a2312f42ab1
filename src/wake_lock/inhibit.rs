use super::{WakeLock, WakeLockHandle, WakeLockLease};
use anyhow::{Context, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long the inhibitor must stay up before the lock counts as held
const STARTUP_GRACE: Duration = Duration::from_millis(200);

/// Wake lock backed by a `systemd-inhibit` child process
///
/// The inhibitor lives exactly as long as the child. Killing it releases the
/// lock; the child dying on its own (logind restart, OOM, manual kill) is
/// reported through the lease's `revoked` signal.
#[derive(Debug, Clone)]
pub struct InhibitWakeLock {
    program: String,
    what: String,
    who: String,
    why: String,
}

impl InhibitWakeLock {
    pub fn new(who: impl Into<String>) -> Self {
        Self {
            program: "systemd-inhibit".to_string(),
            what: "idle:sleep".to_string(),
            who: who.into(),
            why: "Voice session is listening".to_string(),
        }
    }

    /// Use a different inhibitor binary (e.g. a wrapper script)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

struct InhibitHandle {
    kill_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

#[async_trait::async_trait]
impl WakeLockHandle for InhibitHandle {
    async fn release(self: Box<Self>) -> Result<()> {
        let InhibitHandle { kill_tx, task } = *self;
        // Already gone if the inhibitor exited by itself
        let _ = kill_tx.send(());
        task.await.context("Wake lock supervisor task panicked")?;
        info!("Wake lock released");
        Ok(())
    }
}

#[async_trait::async_trait]
impl WakeLock for InhibitWakeLock {
    async fn acquire(&self) -> Result<WakeLockLease> {
        let mut child = Command::new(&self.program)
            .arg(format!("--what={}", self.what))
            .arg(format!("--who={}", self.who))
            .arg(format!("--why={}", self.why))
            .arg("--mode=block")
            .args(["sleep", "infinity"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.program))?;

        // systemd-inhibit exits at once when logind is unreachable
        if let Ok(status) = tokio::time::timeout(STARTUP_GRACE, child.wait()).await {
            let status = status.with_context(|| format!("Failed to wait on {}", self.program))?;
            anyhow::bail!("{} exited during startup ({})", self.program, status);
        }

        let (kill_tx, kill_rx) = oneshot::channel();
        let (revoked_tx, revoked_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    warn!("Wake lock inhibitor exited on its own: {:?}", status);
                    let _ = revoked_tx.send(());
                }
                _ = kill_rx => {
                    if let Err(e) = child.kill().await {
                        warn!("Failed to stop wake lock inhibitor: {}", e);
                    }
                    debug!("Wake lock inhibitor stopped");
                }
            }
        });

        info!("Wake lock acquired via {}", self.program);

        Ok(WakeLockLease {
            handle: Box::new(InhibitHandle {
                kill_tx,
                task,
            }),
            revoked: revoked_rx,
        })
    }

    fn name(&self) -> &str {
        &self.program
    }
}
