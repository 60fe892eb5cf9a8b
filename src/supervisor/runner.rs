// src/supervisor/runner.rs

//! The supervision state machine.
//!
//! States: acquiring → holding → {recovering, terminating} → exited.
//! Everything runs on one logical line of control: acquisition, spawning,
//! polling, renewal and sleeping are strictly sequential. The only
//! asynchronous input is the shutdown channel fed by the signal listener,
//! which the loop polls between renewals.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::errors::SoloistError;
use crate::lease::Lease;
use crate::outcome::Outcome;
use crate::signals::ShutdownSignal;
use crate::store::LeaseStore;
use crate::supervisor::child::ChildHandle;

/// Policy knobs for the supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    /// Whether a failed renewal over an unowned key may be resolved by
    /// re-acquiring it instead of giving up.
    pub self_heal: bool,

    /// How long the child gets to exit after TERM before KILL.
    pub grace: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            self_heal: true,
            grace: Duration::from_secs(1),
        }
    }
}

/// Supervises one command under one lease.
///
/// Exclusively owns both the lease handle and the child handle; nothing
/// else mutates them.
pub struct Supervisor<S> {
    lease: Lease<S>,
    command: String,
    shell: bool,
    options: SupervisorOptions,
    shutdown_rx: mpsc::Receiver<ShutdownSignal>,
    child: Option<ChildHandle>,
}

impl<S: LeaseStore> Supervisor<S> {
    pub fn new(
        lease: Lease<S>,
        command: impl Into<String>,
        shell: bool,
        options: SupervisorOptions,
        shutdown_rx: mpsc::Receiver<ShutdownSignal>,
    ) -> Self {
        Self {
            lease,
            command: command.into(),
            shell,
            options,
            shutdown_rx,
            child: None,
        }
    }

    /// Run until a terminal condition.
    ///
    /// Cleanup runs on every path out of here, error returns included, so no
    /// child survives the supervisor under normal (non-SIGKILL) termination.
    pub async fn run(mut self) -> Result<Outcome, SoloistError> {
        let result = self.supervise().await;
        self.cleanup().await;
        result
    }

    async fn supervise(&mut self) -> Result<Outcome, SoloistError> {
        info!(
            owner = %self.lease.token(),
            lock = %self.lease.key(),
            "soloist starting"
        );

        // ACQUIRING: no timeout, but stay responsive to shutdown signals.
        match self.lease.who().await? {
            Some(holder) => info!(holder = %holder, "waiting for lock"),
            None => info!("waiting for lock, currently unheld"),
        }

        tokio::select! {
            res = self.lease.acquire(true) => { res?; }
            sig = next_signal(&mut self.shutdown_rx) => {
                warn!(signal = sig.as_str(), "received while waiting for lock, shutting down");
                return Ok(Outcome::Interrupted(sig));
            }
        }

        info!("lock acquired");

        // HOLDING: spawn if absent, poll, renew, sleep.
        loop {
            if self.child.is_none() {
                let handle = ChildHandle::spawn(&self.command, self.shell)?;
                info!(pid = handle.pid(), "spawned child");
                self.child = Some(handle);
            }

            if let Some(child) = self.child.as_mut() {
                if let Some(status) = child.poll().map_err(SoloistError::Child)? {
                    let code = status.code().unwrap_or(-1);
                    error!(exit_code = code, "child died unexpectedly");
                    return Ok(Outcome::ChildExited(code));
                }
            }

            let renewed = match self.lease.renew().await {
                Ok(renewed) => renewed,
                Err(err) => {
                    error!(error = %err, "store failure during lease renewal");
                    false
                }
            };

            if !renewed && !self.handle_failed_renewal().await {
                return Ok(Outcome::LeaseLost);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.lease.poll_interval()) => {}
                sig = next_signal(&mut self.shutdown_rx) => {
                    warn!(signal = sig.as_str(), "received, shutting down");
                    return Ok(Outcome::Interrupted(sig));
                }
            }
        }
    }

    /// Decide whether a failed renewal is survivable.
    ///
    /// Only one narrow case is: the key expired without anyone claiming it
    /// and self-heal is enabled, in which case a single non-blocking
    /// re-acquire may win it back. A stolen lease, a lost race, or a store
    /// failure all end supervision.
    async fn handle_failed_renewal(&mut self) -> bool {
        let holder = match self.lease.who().await {
            Ok(holder) => holder,
            Err(err) => {
                error!(error = %err, "cannot determine lock holder after failed renewal");
                return false;
            }
        };

        match holder {
            None if self.options.self_heal => match self.lease.acquire(false).await {
                Ok(true) => {
                    warn!("lock renewal failed, but successfully re-acquired unclaimed lock");
                    true
                }
                Ok(false) => {
                    error!("lock renewal and subsequent re-acquire failed, giving up");
                    false
                }
                Err(err) => {
                    error!(error = %err, "store failure while re-acquiring unclaimed lock");
                    false
                }
            },
            None => {
                error!("lock expired and self-heal is disabled, giving up");
                false
            }
            Some(holder) => {
                error!(holder = %holder, "lock stolen, bailing out");
                false
            }
        }
    }

    /// Stop the child if there is one. Idempotent, safe with no child.
    async fn cleanup(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return;
        };

        if let Err(err) = child.shutdown(self.options.grace).await {
            error!(error = %err, pid = child.pid(), "failed to stop child during cleanup");
            return;
        }

        // Hard postcondition: the child is not running past this point.
        assert!(child.is_exited(), "child survived cleanup");
    }
}

/// Wait for the next shutdown message; never resolves if the channel is
/// closed (no listener means no signals will arrive this way).
async fn next_signal(rx: &mut mpsc::Receiver<ShutdownSignal>) -> ShutdownSignal {
    match rx.recv().await {
        Some(sig) => sig,
        None => std::future::pending().await,
    }
}
