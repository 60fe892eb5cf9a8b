// src/signals.rs

//! OS signal handling for `soloist`.
//!
//! Signals are never acted on from interrupt context. A background listener
//! task converts each delivery into a [`ShutdownSignal`] message on a channel
//! that the supervisor loop polls, so cleanup always runs on the main line
//! of control.
//!
//! On Unix, SIGINT, SIGTERM and SIGHUP are handled. On other platforms only
//! Ctrl-C is available and is reported as [`ShutdownSignal::Interrupt`].

use tokio::sync::mpsc;

/// The shutdown-relevant signals, abstracted away from raw signal numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
    Hangup,
}

impl ShutdownSignal {
    /// Conventional 128+n exit code for a signal-driven shutdown.
    pub fn exit_code(self) -> i32 {
        128 + self.number()
    }

    /// The Unix signal number this variant corresponds to.
    pub fn number(self) -> i32 {
        match self {
            ShutdownSignal::Interrupt => 2,
            ShutdownSignal::Terminate => 15,
            ShutdownSignal::Hangup => 1,
        }
    }

    /// Human-readable name for logging.
    pub fn as_str(self) -> &'static str {
        match self {
            ShutdownSignal::Interrupt => "SIGINT",
            ShutdownSignal::Terminate => "SIGTERM",
            ShutdownSignal::Hangup => "SIGHUP",
        }
    }
}

/// Install the signal handlers and return the receiving end of the shutdown
/// channel.
///
/// The listener keeps forwarding signals for the lifetime of the process, so
/// a second Ctrl-C while cleanup is running is still observed (and ignored
/// by the supervisor, which is already shutting down).
#[cfg(unix)]
pub fn spawn_listener() -> std::io::Result<mpsc::Receiver<ShutdownSignal>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        loop {
            let sig = tokio::select! {
                _ = sigint.recv() => ShutdownSignal::Interrupt,
                _ = sigterm.recv() => ShutdownSignal::Terminate,
                _ = sighup.recv() => ShutdownSignal::Hangup,
            };
            if tx.send(sig).await.is_err() {
                break;
            }
        }
    });

    Ok(rx)
}

/// Non-Unix fallback: only Ctrl-C is available.
#[cfg(not(unix))]
pub fn spawn_listener() -> std::io::Result<mpsc::Receiver<ShutdownSignal>> {
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                break;
            }
            if tx.send(ShutdownSignal::Interrupt).await.is_err() {
                break;
            }
        }
    });

    Ok(rx)
}
