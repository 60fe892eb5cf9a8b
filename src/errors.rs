// src/errors.rs

//! Crate-wide error taxonomy and exit-code mapping.
//!
//! Every fatal condition that can stop `soloist` before (or outside of) the
//! supervision loop ends up here; conditions that end supervision in an
//! orderly way are modelled as [`crate::outcome::Outcome`] instead. `main`
//! is the only place that turns either into a real process exit.

use thiserror::Error;

use crate::store::StoreError;

/// BSD sysexits-style exit codes, kept distinguishable so a process manager
/// wrapping `soloist` can tell the failure modes apart.
pub const EX_USAGE: i32 = 64;
pub const EX_NOHOST: i32 = 68;
pub const EX_UNAVAILABLE: i32 = 69;
pub const EX_PROTOCOL: i32 = 76;

/// Errors produced outside the orderly shutdown paths.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SoloistError {
    /// Bad or unreadable configuration (includes an untokenizable command).
    #[error("invalid configuration: {0:#}")]
    Config(anyhow::Error),

    /// The coordination store could not be used (unreachable, too old, or a
    /// command failed at a point where supervision had not started yet).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The supervised command could not be spawned.
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The OS refused to report on the child process.
    #[error("failed to poll child process: {0}")]
    Child(#[source] std::io::Error),

    /// Signal handlers could not be installed at startup.
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),
}

impl SoloistError {
    /// Exit code reported to the parent process for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            SoloistError::Config(_) => EX_USAGE,
            SoloistError::Store(StoreError::Unreachable(_)) => EX_NOHOST,
            SoloistError::Store(StoreError::VersionTooOld { .. }) => EX_PROTOCOL,
            SoloistError::Store(StoreError::Command(_)) => EX_UNAVAILABLE,
            SoloistError::Spawn { .. } | SoloistError::Child(_) => 1,
            SoloistError::Signals(_) => 1,
        }
    }
}
