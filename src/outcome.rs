// src/outcome.rs

//! Terminal outcome of a supervision run.
//!
//! The supervisor never calls `std::process::exit` itself; it returns one of
//! these values up to `main`, which performs the single real exit. That keeps
//! the whole run loop testable in-process.

use crate::errors::EX_UNAVAILABLE;
use crate::signals::ShutdownSignal;

/// How a `soloist` run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `--check` mode: config loaded and validated, nothing executed.
    ConfigChecked,

    /// The supervised child exited on its own with the given code. Fatal by
    /// design; restarting is delegated to whatever relaunches soloist.
    ChildExited(i32),

    /// The lease was stolen, could not be re-acquired, or the store became
    /// unusable during renewal. Another node is the presumptive singleton.
    LeaseLost,

    /// An OS signal requested shutdown; the child has been cleaned up.
    Interrupted(ShutdownSignal),
}

impl Outcome {
    /// Exit code reported to the parent process for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::ConfigChecked => 0,
            Outcome::ChildExited(_) => 1,
            Outcome::LeaseLost => EX_UNAVAILABLE,
            Outcome::Interrupted(sig) => sig.exit_code(),
        }
    }
}
