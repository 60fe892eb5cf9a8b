// src/supervisor/mod.rs

//! Supervision layer.
//!
//! This module ties lease health to the child process lifecycle:
//! - [`child`] owns spawning (shell or tokenized argv), non-blocking exit
//!   polling, and the graceful-then-forceful shutdown of the child.
//! - [`runner`] owns the state machine: block on acquisition, then loop
//!   spawning / polling / renewing / sleeping until a terminal condition.

pub mod child;
pub mod runner;

pub use child::{ChildHandle, split_command};
pub use runner::{Supervisor, SupervisorOptions};
