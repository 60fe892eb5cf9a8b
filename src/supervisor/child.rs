// src/supervisor/child.rs

//! The supervised child process.
//!
//! Spawning follows the configured mode: `shell = true` hands the raw
//! command string to `sh -c`, `shell = false` tokenizes it into an argument
//! vector and execs directly. Either way the child inherits our standard
//! streams.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::errors::SoloistError;

/// How often the shutdown path re-polls the child inside the grace window.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Handle on a spawned child process.
pub struct ChildHandle {
    child: Child,
    pid: u32,
    exited: Option<ExitStatus>,
}

impl ChildHandle {
    /// Spawn the command.
    pub fn spawn(command: &str, shell: bool) -> Result<Self, SoloistError> {
        let mut cmd = if shell {
            let mut c = Command::new("sh");
            c.arg("-c").arg(command);
            c
        } else {
            // Tokenization errors are caught at config validation; a failure
            // here still maps to the same config error.
            let argv = split_command(command).map_err(|e| SoloistError::Config(anyhow::anyhow!(e)))?;
            let (program, args) = argv
                .split_first()
                .ok_or_else(|| SoloistError::Config(anyhow::anyhow!("empty command")))?;
            let mut c = Command::new(program);
            c.args(args);
            c
        };

        // Stdio is inherited by default; the child writes to our terminal.
        let child = cmd.spawn().map_err(|source| SoloistError::Spawn {
            command: command.to_string(),
            source,
        })?;

        // `id()` is Some until the child has been reaped, which cannot have
        // happened yet.
        let pid = child.id().unwrap_or_default();

        Ok(Self {
            child,
            pid,
            exited: None,
        })
    }

    /// OS process id of the child.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Non-blocking poll of the child's exit status.
    ///
    /// Once an exit has been observed it is cached, so polling after the
    /// child is reaped keeps reporting the same status.
    pub fn poll(&mut self) -> std::io::Result<Option<ExitStatus>> {
        if self.exited.is_some() {
            return Ok(self.exited);
        }
        if let Some(status) = self.child.try_wait()? {
            self.exited = Some(status);
        }
        Ok(self.exited)
    }

    /// Whether the child is known to have exited.
    pub fn is_exited(&self) -> bool {
        self.exited.is_some()
    }

    /// Stop the child: graceful termination first, escalating to a forced
    /// kill if it outlives the grace window.
    ///
    /// Idempotent — calling this on an already-exited child does nothing and
    /// never re-signals. On success the child is guaranteed to no longer be
    /// running.
    pub async fn shutdown(&mut self, grace: Duration) -> std::io::Result<()> {
        if self.poll()?.is_some() {
            debug!(pid = self.pid, "child already exited, nothing to stop");
            return Ok(());
        }

        info!(pid = self.pid, "sending TERM to child");
        self.send_term();

        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            sleep(SHUTDOWN_POLL_INTERVAL).await;
            if self.poll()?.is_some() {
                return Ok(());
            }
        }

        info!(pid = self.pid, "sending KILL to child");
        self.child.start_kill()?;
        let status = self.child.wait().await?;
        self.exited = Some(status);
        Ok(())
    }

    #[cfg(unix)]
    fn send_term(&self) {
        // pid 0 would address our whole process group.
        if self.pid == 0 {
            return;
        }
        // ESRCH just means the child beat us to exiting; the poll loop will
        // observe that.
        let rc = unsafe { libc::kill(self.pid as i32, libc::SIGTERM) };
        if rc != 0 {
            debug!(pid = self.pid, "TERM not delivered, child likely already gone");
        }
    }

    #[cfg(not(unix))]
    fn send_term(&self) {
        // No graceful signal available; the grace window still applies
        // before the hard kill.
    }
}

/// Tokenize a command line into an argument vector with POSIX-ish quoting:
/// single quotes are literal, double quotes honour `\"` and `\\`, and a
/// backslash outside quotes escapes the next character.
pub fn split_command(command: &str) -> Result<Vec<String>, String> {
    let mut argv = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = command.chars();

    loop {
        let Some(c) = chars.next() else { break };
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    argv.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err("unterminated single quote".to_string()),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err("unterminated double quote".to_string()),
                        },
                        Some(c) => current.push(c),
                        None => return Err("unterminated double quote".to_string()),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => return Err("trailing backslash".to_string()),
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        argv.push(current);
    }

    Ok(argv)
}
