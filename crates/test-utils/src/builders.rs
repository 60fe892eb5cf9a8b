#![allow(dead_code)]

use std::time::Duration;

use tokio::sync::mpsc;

use soloist::lease::Lease;
use soloist::signals::ShutdownSignal;
use soloist::supervisor::{Supervisor, SupervisorOptions};

use crate::memory_store::MemoryStore;

/// Builder for a [`Lease`] on a shared [`MemoryStore`], to cut down on test
/// setup noise.
pub struct LeaseBuilder {
    store: MemoryStore,
    key: String,
    token: String,
    ttl: Duration,
}

impl LeaseBuilder {
    pub fn new(store: &MemoryStore) -> Self {
        Self {
            store: store.clone(),
            key: "soloist:test".to_string(),
            token: "node-1".to_string(),
            ttl: Duration::from_millis(300),
        }
    }

    pub fn key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.token = token.to_string();
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn build(self) -> Lease<MemoryStore> {
        Lease::new(self.store, self.key, self.token, self.ttl)
    }
}

/// Builder for a [`Supervisor`] over a [`MemoryStore`]-backed lease.
///
/// `build` returns the supervisor plus the sending side of its shutdown
/// channel, so tests can deliver "signals" at chosen moments.
pub struct SupervisorBuilder {
    lease: LeaseBuilder,
    command: String,
    shell: bool,
    options: SupervisorOptions,
}

impl SupervisorBuilder {
    pub fn new(store: &MemoryStore, command: &str) -> Self {
        Self {
            lease: LeaseBuilder::new(store),
            command: command.to_string(),
            shell: true,
            options: SupervisorOptions::default(),
        }
    }

    pub fn token(mut self, token: &str) -> Self {
        self.lease = self.lease.token(token);
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.lease = self.lease.ttl(ttl);
        self
    }

    pub fn shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    pub fn self_heal(mut self, self_heal: bool) -> Self {
        self.options.self_heal = self_heal;
        self
    }

    pub fn grace(mut self, grace: Duration) -> Self {
        self.options.grace = grace;
        self
    }

    pub fn build(self) -> (Supervisor<MemoryStore>, mpsc::Sender<ShutdownSignal>) {
        let (tx, rx) = mpsc::channel(1);
        let supervisor = Supervisor::new(
            self.lease.build(),
            self.command,
            self.shell,
            self.options,
            rx,
        );
        (supervisor, tx)
    }
}
