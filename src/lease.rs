// src/lease.rs

//! The lease protocol: acquire, ownership-checked renew, ownership lookup.
//!
//! A lease is a record in the coordination store holding one owner token
//! with a countdown expiry. Whoever wins the conditional "set if absent"
//! holds it until the TTL lapses, unless they keep renewing. Ownership is
//! proven by value, not by connection, so a renewal after a store reconnect
//! is still valid.

use std::time::Duration;

use tracing::debug;

use crate::store::{LeaseStore, StoreError};

/// A handle on one contested lease key.
pub struct Lease<S> {
    store: S,
    key: String,
    token: String,
    ttl: Duration,
    poll_interval: Duration,
}

impl<S: LeaseStore> Lease<S> {
    /// Create a lease handle.
    ///
    /// `token` identifies this process instance and is the compare-value for
    /// every ownership-sensitive operation. `ttl` must be positive (enforced
    /// at config validation). The poll interval is `ttl / 3`, so the holder
    /// gets at least three renewal attempts per TTL window.
    pub fn new(store: S, key: impl Into<String>, token: impl Into<String>, ttl: Duration) -> Self {
        let poll_interval = (ttl / 3).max(Duration::from_millis(1));
        Self {
            store,
            key: key.into(),
            token: token.into(),
            ttl,
            poll_interval,
        }
    }

    /// Try to acquire the lease.
    ///
    /// One conditional write per attempt. If the key is taken and `blocking`
    /// is true, sleeps the poll interval and retries indefinitely — waiting
    /// for our turn is not an error and has no timeout. With `blocking` set
    /// to false, reports failure immediately.
    pub async fn acquire(&self, blocking: bool) -> Result<bool, StoreError> {
        loop {
            if self
                .store
                .put_if_absent(&self.key, &self.token, self.ttl_ms())
                .await?
            {
                return Ok(true);
            }
            if !blocking {
                return Ok(false);
            }
            debug!(key = %self.key, "lease taken, retrying after poll interval");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Renew the lease: atomically check that the stored value is still our
    /// token and reset the TTL. Reports false (and mutates nothing) if the
    /// key is absent or owned by someone else.
    pub async fn renew(&self) -> Result<bool, StoreError> {
        self.store
            .compare_and_extend(&self.key, &self.token, self.ttl_ms())
            .await
    }

    /// The current owner token, or `None` if the key is absent. Pure read.
    pub async fn who(&self) -> Result<Option<String>, StoreError> {
        self.store.fetch(&self.key).await
    }

    /// The contested key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Our owner token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Interval between renewal attempts (ttl / 3).
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn ttl_ms(&self) -> u64 {
        self.ttl.as_millis() as u64
    }
}

/// Owner token for this process instance: host identity plus PID.
///
/// Unique per process (not per node), so two instances on one host, or a
/// restarted instance, cannot be confused with each other.
pub fn owner_token() -> String {
    format!("{}-{}", hostname(), std::process::id())
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("HOST"))
        .unwrap_or_else(|_| "localhost".to_string())
}
