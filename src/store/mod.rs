// src/store/mod.rs

//! Coordination store abstraction.
//!
//! The lease never talks to Redis directly; it goes through the
//! [`LeaseStore`] trait, which exposes exactly the three primitives the
//! protocol needs. The production implementation is [`RedisStore`]; tests
//! substitute an in-process store with the same semantics.

pub mod redis;

pub use redis::{MINIMUM_REDIS_VERSION, RedisStore, version_is_at_least};

use async_trait::async_trait;
use thiserror::Error;

/// Failures talking to the coordination store.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached at all.
    #[error("coordination store unreachable: {0}")]
    Unreachable(String),

    /// The store is reachable but too old to support atomic scripted
    /// renewal.
    #[error("store version {found} is older than required {minimum}")]
    VersionTooOld { found: String, minimum: String },

    /// Any other store command failure.
    #[error("store command failed: {0}")]
    Command(String),
}

/// The narrow key-value contract the lease protocol relies on.
///
/// Implementations must make each operation atomic on the server side;
/// in particular `compare_and_extend` must never be a client-side
/// get-then-set, which is unsound under concurrent access.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Write `value` into `key` with a TTL of `ttl_ms`, only if the key does
    /// not already exist. Returns whether the write happened.
    async fn put_if_absent(&self, key: &str, value: &str, ttl_ms: u64) -> Result<bool, StoreError>;

    /// Plain read of `key`. `None` if the key is absent (or expired).
    async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Atomically: read `key`, compare to `expected`, and reset the TTL to
    /// `ttl_ms` on a match. Returns whether the extend happened; on a
    /// mismatch nothing is mutated.
    async fn compare_and_extend(
        &self,
        key: &str,
        expected: &str,
        ttl_ms: u64,
    ) -> Result<bool, StoreError>;
}
