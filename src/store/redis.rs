// src/store/redis.rs

//! Redis implementation of [`LeaseStore`].
//!
//! Connection handling uses `redis::aio::ConnectionManager`, which
//! reconnects behind the scenes. Ownership is value-based rather than
//! connection-based, so a renewal after a reconnect is still legitimate.

use std::path::PathBuf;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use tracing::{debug, info};

use crate::config::RedisSection;
use crate::store::{LeaseStore, StoreError};

/// Oldest server that supports the atomic Lua renew (EVAL + PEXPIRE).
pub const MINIMUM_REDIS_VERSION: &str = "2.6.12";

/// Lua script for ownership-checked renewal: extend the TTL only while the
/// stored value still equals ours. EVAL runs atomically server-side, so no
/// other writer can interleave between the compare and the extend.
const RENEW_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("pexpire", KEYS[1], ARGV[2])
else
    return 0
end
"#;

/// Redis-backed coordination store.
pub struct RedisStore {
    conn: ConnectionManager,
    renew_script: Script,
}

impl RedisStore {
    /// Connect and validate the server before anything else runs.
    ///
    /// Refuses to construct if the server is unreachable or reports a
    /// version below [`MINIMUM_REDIS_VERSION`]; both are startup failures
    /// with their own exit codes.
    pub async fn connect(cfg: &RedisSection) -> Result<Self, StoreError> {
        let client = redis::Client::open(connection_info(cfg))
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        let mut conn = client
            .get_connection_manager()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        let version = server_version(&mut conn).await?;
        if !version_is_at_least(&version, MINIMUM_REDIS_VERSION) {
            return Err(StoreError::VersionTooOld {
                found: version,
                minimum: MINIMUM_REDIS_VERSION.to_string(),
            });
        }

        info!(version = %version, "connected to redis");

        // The renew capability is prepared once here and reused for every
        // renewal, never lazily re-registered.
        Ok(Self {
            conn,
            renew_script: Script::new(RENEW_SCRIPT),
        })
    }
}

#[async_trait]
impl LeaseStore for RedisStore {
    async fn put_if_absent(&self, key: &str, value: &str, ttl_ms: u64) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();

        // SET key value PX ttl NX: one atomic round trip, replies OK or nil.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Command(e.to_string()))?;

        Ok(reply.is_some())
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();

        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| StoreError::Command(e.to_string()))?;

        Ok(value)
    }

    async fn compare_and_extend(
        &self,
        key: &str,
        expected: &str,
        ttl_ms: u64,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();

        let extended = self
            .renew_script
            .key(key)
            .arg(expected)
            .arg(ttl_ms)
            .invoke_async::<i32>(&mut conn)
            .await
            .map_err(|e| StoreError::Command(e.to_string()))?;

        Ok(extended == 1)
    }
}

fn connection_info(cfg: &RedisSection) -> redis::ConnectionInfo {
    let addr = if cfg.is_unix_socket() {
        redis::ConnectionAddr::Unix(PathBuf::from(&cfg.host))
    } else {
        redis::ConnectionAddr::Tcp(cfg.host.clone(), cfg.port)
    };

    redis::ConnectionInfo {
        addr,
        redis: redis::RedisConnectionInfo {
            db: cfg.database,
            password: cfg.password.clone(),
            ..Default::default()
        },
    }
}

async fn server_version(conn: &mut ConnectionManager) -> Result<String, StoreError> {
    let server: redis::InfoDict = redis::cmd("INFO")
        .arg("server")
        .query_async(conn)
        .await
        .map_err(|e| StoreError::Unreachable(e.to_string()))?;

    server
        .get::<String>("redis_version")
        .ok_or_else(|| StoreError::Command("INFO reply missing redis_version".to_string()))
}

/// Compare dotted server versions numerically, e.g. `"2.8.4" >= "2.6.12"`.
///
/// Missing components count as zero; a component with a non-numeric suffix
/// (some forks report things like `"6.2.build"`) is read up to the first
/// non-digit.
pub fn version_is_at_least(found: &str, minimum: &str) -> bool {
    let parsed = parse_version(found);
    let required = parse_version(minimum);
    debug!(?parsed, ?required, "comparing redis versions");
    parsed >= required
}

fn parse_version(s: &str) -> (u64, u64, u64) {
    let mut parts = s.split('.').map(|part| {
        let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse::<u64>().unwrap_or(0)
    });
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}
