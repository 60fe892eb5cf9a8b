// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [command]
/// run = "some-daemon --flag"
/// shell = false
///
/// [redis]
/// host = "127.0.0.1"
/// port = 6379
///
/// [lock]
/// ttl_ms = 1000
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// The supervised command from `[command]`.
    pub command: CommandSection,

    /// Coordination store connection details from `[redis]`.
    pub redis: RedisSection,

    /// Lease behaviour from `[lock]`.
    pub lock: LockSection,
}

impl ConfigFile {
    /// The effective lock name: the configured one, or a name derived from
    /// the supervised command.
    pub fn lock_name(&self) -> String {
        match &self.lock.name {
            Some(name) => name.clone(),
            None => format!("soloist:{}", self.command.run),
        }
    }
}

/// `[command]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandSection {
    /// The command line to execute while the lease is held.
    pub run: String,

    /// If true, hand `run` verbatim to `sh -c`; if false, tokenize it into
    /// an argument vector and exec directly.
    pub shell: bool,
}

/// `[redis]` section.
///
/// A `host` containing a `/` is interpreted as a unix socket path, in which
/// case `port` is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSection {
    /// Hostname, IP address, or unix socket path.
    pub host: String,

    /// TCP port; ignored for unix sockets.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database index to select.
    #[serde(default)]
    pub database: i64,

    /// Optional AUTH password.
    #[serde(default)]
    pub password: Option<String>,
}

fn default_port() -> u16 {
    6379
}

impl RedisSection {
    /// Whether `host` names a unix socket path rather than a TCP endpoint.
    pub fn is_unix_socket(&self) -> bool {
        self.host.contains('/')
    }
}

/// `[lock]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LockSection {
    /// Lease key in the store; defaults to `soloist:<command.run>`.
    #[serde(default)]
    pub name: Option<String>,

    /// Lease TTL in milliseconds. The renewal interval is derived from this
    /// (ttl / 3), so renewal gets at least three attempts per TTL window.
    pub ttl_ms: u64,

    /// Whether a failed renewal over a key that turns out to be unowned may
    /// be resolved by re-acquiring it instead of giving up.
    #[serde(default = "default_self_heal")]
    pub self_heal: bool,
}

fn default_self_heal() -> bool {
    true
}
