// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod lease;
pub mod logging;
pub mod outcome;
pub mod signals;
pub mod store;
pub mod supervisor;

use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::loader::load_and_validate;
use crate::errors::SoloistError;
use crate::lease::Lease;
use crate::outcome::Outcome;
use crate::store::RedisStore;
use crate::supervisor::{Supervisor, SupervisorOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the Redis store adapter (with its version gate)
/// - the lease and its owner token
/// - the signal listener
/// - the supervisor
///
/// All terminal conditions come back as an [`Outcome`] or a
/// [`SoloistError`]; the actual process exit happens in `main`.
pub async fn run(args: CliArgs) -> Result<Outcome, SoloistError> {
    let cfg = load_and_validate(&args.config).map_err(SoloistError::Config)?;

    if args.check {
        print_check(&cfg);
        return Ok(Outcome::ConfigChecked);
    }

    let store = RedisStore::connect(&cfg.redis).await?;

    let lease = Lease::new(
        store,
        cfg.lock_name(),
        lease::owner_token(),
        Duration::from_millis(cfg.lock.ttl_ms),
    );

    let shutdown_rx = signals::spawn_listener().map_err(SoloistError::Signals)?;

    let options = SupervisorOptions {
        self_heal: cfg.lock.self_heal,
        ..SupervisorOptions::default()
    };

    let supervisor = Supervisor::new(
        lease,
        cfg.command.run.clone(),
        cfg.command.shell,
        options,
        shutdown_rx,
    );

    supervisor.run().await
}

/// Simple `--check` output: print the effective settings.
fn print_check(cfg: &ConfigFile) {
    println!("soloist check");
    println!("  command.run = {}", cfg.command.run);
    println!("  command.shell = {}", cfg.command.shell);
    if cfg.redis.is_unix_socket() {
        println!("  redis = unix socket {}", cfg.redis.host);
    } else {
        println!("  redis = {}:{}", cfg.redis.host, cfg.redis.port);
    }
    println!("  redis.database = {}", cfg.redis.database);
    println!(
        "  redis.password = {}",
        if cfg.redis.password.is_some() { "set" } else { "unset" }
    );
    println!("  lock.name = {}", cfg.lock_name());
    println!("  lock.ttl_ms = {}", cfg.lock.ttl_ms);
    println!("  lock.self_heal = {}", cfg.lock.self_heal);
}
