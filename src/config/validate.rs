// src/config/validate.rs

use anyhow::{Context, Result, anyhow};

use crate::config::model::ConfigFile;
use crate::supervisor::split_command;

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - `command.run` is not empty
/// - non-shell commands tokenize into at least one argument
/// - `lock.ttl_ms` is greater than zero
/// - `lock.name`, if given, is not empty
/// - TCP redis endpoints have a non-zero port
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_command(cfg)?;
    validate_lock(cfg)?;
    validate_redis(cfg)?;
    Ok(())
}

fn validate_command(cfg: &ConfigFile) -> Result<()> {
    if cfg.command.run.trim().is_empty() {
        return Err(anyhow!("[command].run must not be empty"));
    }

    if !cfg.command.shell {
        let argv = split_command(&cfg.command.run)
            .map_err(|e| anyhow!(e))
            .context("invalid [command].run for shell = false")?;
        if argv.is_empty() {
            return Err(anyhow!(
                "[command].run tokenizes to nothing; with shell = false it must name a program"
            ));
        }
    }

    Ok(())
}

fn validate_lock(cfg: &ConfigFile) -> Result<()> {
    if cfg.lock.ttl_ms == 0 {
        return Err(anyhow!("[lock].ttl_ms must be > 0 (got 0)"));
    }

    if let Some(name) = &cfg.lock.name {
        if name.trim().is_empty() {
            return Err(anyhow!("[lock].name must not be empty when set"));
        }
    }

    Ok(())
}

fn validate_redis(cfg: &ConfigFile) -> Result<()> {
    if cfg.redis.host.trim().is_empty() {
        return Err(anyhow!("[redis].host must not be empty"));
    }

    if !cfg.redis.is_unix_socket() && cfg.redis.port == 0 {
        return Err(anyhow!("[redis].port must be non-zero for TCP hosts"));
    }

    Ok(())
}
