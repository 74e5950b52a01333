//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Log levels `tracing` understands.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Log output formats.
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json"];

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_telegram(config)?;
    validate_pool(config)?;
    validate_pending(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_telegram(config: &Config) -> ConfigResult<()> {
    let t = &config.telegram;

    if t.bot_token.as_deref().is_none_or(|tok| tok.trim().is_empty()) {
        return Err(invalid(
            "telegram.bot_token",
            "a bot token is required; set it in the config file or via TOKEN",
        ));
    }

    if t.approver_id == 0 {
        return Err(invalid(
            "telegram.approver_id",
            "an approver chat id is required; set it in the config file or via ADMIN_ID",
        ));
    }

    Ok(())
}

fn validate_pool(config: &Config) -> ConfigResult<()> {
    let p = &config.pool;

    if p.root.trim().is_empty() {
        return Err(invalid("pool.root", "pool root must not be empty"));
    }

    if !p.extension.starts_with('.') || p.extension.len() < 2 {
        return Err(invalid(
            "pool.extension",
            format!("extension '{}' must start with '.' and name a suffix", p.extension),
        ));
    }

    Ok(())
}

fn validate_pending(config: &Config) -> ConfigResult<()> {
    let p = &config.pending;

    if p.ttl_secs == Some(0) {
        return Err(invalid("pending.ttl_secs", "ttl_secs must be at least 1"));
    }

    if p.reap_interval_secs == 0 {
        return Err(invalid(
            "pending.reap_interval_secs",
            "reap_interval_secs must be at least 1",
        ));
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !LOG_LEVELS.contains(&l.level.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: {}",
                l.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if !LOG_FORMATS.contains(&l.format.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: {}",
                l.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }

    Ok(())
}
