//! Configuration for the Telegram bot.
//!
//! Loads settings from the layered confgate config (`~/.confgate/config.toml`
//! with `TOKEN` / `ADMIN_ID` / `CONFGATE_*` fallbacks) and flattens them into
//! what the bot needs at runtime.

use std::path::{Path, PathBuf};
use std::time::Duration;

use confgate_config::{Config, ResolvedConfig};
use confgate_core::RecipientId;
use confgate_telemetry::LogConfig;
use tracing::{debug, info};

use crate::error::{TelegramBotError, TelegramResult};

/// Telegram bot configuration.
#[derive(Clone)]
pub struct BotConfig {
    /// Telegram Bot API token (from `@BotFather`).
    pub bot_token: String,
    /// The only identity allowed to decide requests.
    pub approver: RecipientId,
    /// Directory holding `available/` and `used/`.
    pub pool_root: PathBuf,
    /// Config file extension, including the dot.
    pub extension: String,
    /// How long a request may wait before it is released.
    pub pending_ttl: Option<Duration>,
    /// Reaper period.
    pub reap_interval: Duration,
    /// Logging setup derived from `[logging]`.
    pub logging: LogConfig,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &"[REDACTED]")
            .field("approver", &self.approver)
            .field("pool_root", &self.pool_root)
            .field("extension", &self.extension)
            .field("pending_ttl", &self.pending_ttl)
            .field("reap_interval", &self.reap_interval)
            .finish_non_exhaustive()
    }
}

impl BotConfig {
    /// Load and flatten the layered configuration.
    ///
    /// `path` replaces `~/.confgate/config.toml` when given.
    pub fn load(path: Option<&Path>) -> TelegramResult<Self> {
        let resolved = Config::load(path).map_err(|e| TelegramBotError::Config(e.to_string()))?;
        debug!(files = ?resolved.loaded_files, "loaded config");
        info!(
            bot_token = %credential_source(&resolved, "telegram.bot_token"),
            approver_id = %credential_source(&resolved, "telegram.approver_id"),
            "credential sources"
        );
        Self::from_config(&resolved.config)
    }

    /// Flatten an already validated [`Config`].
    pub fn from_config(config: &Config) -> TelegramResult<Self> {
        let bot_token = config
            .telegram
            .bot_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                TelegramBotError::Config(
                    "bot_token is required; set [telegram] bot_token in \
                     ~/.confgate/config.toml or the TOKEN env var"
                        .to_owned(),
                )
            })?;

        let logging = LogConfig::try_from(&config.logging)
            .map_err(|e| TelegramBotError::Config(e.to_string()))?;

        Ok(Self {
            bot_token,
            approver: RecipientId(config.telegram.approver_id),
            pool_root: PathBuf::from(&config.pool.root),
            extension: config.pool.extension.clone(),
            pending_ttl: config.pending.ttl(),
            reap_interval: config.pending.reap_interval(),
            logging,
        })
    }
}

/// Human-readable layer that supplied `field`, for startup logs.
fn credential_source(resolved: &ResolvedConfig, field: &str) -> String {
    resolved
        .source_of(field)
        .map_or_else(|| "unset".to_owned(), |layer| layer.to_string())
}
