//! Configuration types.
//!
//! All sections use `#[serde(default)]` so a partial file only overrides the
//! keys it names.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The resolved broker configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bot credentials and the approver identity.
    pub telegram: TelegramSection,
    /// Where the config files live.
    pub pool: PoolSection,
    /// Pending request expiry.
    pub pending: PendingSection,
    /// Log output.
    pub logging: LoggingSection,
}

/// `[telegram]` section.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    /// Bot API token. Never serialized.
    #[serde(skip_serializing)]
    pub bot_token: Option<String>,
    /// Chat id of the single approver.
    pub approver_id: i64,
}

impl std::fmt::Debug for TelegramSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSection")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[REDACTED]"))
            .field("approver_id", &self.approver_id)
            .finish()
    }
}

/// `[pool]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSection {
    /// Directory holding `available/` and `used/`.
    pub root: String,
    /// File extension that marks a config file, including the dot.
    pub extension: String,
}

impl Default for PoolSection {
    fn default() -> Self {
        Self {
            root: "configs".to_owned(),
            extension: ".conf".to_owned(),
        }
    }
}

/// `[pending]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PendingSection {
    /// Seconds a request may wait for a decision. Unset means forever.
    pub ttl_secs: Option<u64>,
    /// How often the reaper checks for expired requests.
    pub reap_interval_secs: u64,
}

impl Default for PendingSection {
    fn default() -> Self {
        Self {
            ttl_secs: None,
            reap_interval_secs: 60,
        }
    }
}

impl PendingSection {
    /// The pending TTL, if one is configured.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }

    /// Interval between reaper runs.
    #[must_use]
    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Output format (`pretty`, `compact`, `json`).
    pub format: String,
    /// Extra `EnvFilter` directives, e.g. `teloxide=warn`.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
        }
    }
}
