//! Confgate Telegram Bot - standalone binary.
//!
//! Usage: `confgate [CONFIG_PATH]`. Without a path the config is read from
//! `~/.confgate/config.toml` with environment fallbacks.

use std::path::PathBuf;

use confgate_telegram::config::BotConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = BotConfig::load(path.as_deref())?;

    confgate_telemetry::setup_logging(&config.logging)?;

    Box::pin(confgate_telegram::bot::run(config)).await
}
