//! Error types for the Telegram bot.

use thiserror::Error;

/// Errors produced by the Telegram bot.
#[derive(Debug, Error)]
pub enum TelegramBotError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The config store could not be opened.
    #[error("config store error: {0}")]
    Store(#[from] confgate_core::PoolError),
}

/// Convenience alias.
pub type TelegramResult<T> = Result<T, TelegramBotError>;
