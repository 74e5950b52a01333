use std::io;

use crate::types::RecipientId;

/// Errors raised by a [`ConfigPool`](crate::pool::ConfigPool).
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The backing file disappeared between reserve and consume.
    #[error("config file '{0}' is missing from the store")]
    FileMissing(String),

    /// A file with the same name was already consumed.
    #[error("config file '{0}' was already consumed")]
    AlreadyConsumed(String),

    /// The file is not currently reserved.
    #[error("config file '{0}' is not reserved")]
    NotReserved(String),

    /// Storage I/O failed.
    #[error("store I/O error at {path}: {source}")]
    Io {
        /// Path the operation was touching.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors raised by the [`RequestRegistry`](crate::registry::RequestRegistry).
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The requester already has an open request.
    #[error("requester {0} already has a pending request")]
    AlreadyPending(RecipientId),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised by a [`NotificationChannel`](crate::channel::NotificationChannel).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChannelError {
    /// The recipient could not be reached (blocked the bot, unknown chat, ...).
    #[error("recipient {recipient} unreachable: {reason}")]
    Unreachable {
        /// Who we tried to reach.
        recipient: RecipientId,
        /// Transport-provided reason.
        reason: String,
    },

    /// The transport failed independently of the recipient.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors raised when parsing a [`DecisionToken`](crate::decision::DecisionToken).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The string is not a decision token at all.
    #[error("not a decision token")]
    NotDecisionToken,

    /// The verb is neither `approve` nor `reject`.
    #[error("unknown decision '{0}'")]
    UnknownOutcome(String),

    /// The requester id is not an integer.
    #[error("invalid requester id '{0}'")]
    InvalidRequester(String),
}

/// Errors surfaced by [`ApprovalBroker::request`](crate::broker::ApprovalBroker::request).
///
/// Decisions never fail: every fault on that path is folded into a
/// [`DecisionOutcome`](crate::broker::DecisionOutcome).
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// The store could not be read while reserving.
    #[error("config store error: {0}")]
    Store(#[from] PoolError),

    /// The approver could not be prompted; the reservation was released.
    #[error("could not reach the approver: {reason}")]
    PromptUndeliverable {
        /// Transport-provided reason.
        reason: String,
    },
}

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;
