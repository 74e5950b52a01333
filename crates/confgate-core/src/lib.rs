//! Confgate Core - brokering single-use VPN config files behind a human approver.
//!
//! This crate holds the request/approval/allocation workflow and nothing
//! transport specific:
//!
//! - [`ConfigPool`]: the set of available, reserved and consumed config files.
//!   [`FsConfigPool`] backs it with two directories, [`MemoryConfigPool`] keeps
//!   everything in memory for tests.
//! - [`RequestRegistry`]: which requester currently holds which reserved file.
//! - [`ApprovalBroker`]: the state machine tying both together and talking to
//!   the outside world through a [`NotificationChannel`].
//!
//! # Lifecycle
//!
//! ```text
//! [Idle] --request--> [AwaitingDecision] --approve--> [Delivering] --ok--> [Done]
//!                                        |                        --err--> [Released] -> [Done]
//!                                        --reject---> [Released] -> [Done]
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use confgate_core::testing::RecordingChannel;
//! use confgate_core::{
//!     ApprovalBroker, Decision, DecisionOutcome, MemoryConfigPool, Outcome, RecipientId,
//!     RequestOutcome, Requester,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), confgate_core::BrokerError> {
//! let pool = MemoryConfigPool::with_files(["A.conf", "B.conf"]);
//! let channel = Arc::new(RecordingChannel::new());
//! let broker = ApprovalBroker::new(pool, channel, RecipientId(1));
//!
//! let requester = Requester::new(RecipientId(42), "Ada Lovelace", Some("ada"));
//! let outcome = broker.request(requester).await?;
//! assert!(matches!(outcome, RequestOutcome::Prompted { .. }));
//!
//! let decision = Decision::new(RecipientId(42), Outcome::Approve);
//! assert!(matches!(broker.decide(decision).await, DecisionOutcome::Approved { .. }));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod broker;
pub mod channel;
pub mod decision;
/// Error types and results for the broker and its collaborators.
pub mod error;
pub mod messages;
pub mod pool;
pub mod registry;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod types;

pub use broker::{ApprovalBroker, DecisionOutcome, RequestOutcome};
pub use channel::NotificationChannel;
pub use decision::{Decision, DecisionToken, Outcome};
pub use error::{
    BrokerError, BrokerResult, ChannelError, ChannelResult, PoolError, PoolResult, RegistryError,
    RegistryResult, TokenError,
};
pub use pool::{ConfigPool, DEFAULT_EXTENSION, FsConfigPool, MemoryConfigPool, StockLevels};
pub use registry::{PendingRequest, RequestRegistry};
pub use types::{ConfigDocument, ConfigFile, ConfigState, RecipientId, Requester};
