//! The outbound side of the messaging transport.
//!
//! Different frontends (Telegram, test fakes) implement
//! [`NotificationChannel`] to carry the broker's messages.
//!
//! # Example
//!
//! ```rust,ignore
//! use confgate_core::{ChannelResult, ConfigDocument, DecisionToken, NotificationChannel, RecipientId};
//!
//! struct StdoutChannel;
//!
//! #[async_trait::async_trait]
//! impl NotificationChannel for StdoutChannel {
//!     async fn send_text(&self, recipient: RecipientId, text: &str) -> ChannelResult<()> {
//!         println!("to {recipient}: {text}");
//!         Ok(())
//!     }
//!     // ...
//! }
//! ```

use async_trait::async_trait;

use crate::decision::DecisionToken;
use crate::error::ChannelResult;
use crate::types::{ConfigDocument, RecipientId};

/// Send primitives the broker needs from a transport.
///
/// Every call may fail; the broker decides per call whether a failure is
/// compensated, reported, or only logged.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, recipient: RecipientId, text: &str) -> ChannelResult<()>;

    /// Send a file with a caption.
    async fn send_document(
        &self,
        recipient: RecipientId,
        document: ConfigDocument,
        caption: &str,
    ) -> ChannelResult<()>;

    /// Send a message with two selectable actions bound to `approve` and
    /// `reject`.
    async fn send_decision_prompt(
        &self,
        recipient: RecipientId,
        text: &str,
        approve: &DecisionToken,
        reject: &DecisionToken,
    ) -> ChannelResult<()>;
}
