//! Test doubles for the broker's collaborators.
//!
//! [`RecordingChannel`] captures every send so tests can assert on exactly
//! what each party was told. Pair it with
//! [`MemoryConfigPool`](crate::pool::MemoryConfigPool).

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::channel::NotificationChannel;
use crate::decision::DecisionToken;
use crate::error::{ChannelError, ChannelResult};
use crate::types::{ConfigDocument, RecipientId};

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    /// A text message.
    Text {
        /// Recipient.
        to: RecipientId,
        /// Body.
        text: String,
    },
    /// A delivered file.
    Document {
        /// Recipient.
        to: RecipientId,
        /// File name.
        name: String,
        /// Caption.
        caption: String,
    },
    /// A decision prompt.
    Prompt {
        /// Recipient.
        to: RecipientId,
        /// Body.
        text: String,
        /// Approve button token.
        approve: DecisionToken,
        /// Reject button token.
        reject: DecisionToken,
    },
}

impl Sent {
    /// Recipient of this message.
    #[must_use]
    pub fn recipient(&self) -> RecipientId {
        match self {
            Self::Text { to, .. } | Self::Document { to, .. } | Self::Prompt { to, .. } => *to,
        }
    }
}

/// A [`NotificationChannel`] that records messages instead of sending them.
///
/// Recipients marked with [`fail_for`](Self::fail_for) are unreachable: the
/// attempt is recorded but the send fails.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    attempts: Mutex<Vec<Sent>>,
    delivered: Mutex<Vec<Sent>>,
    unreachable: Mutex<HashSet<RecipientId>>,
}

impl RecordingChannel {
    /// Create a channel where every recipient is reachable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `recipient` fail.
    pub fn fail_for(&self, recipient: RecipientId) {
        lock(&self.unreachable).insert(recipient);
    }

    /// Make `recipient` reachable again.
    pub fn restore(&self, recipient: RecipientId) {
        lock(&self.unreachable).remove(&recipient);
    }

    /// Every send attempt, successful or not, in order.
    #[must_use]
    pub fn attempts(&self) -> Vec<Sent> {
        lock(&self.attempts).clone()
    }

    /// Successfully sent messages, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<Sent> {
        lock(&self.delivered).clone()
    }

    /// Successfully sent messages addressed to `recipient`.
    #[must_use]
    pub fn sent_to(&self, recipient: RecipientId) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| s.recipient() == recipient)
            .collect()
    }

    /// Bodies of successfully sent text messages to `recipient`.
    #[must_use]
    pub fn texts_to(&self, recipient: RecipientId) -> Vec<String> {
        self.sent_to(recipient)
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Names of files successfully delivered to `recipient`.
    #[must_use]
    pub fn documents_to(&self, recipient: RecipientId) -> Vec<String> {
        self.sent_to(recipient)
            .into_iter()
            .filter_map(|s| match s {
                Sent::Document { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Successfully sent decision prompts.
    #[must_use]
    pub fn prompts(&self) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| matches!(s, Sent::Prompt { .. }))
            .collect()
    }

    fn record(&self, message: Sent) -> ChannelResult<()> {
        let to = message.recipient();
        lock(&self.attempts).push(message.clone());
        if lock(&self.unreachable).contains(&to) {
            return Err(ChannelError::Unreachable {
                recipient: to,
                reason: "recipient marked unreachable".to_string(),
            });
        }
        lock(&self.delivered).push(message);
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send_text(&self, recipient: RecipientId, text: &str) -> ChannelResult<()> {
        self.record(Sent::Text {
            to: recipient,
            text: text.to_string(),
        })
    }

    async fn send_document(
        &self,
        recipient: RecipientId,
        document: ConfigDocument,
        caption: &str,
    ) -> ChannelResult<()> {
        self.record(Sent::Document {
            to: recipient,
            name: document.name,
            caption: caption.to_string(),
        })
    }

    async fn send_decision_prompt(
        &self,
        recipient: RecipientId,
        text: &str,
        approve: &DecisionToken,
        reject: &DecisionToken,
    ) -> ChannelResult<()> {
        self.record(Sent::Prompt {
            to: recipient,
            text: text.to_string(),
            approve: approve.clone(),
            reject: reject.clone(),
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_successful_sends() {
        let channel = RecordingChannel::new();
        channel.send_text(RecipientId(1), "hello").await.unwrap();
        assert_eq!(channel.texts_to(RecipientId(1)), vec!["hello".to_string()]);
        assert_eq!(channel.attempts().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_recipient_fails_but_is_recorded_as_attempt() {
        let channel = RecordingChannel::new();
        channel.fail_for(RecipientId(2));
        let err = channel.send_text(RecipientId(2), "hi").await.unwrap_err();
        assert!(matches!(err, ChannelError::Unreachable { .. }));
        assert!(channel.sent().is_empty());
        assert_eq!(channel.attempts().len(), 1);

        channel.restore(RecipientId(2));
        channel.send_text(RecipientId(2), "hi").await.unwrap();
        assert_eq!(channel.sent().len(), 1);
    }
}
