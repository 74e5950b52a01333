//! [`NotificationChannel`] over the Telegram Bot API.

use async_trait::async_trait;
use confgate_core::{
    ChannelError, ChannelResult, ConfigDocument, DecisionToken, NotificationChannel, RecipientId,
};
use teloxide::Bot;
use teloxide::payloads::{SendDocumentSetters, SendMessageSetters};
use teloxide::requests::Requester as _;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile};
use tracing::debug;

/// Button label for approving a request.
pub const APPROVE_LABEL: &str = "✅ Approve";
/// Button label for rejecting a request.
pub const REJECT_LABEL: &str = "❌ Reject";

/// Sends broker messages as Telegram messages.
///
/// Every API failure is reported as [`ChannelError::Unreachable`]: the Bot
/// API does not separate "user blocked the bot" from other per-chat faults
/// reliably enough to act on differently.
#[derive(Clone)]
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    /// Wrap a bot handle.
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Two-button Approve / Reject keyboard.
pub fn decision_keyboard(approve: &DecisionToken, reject: &DecisionToken) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(APPROVE_LABEL, approve.as_str()),
        InlineKeyboardButton::callback(REJECT_LABEL, reject.as_str()),
    ]])
}

fn unreachable(recipient: RecipientId, err: &teloxide::RequestError) -> ChannelError {
    ChannelError::Unreachable {
        recipient,
        reason: err.to_string(),
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    async fn send_text(&self, recipient: RecipientId, text: &str) -> ChannelResult<()> {
        self.bot
            .send_message(ChatId(recipient.0), text)
            .await
            .map_err(|e| unreachable(recipient, &e))?;
        Ok(())
    }

    async fn send_document(
        &self,
        recipient: RecipientId,
        document: ConfigDocument,
        caption: &str,
    ) -> ChannelResult<()> {
        debug!(recipient = %recipient, file = %document.name, "sending document");
        let file = InputFile::memory(document.contents).file_name(document.name);
        self.bot
            .send_document(ChatId(recipient.0), file)
            .caption(caption)
            .await
            .map_err(|e| unreachable(recipient, &e))?;
        Ok(())
    }

    async fn send_decision_prompt(
        &self,
        recipient: RecipientId,
        text: &str,
        approve: &DecisionToken,
        reject: &DecisionToken,
    ) -> ChannelResult<()> {
        self.bot
            .send_message(ChatId(recipient.0), text)
            .reply_markup(decision_keyboard(approve, reject))
            .await
            .map_err(|e| unreachable(recipient, &e))?;
        Ok(())
    }
}
