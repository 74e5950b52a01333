//! Message handler: parses commands and drives the broker's request side.

use std::sync::Arc;

use confgate_core::{ApprovalBroker, BrokerError, RecipientId, RequestOutcome, Requester, messages};
use teloxide::Bot;
use teloxide::requests::Requester as _;
use teloxide::types::{ChatId, Message, User, UserId};
use tracing::{info, warn};

use crate::config::BotConfig;

/// Shared bot state passed to all handlers.
#[derive(Clone)]
pub struct BotState {
    pub broker: Arc<ApprovalBroker>,
    pub config: Arc<BotConfig>,
}

/// Bot commands understood in private chats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/start`
    Start,
    /// `/get_config`
    GetConfig,
    /// `/status` (approver only)
    Status,
    /// `/help`, or anything unrecognised.
    Help,
}

impl Command {
    /// Parse the first word of a message. `/cmd@botname` is accepted.
    pub fn parse(text: &str) -> Self {
        let word = text.split_whitespace().next().unwrap_or("");
        let name = word.split('@').next().unwrap_or(word);
        match name.to_ascii_lowercase().as_str() {
            "/start" => Self::Start,
            "/get_config" => Self::GetConfig,
            "/status" => Self::Status,
            _ => Self::Help,
        }
    }
}

/// Usage text for `/help` and unrecognised input.
pub const USAGE: &str = "Send /get_config to request a VPN config file.\n\
     The administrator will review your request and the file will arrive here.\n\n\
     Commands:\n\
     /get_config - Request a config file\n\
     /help - Show this help";

/// Reply to `/get_config` outside a private chat.
pub const PRIVATE_ONLY: &str = "Please send /get_config in a private chat with me.";

fn welcome(first_name: &str) -> String {
    format!(
        "👋 Hi, {first_name}!\n\n\
         I hand out WireGuard configs after the administrator approves them.\n\
         Send /get_config to request one."
    )
}

/// Build the requester profile for a Telegram user.
///
/// Requests are keyed by the sender's user id, which is also their private
/// chat id. `None` if the id does not fit a chat id.
pub fn requester_for(user_id: UserId, full_name: String, username: Option<&str>) -> Option<Requester> {
    let id = i64::try_from(user_id.0).ok().map(RecipientId)?;
    Some(Requester::new(id, full_name, username))
}

/// Reply shown to the requester for a `/get_config` result.
pub fn request_reply(result: &Result<RequestOutcome, BrokerError>) -> &'static str {
    match result {
        Ok(RequestOutcome::Prompted { .. }) => messages::SUBMITTED_REPLY,
        Ok(RequestOutcome::NoStockAvailable) => messages::OUT_OF_STOCK_REPLY,
        Ok(RequestOutcome::AlreadyPending) => messages::ALREADY_PENDING_REPLY,
        Err(BrokerError::PromptUndeliverable { .. }) => messages::PROMPT_FAILED_REPLY,
        Err(BrokerError::Store(_)) => messages::ERROR_NOTICE,
    }
}

fn sender_id(user: &User) -> Option<RecipientId> {
    i64::try_from(user.id.0).ok().map(RecipientId)
}

/// Handle an incoming message.
pub async fn handle_message(bot: Bot, msg: Message, state: BotState) -> anyhow::Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    match Command::parse(text) {
        Command::Start => {
            let first_name = msg.from.as_ref().map_or("there", |u| u.first_name.as_str());
            reply(&bot, chat_id, welcome(first_name)).await;
        },
        Command::GetConfig => handle_get_config(&bot, &msg, &state).await,
        Command::Status => handle_status(&bot, &msg, &state).await,
        Command::Help => reply(&bot, chat_id, USAGE).await,
    }

    Ok(())
}

async fn handle_get_config(bot: &Bot, msg: &Message, state: &BotState) {
    let chat_id = msg.chat.id;
    if !msg.chat.is_private() {
        reply(bot, chat_id, PRIVATE_ONLY).await;
        return;
    }
    let Some(requester) = msg
        .from
        .as_ref()
        .and_then(|u| requester_for(u.id, u.full_name(), u.username.as_deref()))
    else {
        reply(bot, chat_id, USAGE).await;
        return;
    };
    info!(requester = %requester.id, "config requested");

    let result = state.broker.request(requester).await;
    if let Err(e) = &result {
        warn!(chat = %chat_id, error = %e, "config request failed");
    }
    reply(bot, chat_id, request_reply(&result)).await;
}

async fn handle_status(bot: &Bot, msg: &Message, state: &BotState) {
    let chat_id = msg.chat.id;
    let is_approver = msg
        .from
        .as_ref()
        .and_then(sender_id)
        .is_some_and(|id| state.broker.is_approver(id));
    if !is_approver {
        reply(bot, chat_id, USAGE).await;
        return;
    }

    let text = match state.broker.status_report().await {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, "status report failed");
            format!("Store error: {e}")
        },
    };
    reply(bot, chat_id, text).await;
}

async fn reply(bot: &Bot, chat_id: ChatId, text: impl Into<String>) {
    if let Err(e) = bot.send_message(chat_id, text).await {
        warn!(chat = %chat_id, "Failed to send reply: {e}");
    }
}

#[cfg(test)]
mod tests {
    use confgate_core::{ConfigFile, PoolError};

    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("/get_config"), Command::GetConfig);
        assert_eq!(Command::parse("/status now"), Command::Status);
        assert_eq!(Command::parse("/help"), Command::Help);
    }

    #[test]
    fn accepts_bot_suffix_and_case() {
        assert_eq!(Command::parse("/get_config@confgate_bot"), Command::GetConfig);
        assert_eq!(Command::parse("/START"), Command::Start);
    }

    #[test]
    fn anything_else_is_help() {
        assert_eq!(Command::parse("hello"), Command::Help);
        assert_eq!(Command::parse(""), Command::Help);
        assert_eq!(Command::parse("/reset"), Command::Help);
    }

    #[test]
    fn requester_is_keyed_by_user_id() {
        let r = requester_for(UserId(55), "Ada Lovelace".to_owned(), Some("ada")).unwrap();
        assert_eq!(r.id, RecipientId(55));
        assert_eq!(r.full_name, "Ada Lovelace");
        assert_eq!(r.username.as_deref(), Some("ada"));

        let plain = requester_for(UserId(56), "Grace".to_owned(), None).unwrap();
        assert_eq!(plain.id, RecipientId(56));
        assert!(plain.username.is_none());
    }

    #[test]
    fn distinct_users_are_distinct_requesters() {
        let a = requester_for(UserId(101), "A".to_owned(), None).unwrap();
        let b = requester_for(UserId(102), "B".to_owned(), None).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn oversized_user_id_is_refused() {
        assert!(requester_for(UserId(u64::MAX), "X".to_owned(), None).is_none());
    }

    #[test]
    fn replies_cover_every_outcome() {
        let prompted = Ok(RequestOutcome::Prompted {
            file: ConfigFile::new("a.conf"),
        });
        assert_eq!(request_reply(&prompted), messages::SUBMITTED_REPLY);
        assert_eq!(
            request_reply(&Ok(RequestOutcome::NoStockAvailable)),
            messages::OUT_OF_STOCK_REPLY
        );
        assert_eq!(
            request_reply(&Ok(RequestOutcome::AlreadyPending)),
            messages::ALREADY_PENDING_REPLY
        );
        assert_eq!(
            request_reply(&Err(BrokerError::PromptUndeliverable {
                reason: "blocked".into()
            })),
            messages::PROMPT_FAILED_REPLY
        );
        assert_eq!(
            request_reply(&Err(BrokerError::Store(PoolError::NotReserved(
                "a.conf".into()
            )))),
            messages::ERROR_NOTICE
        );
    }

    #[test]
    fn welcome_uses_first_name() {
        assert!(welcome("Ada").contains("Hi, Ada!"));
    }
}
