//! Decision buttons: turns an Approve / Reject press into a broker decision.

use confgate_core::{DecisionOutcome, DecisionToken, RecipientId};
use teloxide::Bot;
use teloxide::payloads::AnswerCallbackQuerySetters;
use teloxide::requests::Requester as _;
use teloxide::types::{CallbackQuery, ChatId};
use tracing::{debug, info, warn};

use crate::handler::BotState;

/// Short toast shown to the approver after a button press.
pub fn callback_ack(outcome: &DecisionOutcome) -> &'static str {
    match outcome {
        DecisionOutcome::Approved { .. } => "Approved",
        DecisionOutcome::Rejected { .. } => "Rejected",
        DecisionOutcome::NotFound { .. } => "Already handled",
        DecisionOutcome::DeliveryFailed { .. } => "Delivery failed",
        DecisionOutcome::StoreInconsistency { .. } => "Store error",
    }
}

/// Handle a callback query from a decision button.
pub async fn handle_callback(bot: Bot, query: CallbackQuery, state: BotState) -> anyhow::Result<()> {
    let pressed_by = i64::try_from(query.from.id.0).ok().map(RecipientId);
    if !pressed_by.is_some_and(|id| state.broker.is_approver(id)) {
        warn!(user = query.from.id.0, "decision button pressed by non-approver");
        answer(&bot, &query, "Not authorized").await;
        return Ok(());
    }

    let decision = match query.data.as_deref().map(DecisionToken::parse) {
        Some(Ok(decision)) => decision,
        Some(Err(e)) => {
            debug!(error = %e, "ignoring unrecognised callback data");
            answer(&bot, &query, "Unknown action").await;
            return Ok(());
        },
        None => {
            answer(&bot, &query, "Unknown action").await;
            return Ok(());
        },
    };

    info!(
        requester = %decision.requester_id,
        outcome = %decision.outcome,
        "decision received"
    );
    let outcome = state.broker.decide(decision).await;
    answer(&bot, &query, callback_ack(&outcome)).await;

    // Editing the text without a reply markup also drops the buttons.
    if let Some(message) = &query.message {
        let chat = ChatId(state.broker.approver().0);
        if let Err(e) = bot
            .edit_message_text(chat, message.id(), outcome.summary())
            .await
        {
            warn!("Failed to update decision prompt: {e}");
        }
    }

    Ok(())
}

async fn answer(bot: &Bot, query: &CallbackQuery, text: &str) {
    if let Err(e) = bot.answer_callback_query(&query.id).text(text).await {
        debug!("Failed to answer callback query: {e}");
    }
}
