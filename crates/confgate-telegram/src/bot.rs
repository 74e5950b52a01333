//! Teloxide bot setup, dispatcher, reaper task and handler registration.

use std::sync::Arc;

use confgate_core::{ApprovalBroker, FsConfigPool};
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::callback;
use crate::channel::TelegramChannel;
use crate::config::BotConfig;
use crate::error::TelegramResult;
use crate::handler::{self, BotState};

/// Open the pool, build the broker and the teloxide handler tree.
fn build_state_and_handler(
    config: BotConfig,
) -> TelegramResult<(
    BotState,
    Bot,
    teloxide::dispatching::UpdateHandler<anyhow::Error>,
)> {
    let bot = Bot::new(&config.bot_token);
    let pool = FsConfigPool::open_with_extension(&config.pool_root, &config.extension)?;
    let channel = Arc::new(TelegramChannel::new(bot.clone()));

    let mut broker = ApprovalBroker::new(pool, channel, config.approver);
    if let Some(ttl) = config.pending_ttl {
        broker = broker.with_pending_ttl(ttl);
    }

    let state = BotState {
        broker: Arc::new(broker),
        config: Arc::new(config),
    };

    let message_handler = Update::filter_message().endpoint({
        let state = state.clone();
        move |bot: Bot, msg: Message| {
            let state = state.clone();
            async move { Box::pin(handler::handle_message(bot, msg, state)).await }
        }
    });

    let callback_handler = Update::filter_callback_query().endpoint({
        let state = state.clone();
        move |bot: Bot, query: CallbackQuery| {
            let state = state.clone();
            async move { Box::pin(callback::handle_callback(bot, query, state)).await }
        }
    });

    let handler = dptree::entry()
        .branch(message_handler)
        .branch(callback_handler);

    Ok((state, bot, handler))
}

/// Spawn the periodic expiry sweep when a pending TTL is configured.
pub fn spawn_reaper(state: &BotState) -> Option<JoinHandle<()>> {
    let ttl = state.broker.pending_ttl()?;
    let broker = Arc::clone(&state.broker);
    let period = state.config.reap_interval;
    info!(ttl_secs = ttl.as_secs(), period_secs = period.as_secs(), "starting pending-request reaper");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let reaped = broker.reap_expired().await;
            if reaped > 0 {
                info!(count = reaped, "released expired requests");
            }
        }
    }))
}

/// Run the bot until Ctrl+C.
pub async fn run(config: BotConfig) -> anyhow::Result<()> {
    info!(root = %config.pool_root.display(), "opening config pool");
    let (state, bot, handler) = build_state_and_handler(config)?;

    match state.broker.stock().await {
        Ok(stock) if stock.available == 0 => {
            warn!(root = %state.config.pool_root.display(), "no config files available at startup");
        },
        Ok(stock) => info!(available = stock.available, consumed = stock.consumed, "config pool ready"),
        Err(e) => warn!(error = %e, "could not read config pool"),
    }

    let reaper = spawn_reaper(&state);

    info!(approver = %state.config.approver, "Starting Telegram bot...");
    Box::pin(
        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch(),
    )
    .await;

    if let Some(reaper) = reaper {
        reaper.abort();
    }
    info!("Bot stopped");
    Ok(())
}
