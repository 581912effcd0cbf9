use std::sync::Arc;

use anyhow::Context;
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use drb_core::{
    completion::RelayCore, config::Config, inbound::InboundAdapter,
    messaging::port::MessagingPort,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub adapter: InboundAdapter,
}

/// Long-poll Telegram until Ctrl-C.
///
/// Without a distribution key every update lands on the default worker, which
/// runs handlers concurrently; there is no per-chat ordering.
pub async fn run_polling(cfg: Arc<Config>, relay: RelayCore) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.expose());

    let me = bot
        .get_me()
        .await
        .context("telegram getMe failed (check TELEGRAM_BOT_TOKEN)")?;
    tracing::info!(
        username = %me.username(),
        model = %cfg.model_name,
        base_url = %cfg.base_url,
        "bot started, polling for messages"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState {
        adapter: InboundAdapter::new(cfg, relay, messenger),
    });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .distribution_function(|_| None::<std::convert::Infallible>)
        .default_handler(|upd| async move {
            tracing::debug!(update_id = ?upd.id, "unhandled update");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("bot stopped gracefully");
    Ok(())
}
