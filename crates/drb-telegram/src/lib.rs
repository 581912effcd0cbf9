//! Telegram adapter (teloxide).
//!
//! Implements the `drb-core` MessagingPort over the Telegram Bot API and feeds
//! inbound updates to the core inbound adapter.

use std::time::Duration;

use async_trait::async_trait;

use teloxide::prelude::*;

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use drb_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ChatAction, MessagingCapabilities},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    /// Run a Bot API call, retrying once when Telegram asks us to back off.
    async fn with_retry<T, Fut>(&self, op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        retry_on_flood_control(op).await
    }
}

const MAX_FLOOD_RETRIES: usize = 1;

/// How long to wait before retrying after `err`, or `None` to give up.
fn flood_wait(err: &teloxide::RequestError, retries_so_far: usize) -> Option<Duration> {
    match err {
        teloxide::RequestError::RetryAfter(d) if retries_so_far < MAX_FLOOD_RETRIES => Some(*d),
        _ => None,
    }
}

async fn retry_on_flood_control<T, Fut>(mut op: impl FnMut() -> Fut) -> Result<T>
where
    Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
{
    let mut retries = 0usize;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => match flood_wait(&e, retries) {
                Some(d) => {
                    retries += 1;
                    tracing::warn!(wait_secs = d.as_secs(), "telegram flood control, retrying");
                    sleep(d).await;
                }
                None => return Err(TelegramMessenger::map_err(e)),
            },
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_chat_actions: true,
            max_message_len: 4096,
        }
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        let tg_action = match action {
            ChatAction::Typing => teloxide::types::ChatAction::Typing,
        };
        self.with_retry(|| self.bot.send_chat_action(Self::tg_chat(chat_id), tg_action))
            .await?;
        Ok(())
    }
}
