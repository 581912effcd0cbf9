use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{ChatAction, MessagingCapabilities},
    Result,
};

/// Outbound side of the chat transport.
///
/// Telegram is the only implementation; the inbound adapter talks to this
/// trait so it can be driven without a live bot.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    /// Send plain text (no parse mode).
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()>;
}
