use crate::domain::{ChatId, UserId};

/// Inbound text message, stripped of transport-specific fields.
#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub text: String,
}

/// Outgoing "chat action" (typing indicator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_chat_actions: bool,
    pub max_message_len: usize,
}
