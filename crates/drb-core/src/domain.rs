use chrono::{DateTime, Utc};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// One inbound user message on its way to the completion API.
///
/// Created per message and dropped once the reply has been sent.
#[derive(Clone, Debug)]
pub struct Request {
    pub sender_id: UserId,
    pub chat_id: ChatId,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl Request {
    pub fn new(sender_id: UserId, chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            sender_id,
            chat_id,
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}
