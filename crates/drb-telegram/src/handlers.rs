//! Telegram update handlers.
//!
//! Only text messages are relayed; every other update type is dropped.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use drb_core::{
    domain::{ChatId, UserId},
    messaging::types::TextMessage,
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(incoming) = to_text_message(&msg) else {
        tracing::debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };

    if let Err(e) = state.adapter.on_message(&incoming).await {
        tracing::error!(
            user_id = incoming.user_id.0,
            chat_id = incoming.chat_id.0,
            "failed to deliver reply: {e}"
        );
    }

    Ok(())
}

/// Extract sender identity and text; `None` for anything that is not a
/// user-sent text message.
pub fn to_text_message(msg: &Message) -> Option<TextMessage> {
    let user = msg.from()?;
    let text = msg.text()?;

    Some(TextMessage {
        chat_id: ChatId(msg.chat.id.0),
        user_id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        text: text.to_string(),
    })
}
