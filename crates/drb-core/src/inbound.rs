//! Transport-agnostic inbound adapter.
//!
//! The Telegram handler converts each update into a [`TextMessage`] and calls
//! [`InboundAdapter::on_message`]; everything after that point is testable
//! without a bot.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::sync::oneshot;

use crate::{
    commands::{self, Route},
    completion::{CompletionResult, RelayCore},
    config::Config,
    domain::{ChatId, Request},
    formatting::{preview, split_message},
    messaging::{
        port::MessagingPort,
        types::{ChatAction, TextMessage},
    },
    Result,
};

/// The only text a user ever sees when relaying fails, whatever the cause.
pub const GENERIC_ERROR_TEXT: &str = "❌ Sorry, I encountered an error while processing your request. \
Please try again in a moment.";

/// Telegram clears "typing" after ~5s, so refresh a bit sooner.
const TYPING_REFRESH: Duration = Duration::from_secs(4);

const LOG_PREVIEW_CHARS: usize = 50;

#[derive(Clone)]
pub struct InboundAdapter {
    cfg: Arc<Config>,
    relay: RelayCore,
    messenger: Arc<dyn MessagingPort>,
}

impl InboundAdapter {
    pub fn new(cfg: Arc<Config>, relay: RelayCore, messenger: Arc<dyn MessagingPort>) -> Self {
        Self {
            cfg,
            relay,
            messenger,
        }
    }

    /// Handle one inbound text message end to end.
    ///
    /// Errors are only returned when the reply itself could not be delivered.
    pub async fn on_message(&self, msg: &TextMessage) -> Result<()> {
        match commands::route(&msg.text) {
            Route::Static(reply) => {
                tracing::info!(
                    user_id = msg.user_id.0,
                    chat_id = msg.chat_id.0,
                    command = %commands::parse_command(&msg.text).0,
                    "static command"
                );
                self.messenger.send_text(msg.chat_id, reply).await?;
                Ok(())
            }
            Route::Ignore => {
                tracing::debug!(user_id = msg.user_id.0, "ignoring unknown command");
                Ok(())
            }
            Route::Relay(_) => self.relay_text(msg).await,
        }
    }

    async fn relay_text(&self, msg: &TextMessage) -> Result<()> {
        tracing::info!(
            user_id = msg.user_id.0,
            username = msg.username.as_deref().unwrap_or("unknown"),
            text = %preview(&msg.text, LOG_PREVIEW_CHARS),
            "processing message"
        );

        let request = Request::new(msg.user_id, msg.chat_id, msg.text.clone());
        let received_at = request.received_at;

        let typing = self.start_typing(msg.chat_id).await;
        let result = self.relay.handle(request, &self.cfg).await;
        if let Some((stop_tx, task)) = typing {
            let _ = stop_tx.send(());
            let _ = task.await;
        }

        let latency_ms = (Utc::now() - received_at).num_milliseconds();
        match result {
            CompletionResult::Success { text } => {
                let limit = self
                    .cfg
                    .telegram_message_limit
                    .min(self.messenger.capabilities().max_message_len);
                let chunks = split_message(&text, limit);
                tracing::info!(
                    user_id = msg.user_id.0,
                    latency_ms,
                    chars = text.chars().count(),
                    chunks = chunks.len(),
                    "relay succeeded"
                );
                if chunks.is_empty() {
                    self.messenger
                        .send_text(msg.chat_id, GENERIC_ERROR_TEXT)
                        .await?;
                    return Ok(());
                }
                for (i, chunk) in chunks.iter().enumerate() {
                    if let Err(e) = self.messenger.send_text(msg.chat_id, chunk).await {
                        tracing::error!(
                            user_id = msg.user_id.0,
                            chunk = i,
                            "reply chunk not delivered: {e}"
                        );
                        // The user may already hold part of the answer; tell them it broke off.
                        let _ = self
                            .messenger
                            .send_text(msg.chat_id, GENERIC_ERROR_TEXT)
                            .await;
                        return Err(e);
                    }
                }
            }
            CompletionResult::Failure { kind, detail } => {
                tracing::error!(
                    user_id = msg.user_id.0,
                    latency_ms,
                    kind = %kind,
                    detail = %detail,
                    "relay failed"
                );
                self.messenger
                    .send_text(msg.chat_id, GENERIC_ERROR_TEXT)
                    .await?;
            }
        }

        Ok(())
    }

    /// Show "typing" now and keep refreshing it until the stop signal fires.
    async fn start_typing(
        &self,
        chat_id: ChatId,
    ) -> Option<(oneshot::Sender<()>, tokio::task::JoinHandle<()>)> {
        if !self.messenger.capabilities().supports_chat_actions {
            return None;
        }

        // Best-effort; a missing indicator never blocks the reply.
        let _ = self
            .messenger
            .send_chat_action(chat_id, ChatAction::Typing)
            .await;

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let messenger = self.messenger.clone();
        let task = tokio::spawn(async move {
            let first = tokio::time::Instant::now() + TYPING_REFRESH;
            let mut tick = tokio::time::interval_at(first, TYPING_REFRESH);
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let _ = messenger.send_chat_action(chat_id, ChatAction::Typing).await;
                    }
                    _ = &mut stop_rx => break,
                }
            }
        });

        Some((stop_tx, task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        commands::{HELP_TEXT, WELCOME_TEXT},
        completion::UpstreamReply,
        domain::UserId,
        testing::{config_with, ok_body, RecordingMessenger, Scripted, ScriptedTransport},
    };

    struct Harness {
        adapter: InboundAdapter,
        transport: Arc<ScriptedTransport>,
        messenger: Arc<RecordingMessenger>,
    }

    fn harness(pairs: &[(&str, &str)], script: Vec<Scripted>) -> Harness {
        harness_with(pairs, script, RecordingMessenger::default())
    }

    fn harness_with(
        pairs: &[(&str, &str)],
        script: Vec<Scripted>,
        messenger: RecordingMessenger,
    ) -> Harness {
        let transport = Arc::new(ScriptedTransport::new(script));
        let messenger = Arc::new(messenger);
        let adapter = InboundAdapter::new(
            Arc::new(config_with(pairs)),
            RelayCore::new(transport.clone()),
            messenger.clone(),
        );
        Harness {
            adapter,
            transport,
            messenger,
        }
    }

    fn text(s: &str) -> TextMessage {
        TextMessage {
            chat_id: ChatId(42),
            user_id: UserId(1001),
            username: Some("alice".to_string()),
            text: s.to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_command_bypasses_relay() {
        let h = harness(&[], vec![]);

        h.adapter.on_message(&text("/start")).await.unwrap();

        assert_eq!(h.transport.calls(), 0);
        assert_eq!(h.messenger.sent(), vec![(ChatId(42), WELCOME_TEXT.to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn help_command_bypasses_relay() {
        let h = harness(&[], vec![]);

        h.adapter.on_message(&text("/help@my_bot")).await.unwrap();

        assert_eq!(h.transport.calls(), 0);
        assert_eq!(h.messenger.texts(), vec![HELP_TEXT.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_command_sends_nothing() {
        let h = harness(&[], vec![]);

        h.adapter.on_message(&text("/reset")).await.unwrap();

        assert_eq!(h.transport.calls(), 0);
        assert!(h.messenger.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn relays_text_and_replies_once() {
        let h = harness(
            &[],
            vec![Scripted::Reply(UpstreamReply::new(200, ok_body("Paris.")))],
        );

        h.adapter
            .on_message(&text("capital of France?"))
            .await
            .unwrap();

        assert_eq!(h.transport.calls(), 1);
        assert_eq!(h.messenger.sent(), vec![(ChatId(42), "Paris.".to_string())]);
        assert_eq!(h.messenger.actions(), vec![(ChatId(42), ChatAction::Typing)]);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_show_one_generic_message_without_details() {
        let mut seen = Vec::new();
        for reply in [
            UpstreamReply::new(401, r#"{"error":{"message":"Invalid API key sk-live-XYZ"}}"#),
            UpstreamReply::new(400, r#"{"error":"context length exceeded"}"#),
            UpstreamReply::new(200, "not json at all"),
        ] {
            let h = harness(&[], vec![Scripted::Reply(reply)]);
            h.adapter.on_message(&text("hello")).await.unwrap();
            seen.push(h.messenger.texts());
        }

        for texts in &seen {
            assert_eq!(texts, &vec![GENERIC_ERROR_TEXT.to_string()]);
            assert!(!texts[0].contains("sk-live"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_input_gets_generic_error_without_network() {
        let h = harness(&[("MAX_INPUT_CHARS", "5")], vec![]);

        h.adapter.on_message(&text("way too long")).await.unwrap();

        assert_eq!(h.transport.calls(), 0);
        assert_eq!(h.messenger.texts(), vec![GENERIC_ERROR_TEXT.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn long_replies_are_split_in_order() {
        let answer = "first line\nsecond line\nthird";
        let h = harness(
            &[("TELEGRAM_MESSAGE_LIMIT", "12")],
            vec![Scripted::Reply(UpstreamReply::new(200, ok_body(answer)))],
        );

        h.adapter.on_message(&text("go")).await.unwrap();

        let texts = h.messenger.texts();
        assert_eq!(texts, vec!["first line\n", "second line\n", "third"]);
        assert_eq!(texts.concat(), answer);
    }

    #[tokio::test(start_paused = true)]
    async fn trailing_blank_lines_do_not_produce_an_empty_send() {
        let answer = format!("x{}", "\n".repeat(4200));
        let h = harness(
            &[],
            vec![Scripted::Reply(UpstreamReply::new(200, ok_body(&answer)))],
        );

        h.adapter.on_message(&text("go")).await.unwrap();

        let texts = h.messenger.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with('x'));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_chunk_send_is_followed_by_the_generic_error() {
        let h = harness_with(
            &[("TELEGRAM_MESSAGE_LIMIT", "12")],
            vec![Scripted::Reply(UpstreamReply::new(
                200,
                ok_body("first line\nsecond line\nthird"),
            ))],
            RecordingMessenger::failing_send(1),
        );

        let res = h.adapter.on_message(&text("go")).await;

        assert!(res.is_err());
        assert_eq!(
            h.messenger.texts(),
            vec!["first line\n".to_string(), GENERIC_ERROR_TEXT.to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn typing_is_refreshed_during_slow_calls() {
        let h = harness(&[("RELAY_TIMEOUT_SECS", "10")], vec![Scripted::Hang]);

        h.adapter.on_message(&text("slow one")).await.unwrap();

        // Initial action plus refreshes at 4s and 8s before the 10s deadline.
        assert_eq!(h.messenger.actions().len(), 3);
        assert_eq!(h.messenger.texts(), vec![GENERIC_ERROR_TEXT.to_string()]);
    }
}
