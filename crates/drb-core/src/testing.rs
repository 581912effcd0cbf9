//! Test doubles shared by the unit tests in this crate.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicI32, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::{
    completion::{client::CompletionTransport, client::UpstreamReply, wire::ChatCompletionRequest},
    config::Config,
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ChatAction, MessagingCapabilities},
    },
    Result,
};

pub fn config_with(pairs: &[(&str, &str)]) -> Config {
    let mut all = vec![
        ("TELEGRAM_BOT_TOKEN".to_string(), "123:test".to_string()),
        ("DEEPSEEK_API_KEY".to_string(), "sk-test".to_string()),
    ];
    all.extend(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    Config::from_lookup(|key| {
        all.iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

pub fn ok_body(text: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

/// One scripted upstream outcome.
#[derive(Clone, Debug)]
pub enum Scripted {
    Reply(UpstreamReply),
    Fail(String),
    /// Never answers; only a deadline gets the caller out.
    Hang,
}

/// Transport that plays back a fixed script and records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    calls: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    async fn send(&self, request: &ChatCompletionRequest) -> Result<UpstreamReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());
        self.requests.lock().unwrap().push(request.clone());

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail(msg)) => Err(Error::External(msg)),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Ok(UpstreamReply::new(500, "script exhausted")),
        }
    }
}

/// Messenger that records what would have been sent.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<(ChatId, String)>>,
    actions: Mutex<Vec<(ChatId, ChatAction)>>,
    next_id: AtomicI32,
    attempts: AtomicUsize,
    fail_at: Option<usize>,
}

impl RecordingMessenger {
    /// The `n`-th `send_text` call (0-based) fails the way Telegram does for
    /// an undeliverable message; every other call succeeds.
    pub fn failing_send(n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, t)| t).collect()
    }

    pub fn actions(&self) -> Vec<(ChatId, ChatAction)> {
        self.actions.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingPort for RecordingMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_chat_actions: true,
            max_message_len: 4096,
        }
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(attempt) {
            return Err(Error::External(
                "telegram error: Bad Request: message text is empty".to_string(),
            ));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(id),
        })
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        self.actions.lock().unwrap().push((chat_id, action));
        Ok(())
    }
}
