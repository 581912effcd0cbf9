use std::time::Duration;

use async_trait::async_trait;

use crate::{completion::wire::ChatCompletionRequest, Result};

/// Raw HTTP outcome of one upstream call, before classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    /// Parsed `Retry-After` header, when the upstream sent one in seconds.
    pub retry_after: Option<Duration>,
    pub body: String,
}

impl UpstreamReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }
}

/// Port for sending one completion request over the wire.
///
/// Implementations return `Err` only for transport-level failures (connect,
/// DNS, timeout, reading the body). Any HTTP status, including 4xx/5xx, is an
/// `Ok(UpstreamReply)`; the relay core owns the status mapping. Dropping the
/// returned future must abort the in-flight request.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send(&self, request: &ChatCompletionRequest) -> Result<UpstreamReply>;
}
