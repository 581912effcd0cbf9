//! OpenAI-compatible HTTP adapter (DeepSeek chat completions).
//!
//! Implements the core `CompletionTransport` port: one `POST
//! {base_url}/chat/completions` per call, bearer auth, raw status and body
//! handed back for the relay core to classify.

use std::time::Duration;

use async_trait::async_trait;

use drb_core::{
    completion::{
        client::{CompletionTransport, UpstreamReply},
        wire::ChatCompletionRequest,
    },
    config::Config,
    errors::Error,
    Result,
};

#[derive(Clone, Debug)]
pub struct OpenAiClient {
    endpoint: String,
    api_key: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build error: {e}")))?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.completions_url(),
            cfg.api_key.expose(),
            cfg.request_timeout,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionTransport for OpenAiClient {
    async fn send(&self, request: &ChatCompletionRequest) -> Result<UpstreamReply> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::External(format!("completion request error: {e}")))?;

        let status = resp.status().as_u16();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        let body = resp
            .text()
            .await
            .map_err(|e| Error::External(format!("completion body read error: {e}")))?;

        tracing::debug!(status, bytes = body.len(), "completion response received");

        Ok(UpstreamReply {
            status,
            retry_after,
            body,
        })
    }
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored.
fn parse_retry_after(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}
