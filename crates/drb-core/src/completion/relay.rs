use std::sync::Arc;

use tokio::time::{sleep, timeout_at, Instant};

use crate::{
    completion::{
        client::{CompletionTransport, UpstreamReply},
        types::{CompletionResult, ErrorKind},
        wire::{extract_text, ChatCompletionRequest},
    },
    config::Config,
    domain::Request,
    formatting::preview,
};

/// Upstream error bodies are cut to this many chars before they reach a log line.
const DETAIL_BODY_CHARS: usize = 200;

/// Failed attempt, before the retry decision.
#[derive(Debug)]
struct AttemptFailure {
    kind: ErrorKind,
    detail: String,
    retryable: bool,
    retry_after: Option<std::time::Duration>,
}

impl AttemptFailure {
    fn new(kind: ErrorKind, detail: String) -> Self {
        Self {
            kind,
            detail,
            retryable: kind.is_retryable(),
            retry_after: None,
        }
    }

    fn into_result(self) -> CompletionResult {
        CompletionResult::failure(self.kind, self.detail)
    }
}

/// Turns one user message into one completion result.
///
/// Stateless between calls; the transport is the only side effect. All
/// upstream failures are folded into `CompletionResult::Failure`.
#[derive(Clone)]
pub struct RelayCore {
    transport: Arc<dyn CompletionTransport>,
}

impl RelayCore {
    pub fn new(transport: Arc<dyn CompletionTransport>) -> Self {
        Self { transport }
    }

    /// Relay `request` upstream under the timeout and retry policy in `cfg`.
    ///
    /// `cfg.request_timeout` bounds the whole call, retries and backoff
    /// included. When it expires the in-flight transport future is dropped.
    pub async fn handle(&self, request: Request, cfg: &Config) -> CompletionResult {
        if let Err(rejected) = validate_input(&request.text, cfg.max_input_chars) {
            return rejected.into_result();
        }

        let body = ChatCompletionRequest::single_turn(cfg, &request.text);
        let policy = cfg.retry;
        let deadline = Instant::now() + cfg.request_timeout;

        let mut attempt: u32 = 0;
        let mut rate_limit_retries = 0u32;
        let mut server_error_retries = 0u32;
        let mut unavailable_retries = 0u32;

        loop {
            attempt += 1;
            tracing::debug!(
                user_id = request.sender_id.0,
                attempt,
                model = %body.model,
                "sending completion request"
            );

            let failure = match timeout_at(deadline, self.transport.send(&body)).await {
                Err(_) => {
                    return CompletionResult::failure(
                        ErrorKind::UpstreamUnavailable,
                        format!(
                            "no response within {}s (attempt {attempt})",
                            cfg.request_timeout.as_secs_f64()
                        ),
                    );
                }
                Ok(Err(e)) => AttemptFailure::new(
                    ErrorKind::UpstreamUnavailable,
                    format!("transport error: {e}"),
                ),
                Ok(Ok(reply)) => match classify(reply) {
                    Ok(text) => return CompletionResult::success(text),
                    Err(failure) => failure,
                },
            };

            let used = match failure.kind {
                ErrorKind::RateLimited => &mut rate_limit_retries,
                ErrorKind::UpstreamError => &mut server_error_retries,
                ErrorKind::UpstreamUnavailable => &mut unavailable_retries,
                _ => return failure.into_result(),
            };
            if !failure.retryable || *used >= policy.max_retries(failure.kind) {
                return failure.into_result();
            }

            let mut delay = policy.delay_for(attempt);
            if let Some(hint) = failure.retry_after {
                delay = delay.max(hint).min(policy.max_delay);
            }
            if Instant::now() + delay >= deadline {
                tracing::warn!(
                    user_id = request.sender_id.0,
                    kind = %failure.kind,
                    "not retrying: backoff would pass the request deadline"
                );
                return failure.into_result();
            }

            tracing::warn!(
                user_id = request.sender_id.0,
                kind = %failure.kind,
                attempt,
                delay_ms = delay.as_millis() as u64,
                detail = %failure.detail,
                "upstream call failed, retrying"
            );
            *used += 1;
            sleep(delay).await;
        }
    }
}

fn validate_input(text: &str, max_chars: usize) -> Result<(), AttemptFailure> {
    if text.trim().is_empty() {
        return Err(AttemptFailure::new(
            ErrorKind::BadRequest,
            "empty message".to_string(),
        ));
    }
    let len = text.chars().count();
    if len > max_chars {
        return Err(AttemptFailure::new(
            ErrorKind::BadRequest,
            format!("message is {len} chars, limit is {max_chars}"),
        ));
    }
    Ok(())
}

/// Map an HTTP reply to generated text or a classified failure.
fn classify(reply: UpstreamReply) -> Result<String, AttemptFailure> {
    let status = reply.status;
    let body = || preview(reply.body.trim(), DETAIL_BODY_CHARS);

    match status {
        200..=299 => extract_text(&reply.body).map_err(|why| {
            AttemptFailure::new(
                ErrorKind::MalformedResponse,
                format!("HTTP {status}: {why}"),
            )
        }),
        401 | 403 => Err(AttemptFailure::new(
            ErrorKind::Unauthorized,
            format!("HTTP {status}: {}", body()),
        )),
        429 => Err(AttemptFailure {
            retry_after: reply.retry_after,
            ..AttemptFailure::new(ErrorKind::RateLimited, format!("HTTP 429: {}", body()))
        }),
        400..=499 => Err(AttemptFailure::new(
            ErrorKind::BadRequest,
            format!("HTTP {status}: {}", body()),
        )),
        500..=599 => Err(AttemptFailure::new(
            ErrorKind::UpstreamError,
            format!("HTTP {status}: {}", body()),
        )),
        _ => Err(AttemptFailure {
            retryable: false,
            ..AttemptFailure::new(
                ErrorKind::UpstreamError,
                format!("unexpected HTTP {status}: {}", body()),
            )
        }),
    }
}
