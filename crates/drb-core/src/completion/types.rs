use std::fmt;

/// Why a relay attempt failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 401/403: bad or missing credentials. Never retried.
    Unauthorized,
    /// 429: upstream throttling. Retried with backoff.
    RateLimited,
    /// 5xx or an unexpected status.
    UpstreamError,
    /// Connection refused, DNS failure, timeout.
    UpstreamUnavailable,
    /// Other 4xx, or input rejected before sending.
    BadRequest,
    /// 2xx whose body carries no usable text.
    MalformedResponse,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::MalformedResponse => "malformed_response",
        }
    }

    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimited | ErrorKind::UpstreamError | ErrorKind::UpstreamUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of relaying one request. Exactly one is produced per request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionResult {
    Success { text: String },
    Failure { kind: ErrorKind, detail: String },
}

impl CompletionResult {
    pub fn success(text: impl Into<String>) -> Self {
        CompletionResult::Success { text: text.into() }
    }

    pub fn failure(kind: ErrorKind, detail: impl Into<String>) -> Self {
        CompletionResult::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CompletionResult::Success { .. })
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CompletionResult::Success { .. } => None,
            CompletionResult::Failure { kind, .. } => Some(*kind),
        }
    }
}
