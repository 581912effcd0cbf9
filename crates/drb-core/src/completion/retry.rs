use std::time::Duration;

use crate::completion::types::ErrorKind;

/// Bounded retry budget with exponential backoff.
///
/// Retries are counted per failure kind; the backoff step is counted across
/// the whole call, so each successive sleep is longer than the previous one
/// until `max_delay` caps it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_rate_limit_retries: u32,
    pub max_server_error_retries: u32,
    pub max_unavailable_retries: u32,
    pub base_delay: Duration,
    pub factor: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rate_limit_retries: 2,
            max_server_error_retries: 1,
            max_unavailable_retries: 1,
            base_delay: Duration::from_secs(1),
            factor: 2,
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn max_retries(&self, kind: ErrorKind) -> u32 {
        match kind {
            ErrorKind::RateLimited => self.max_rate_limit_retries,
            ErrorKind::UpstreamError => self.max_server_error_retries,
            ErrorKind::UpstreamUnavailable => self.max_unavailable_retries,
            ErrorKind::Unauthorized | ErrorKind::BadRequest | ErrorKind::MalformedResponse => 0,
        }
    }

    /// Sleep before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1);
        let multiplier = self.factor.max(1).saturating_pow(exp);
        self.base_delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}
