//! The rate-limit retry rule: a 429 is retried after `Retry-After`, at most
//! `max_retries` times per reach. Any other status, or a 429 once the budget
//! is spent, is handed back to the caller as is.

use reqwest::header::HeaderValue;
use reqwest::StatusCode;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    Proceed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_retries: u32,
    pub default_wait: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            default_wait: Duration::from_secs(10),
        }
    }
}

impl RateLimitPolicy {
    /// `retries_so_far` is 0 for the first response of a reach.
    pub fn decide(
        &self,
        status: StatusCode,
        retries_so_far: u32,
        retry_after: Option<&HeaderValue>,
    ) -> RetryDecision {
        if status != StatusCode::TOO_MANY_REQUESTS || retries_so_far >= self.max_retries {
            return RetryDecision::Proceed;
        }
        RetryDecision::RetryAfter(parse_retry_after(retry_after).unwrap_or(self.default_wait))
    }
}

/// Whole seconds only. HTTP-date forms and fractions are treated as absent.
pub fn parse_retry_after(value: Option<&HeaderValue>) -> Option<Duration> {
    value?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
