//! Retry policy for outbound calls: whether to retry a failure, and how long to wait.
//!
//! The policy is a pure function of the failed call and the number of retries
//! already made. The counter lives in the caller's retry loop.

use log::debug;
use reqwest::{Method, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::classify::{Backoff, ExponentialBackoff, RetryClassifier, StandardClassifier};
use super::error::{HttpError, TransportKind};

/// Retries allowed per logical request, on top of the first attempt.
pub const MAX_RETRIES: u32 = 3;

/// A `retry-after` at or above this cancels the retry instead of waiting.
pub const RETRY_AFTER_CEILING: Duration = Duration::from_secs(30);

/// A failed outbound call, as seen by the policy.
#[derive(Debug)]
pub struct FailedCall {
    pub method: Method,
    pub error: HttpError,
}

impl FailedCall {
    pub fn new(method: Method, error: HttpError) -> Self {
        Self { method, error }
    }

    pub fn has_response(&self) -> bool {
        matches!(self.error, HttpError::Status { .. })
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.error.status()
    }

    pub fn transport_kind(&self) -> Option<TransportKind> {
        match &self.error {
            HttpError::Transport { kind, .. } => Some(*kind),
            HttpError::Status { .. } => None,
        }
    }

    /// Seconds from a numeric `retry-after` header on the response.
    pub fn retry_after_secs(&self) -> Option<f64> {
        match &self.error {
            HttpError::Status { retry_after, .. } => *retry_after,
            HttpError::Transport { .. } => None,
        }
    }

    pub fn into_error(self) -> HttpError {
        self.error
    }
}

/// Parses a `retry-after` header value given in seconds.
///
/// HTTP-date values and anything negative or non-finite yield `None`.
pub fn parse_retry_after(value: &str) -> Option<f64> {
    let seconds: f64 = value.trim().parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}

/// Outcome of the delay callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDelay {
    After(Duration),
    /// The server asked for a wait at or above [`RETRY_AFTER_CEILING`].
    Abort,
}

impl RetryDelay {
    /// Milliseconds to wait, with `-1` standing for abort.
    pub fn as_millis(&self) -> i64 {
        match self {
            RetryDelay::After(delay) => i64::try_from(delay.as_millis()).unwrap_or(i64::MAX),
            RetryDelay::Abort => -1,
        }
    }
}

/// Why the loop stopped retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiveUpReason {
    /// The failure is not one the policy retries.
    NotEligible,
    /// All retries were used.
    Exhausted,
    /// The server asked for a wait at or above [`RETRY_AFTER_CEILING`].
    RetryAfterTooLong,
}

impl fmt::Display for GiveUpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GiveUpReason::NotEligible => write!(f, "not retryable"),
            GiveUpReason::Exhausted => write!(f, "retries exhausted"),
            GiveUpReason::RetryAfterTooLong => write!(f, "retry-after exceeds ceiling"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    GiveUp(GiveUpReason),
}

/// Decides whether and when to retry failed calls.
#[derive(Clone)]
pub struct RetryPolicy {
    retries: u32,
    classifier: Arc<dyn RetryClassifier>,
    backoff: Arc<dyn Backoff>,
}

impl RetryPolicy {
    pub fn new(
        retries: u32,
        classifier: Arc<dyn RetryClassifier>,
        backoff: Arc<dyn Backoff>,
    ) -> Self {
        Self {
            retries,
            classifier,
            backoff,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Arc::new(StandardClassifier), Arc::new(ExponentialBackoff::default()))
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// The retry condition: no response, a network or idempotent-request
    /// failure, or HTTP 429.
    pub fn should_retry(&self, call: &FailedCall) -> bool {
        !call.has_response()
            || self.classifier.is_network_or_idempotent_request_error(call)
            || call.status() == Some(StatusCode::TOO_MANY_REQUESTS)
    }

    /// The delay callback, for the `retry_count`-th retry (1-based).
    pub fn retry_delay(&self, retry_count: u32, call: &FailedCall) -> RetryDelay {
        if let Some(seconds) = call.retry_after_secs() {
            return if seconds < RETRY_AFTER_CEILING.as_secs_f64() {
                RetryDelay::After(Duration::from_secs_f64(seconds))
            } else {
                RetryDelay::Abort
            };
        }
        RetryDelay::After(self.backoff.delay(retry_count))
    }

    /// Combines the ceiling, the retry condition and the delay callback.
    ///
    /// `retries_made` counts retries already issued for this logical request.
    pub fn decide(&self, retries_made: u32, call: &FailedCall) -> RetryDecision {
        if retries_made >= self.retries {
            return RetryDecision::GiveUp(GiveUpReason::Exhausted);
        }
        if !self.should_retry(call) {
            return RetryDecision::GiveUp(GiveUpReason::NotEligible);
        }
        match self.retry_delay(retries_made + 1, call) {
            RetryDelay::After(delay) => RetryDecision::Retry { delay },
            RetryDelay::Abort => {
                debug!(
                    "retry-after of {:?}s is not below {}s, giving up",
                    call.retry_after_secs(),
                    RETRY_AFTER_CEILING.as_secs()
                );
                RetryDecision::GiveUp(GiveUpReason::RetryAfterTooLong)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            MAX_RETRIES,
            Arc::new(StandardClassifier),
            Arc::new(ExponentialBackoff::default()),
        )
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("retries", &self.retries)
            .finish_non_exhaustive()
    }
}
