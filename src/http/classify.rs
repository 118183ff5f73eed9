//! Failure classification and backoff helpers consumed by [`RetryPolicy`].
//!
//! Both are traits so the policy receives them as explicit dependencies.
//!
//! [`RetryPolicy`]: super::RetryPolicy

use reqwest::Method;
use std::time::Duration;

use super::error::TransportKind;
use super::policy::FailedCall;

/// Methods that can be repeated without duplicating side effects.
const IDEMPOTENT_METHODS: [Method; 5] = [
    Method::GET,
    Method::HEAD,
    Method::OPTIONS,
    Method::PUT,
    Method::DELETE,
];

#[cfg_attr(test, mockall::automock)]
pub trait RetryClassifier: Send + Sync {
    /// True for transport failures and for transient failures of idempotent requests.
    fn is_network_or_idempotent_request_error(&self, call: &FailedCall) -> bool;
}

#[cfg_attr(test, mockall::automock)]
pub trait Backoff: Send + Sync {
    /// Delay before retry number `retry_count` (1-based).
    fn delay(&self, retry_count: u32) -> Duration;
}

/// Network and idempotent-request classification for HTTP calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardClassifier;

impl StandardClassifier {
    /// No response, and not because the per-call timeout fired.
    pub fn is_network_error(call: &FailedCall) -> bool {
        !call.has_response() && call.transport_kind() != Some(TransportKind::Timeout)
    }

    /// Not a timeout, and either no response or a 5xx response.
    pub fn is_retryable_error(call: &FailedCall) -> bool {
        if call.transport_kind() == Some(TransportKind::Timeout) {
            return false;
        }
        match call.status() {
            None => true,
            Some(status) => status.is_server_error(),
        }
    }

    pub fn is_idempotent_request_error(call: &FailedCall) -> bool {
        IDEMPOTENT_METHODS.contains(&call.method) && Self::is_retryable_error(call)
    }
}

impl RetryClassifier for StandardClassifier {
    fn is_network_or_idempotent_request_error(&self, call: &FailedCall) -> bool {
        Self::is_network_error(call) || Self::is_idempotent_request_error(call)
    }
}

/// `2^retry_count * factor`, plus up to `jitter` of that again at random.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub factor: Duration,
    pub jitter: f64,
}

impl ExponentialBackoff {
    pub const DEFAULT_FACTOR: Duration = Duration::from_millis(100);
    pub const DEFAULT_JITTER: f64 = 0.2;

    pub fn new(factor: Duration, jitter: f64) -> Self {
        Self { factor, jitter }
    }

    /// The delay without jitter.
    pub fn base_delay(&self, retry_count: u32) -> Duration {
        self.factor.saturating_mul(2u32.saturating_pow(retry_count))
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FACTOR, Self::DEFAULT_JITTER)
    }
}

impl Backoff for ExponentialBackoff {
    fn delay(&self, retry_count: u32) -> Duration {
        let base = self.base_delay(retry_count);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return base;
        }
        let extra = Duration::try_from_secs_f64(base.as_secs_f64() * jitter * fastrand::f64())
            .unwrap_or(Duration::MAX);
        base.saturating_add(extra)
    }
}
