//! HTTP client module with retry policy and error handling.

mod classify;
mod client;
mod error;
mod policy;

pub use classify::{Backoff, ExponentialBackoff, RetryClassifier, StandardClassifier};
pub use client::HttpClient;
pub use error::{HttpError, TransportKind};
pub use policy::{
    FailedCall, GiveUpReason, MAX_RETRIES, RETRY_AFTER_CEILING, RetryDecision, RetryDelay,
    RetryPolicy, parse_retry_after,
};
