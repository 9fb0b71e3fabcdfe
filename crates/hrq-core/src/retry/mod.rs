//! Retry and timeout escalation policy.
//!
//! This module encapsulates failure classification (server responses,
//! timeouts, connectivity loss) and the per-attempt timeout schedule so the
//! engine makes one consistent retry decision per failed attempt.

mod classify;
mod error;
mod policy;

pub use classify::{classify, classify_curl_error, to_request_error};
pub use error::TransportFailure;
pub use policy::{is_valid_backoff, ErrorKind, RetryDecision, RetryPolicy, MAX_ATTEMPT_TIMEOUT};
