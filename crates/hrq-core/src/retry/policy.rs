use std::time::Duration;

/// Upper bound on a single attempt's timeout, however large the backoff grows.
pub const MAX_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Smallest timeout handed to the transport; zero would mean "no timeout" to libcurl.
const MIN_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(1);

/// High-level classification of a failed attempt for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Attempt timed out before a response arrived.
    Timeout,
    /// Network-level failure (connection refused/reset, DNS, etc.).
    Connection,
    /// The server answered with an error status. Never retried.
    Server(u32),
    /// Any other error (never retried).
    Other,
}

impl ErrorKind {
    /// Transient failures are the only ones worth another attempt.
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::Timeout | ErrorKind::Connection)
    }
}

/// Decision returned by the retry policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryDecision {
    /// Surface the failure to the caller.
    NoRetry,
    /// Resubmit as `attempt` with the given timeout.
    Retry { attempt: u32, timeout: Duration },
}

/// Timeout escalation policy.
///
/// Attempt 0 is the first try and attempts `1..=max_retries` are retries.
/// Attempt `n` runs with `initial_timeout * backoff_multiplier^n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub initial_timeout: Duration,
    pub max_retries: u32,
    pub backoff_multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_timeout: Duration::from_secs(10),
            max_retries: 0,
            backoff_multiplier: 1.5,
        }
    }
}

/// Backoff multipliers must be positive and finite; anything else would
/// make later timeouts zero, negative or unbounded.
pub fn is_valid_backoff(multiplier: f32) -> bool {
    multiplier.is_finite() && multiplier > 0.0
}

impl RetryPolicy {
    pub fn new(initial_timeout: Duration, max_retries: u32, backoff_multiplier: f32) -> Self {
        Self {
            initial_timeout,
            max_retries,
            backoff_multiplier,
        }
    }

    /// Timeout for attempt `attempt` (0-based), clamped to a sane range.
    pub fn timeout(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let factor = f64::from(self.backoff_multiplier).powi(exp);
        let secs = self.initial_timeout.as_secs_f64() * factor;
        if !secs.is_finite() || secs < 0.0 {
            return MAX_ATTEMPT_TIMEOUT;
        }
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_ATTEMPT_TIMEOUT)
            .clamp(MIN_ATTEMPT_TIMEOUT, MAX_ATTEMPT_TIMEOUT)
    }

    /// Decide what to do after attempt `attempt` (0-based) failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if !kind.is_transient() || attempt >= self.max_retries {
            return RetryDecision::NoRetry;
        }
        let next = attempt + 1;
        RetryDecision::Retry {
            attempt: next,
            timeout: self.timeout(next),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_escalates_geometrically() {
        let p = RetryPolicy::new(Duration::from_millis(1000), 3, 2.0);
        assert_eq!(p.timeout(0), Duration::from_millis(1000));
        assert_eq!(p.timeout(1), Duration::from_millis(2000));
        assert_eq!(p.timeout(2), Duration::from_millis(4000));
        assert_eq!(p.timeout(3), Duration::from_millis(8000));
    }

    #[test]
    fn fractional_backoff() {
        let p = RetryPolicy::new(Duration::from_millis(1000), 2, 1.5);
        assert_eq!(p.timeout(1), Duration::from_millis(1500));
        assert_eq!(p.timeout(2), Duration::from_millis(2250));
    }

    #[test]
    fn timeout_is_capped() {
        let p = RetryPolicy::new(Duration::from_secs(60), 100, 10.0);
        assert_eq!(p.timeout(50), MAX_ATTEMPT_TIMEOUT);
        let zero = RetryPolicy::new(Duration::ZERO, 1, 2.0);
        assert!(zero.timeout(0) > Duration::ZERO);
    }

    #[test]
    fn no_retry_for_server_or_other() {
        let p = RetryPolicy::new(Duration::from_secs(1), 5, 1.0);
        assert_eq!(p.decide(0, ErrorKind::Server(500)), RetryDecision::NoRetry);
        assert_eq!(p.decide(0, ErrorKind::Other), RetryDecision::NoRetry);
    }

    #[test]
    fn respects_max_retries() {
        let p = RetryPolicy::new(Duration::from_secs(1), 2, 2.0);
        assert_eq!(
            p.decide(0, ErrorKind::Timeout),
            RetryDecision::Retry {
                attempt: 1,
                timeout: Duration::from_secs(2)
            }
        );
        assert_eq!(
            p.decide(1, ErrorKind::Connection),
            RetryDecision::Retry {
                attempt: 2,
                timeout: Duration::from_secs(4)
            }
        );
        assert_eq!(p.decide(2, ErrorKind::Timeout), RetryDecision::NoRetry);
    }

    #[test]
    fn backoff_must_be_positive_and_finite() {
        assert!(is_valid_backoff(1.5));
        assert!(is_valid_backoff(0.5));
        assert!(!is_valid_backoff(0.0));
        assert!(!is_valid_backoff(-2.0));
        assert!(!is_valid_backoff(f32::NAN));
        assert!(!is_valid_backoff(f32::INFINITY));
    }

    #[test]
    fn zero_retries_never_retries() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(0, ErrorKind::Connection), RetryDecision::NoRetry);
    }
}
