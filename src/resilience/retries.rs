//! Retry logic.
//!
//! # Responsibilities
//! - Classify an attempt's result as success or failure
//! - Decide whether another attempt is allowed
//! - Supply the delay between attempts
//!
//! # Design Decisions
//! - Connection errors, timeouts and 5xx responses are failures and retryable
//! - 4xx is a success from the backend's point of view and never retried
//! - Fixed backoff; the breaker already protects a backend under stress
//! - Retries capped at `MAX_RETRIES` regardless of configuration

use std::time::Duration;

use axum::http::StatusCode;

use crate::config::MAX_RETRIES;
use crate::resilience::circuit_breaker::CallOutcome;

/// What happened on one downstream attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    Response(StatusCode),
    ConnectError,
    Timeout,
}

impl AttemptResult {
    pub fn outcome(&self) -> CallOutcome {
        match self {
            AttemptResult::Response(status) if !status.is_server_error() => CallOutcome::Success,
            _ => CallOutcome::Failure,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome() == CallOutcome::Failure
    }
}

/// Per-route retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries: max_retries.min(MAX_RETRIES),
            backoff,
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Whether attempt number `attempt` (1-based) may be followed by another.
    pub fn should_retry(&self, attempt: u32, result: &AttemptResult) -> bool {
        result.is_failure() && attempt < self.max_attempts()
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classification() {
        assert!(AttemptResult::ConnectError.is_failure());
        assert!(AttemptResult::Timeout.is_failure());
        assert!(AttemptResult::Response(StatusCode::BAD_GATEWAY).is_failure());
        assert!(AttemptResult::Response(StatusCode::INTERNAL_SERVER_ERROR).is_failure());
        assert!(!AttemptResult::Response(StatusCode::OK).is_failure());
        assert!(!AttemptResult::Response(StatusCode::NOT_FOUND).is_failure());
        assert!(!AttemptResult::Response(StatusCode::UNAUTHORIZED).is_failure());
    }

    #[test]
    fn test_retry_budget() {
        let policy = RetryPolicy::new(3, Duration::from_millis(50));
        let failed = AttemptResult::ConnectError;

        assert_eq!(policy.max_attempts(), 4);
        assert!(policy.should_retry(1, &failed));
        assert!(policy.should_retry(3, &failed));
        assert!(!policy.should_retry(4, &failed));
        assert!(!policy.should_retry(1, &AttemptResult::Response(StatusCode::OK)));
    }

    #[test]
    fn test_retries_capped() {
        let policy = RetryPolicy::new(10, Duration::from_millis(50));
        assert_eq!(policy.max_attempts(), MAX_RETRIES + 1);
    }

    #[test]
    fn test_no_retry_policy() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_attempts(), 1);
        assert!(!policy.should_retry(1, &AttemptResult::Timeout));
    }
}
