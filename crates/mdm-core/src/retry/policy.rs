use std::time::Duration;

use crate::config::MdmConfig;

/// Attempts per URL, including the first.
pub const MAX_ATTEMPTS: u32 = 10;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Budget exhausted.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Fixed-budget, fixed-delay policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Default budget with the configured backoff.
    pub fn from_config(cfg: &MdmConfig) -> Self {
        Self {
            backoff: cfg.backoff(),
            ..Self::default()
        }
    }

    /// What to do after attempt `attempt` (1-based) failed.
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            RetryDecision::NoRetry
        } else {
            RetryDecision::RetryAfter(self.backoff)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_attempts_with_fixed_backoff() {
        let p = RetryPolicy::default();
        for attempt in 1..10 {
            assert_eq!(
                p.decide(attempt),
                RetryDecision::RetryAfter(Duration::from_secs(2))
            );
        }
        assert_eq!(p.decide(10), RetryDecision::NoRetry);
        assert_eq!(p.decide(11), RetryDecision::NoRetry);
    }

    #[test]
    fn respects_max_attempts() {
        let p = RetryPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
        };
        assert!(matches!(p.decide(2), RetryDecision::RetryAfter(_)));
        assert_eq!(p.decide(3), RetryDecision::NoRetry);
    }
}
