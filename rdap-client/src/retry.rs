//! Retry/backoff policy for transient fetch failures.
//!
//! Four strategies, matching the shapes a caller typically wants: a fixed
//! delay, a delay that grows linearly, one that grows exponentially, and
//! the same exponential curve with full jitter applied (recommended
//! default — avoids synchronized retry storms across many clients).

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub enum BackoffStrategy {
    Fixed { delay: Duration },
    Linear { base: Duration, increment: Duration },
    Exponential { base: Duration, factor: f64 },
    ExponentialJitter { base: Duration, factor: f64 },
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::ExponentialJitter {
            base: Duration::from_millis(500),
            factor: 2.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub strategy: BackoffStrategy,
    pub max_delay: Duration,
    /// Whether a 403 or RFC 7725 451 response fails over to the next
    /// candidate base URL instead of being surfaced immediately. Off by
    /// default: a legal-unavailability response is registry-policy, not a
    /// transient fault, so the default is to report it rather than mask it
    /// by trying another server.
    pub failover_on_legal_block: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            strategy: BackoffStrategy::default(),
            max_delay: Duration::from_secs(10),
            failover_on_legal_block: false,
        }
    }
}

impl RetryPolicy {
    /// The delay to wait before attempt number `attempt` (1-indexed: the
    /// delay before the *second* try is `delay_for(1)`).
    ///
    /// For the exponential strategies, attempt `n`'s delay is
    /// `base * factor^(n-1)` so the first retry waits exactly `base`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let computed = match self.strategy {
            BackoffStrategy::Fixed { delay } => delay,
            BackoffStrategy::Linear { base, increment } => base + increment * attempt,
            BackoffStrategy::Exponential { base, factor } => {
                scale(base, factor.powi(exponent as i32))
            }
            BackoffStrategy::ExponentialJitter { base, factor } => {
                let ceiling = scale(base, factor.powi(exponent as i32));
                let millis = ceiling.as_millis().max(1) as u64;
                let jittered = rand::thread_rng().gen_range(0..=millis);
                Duration::from_millis(jittered)
            }
        };
        computed.min(self.max_delay)
    }

    /// True if `attempt` (1-indexed count of tries already made) still
    /// leaves room for another.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

fn scale(base: Duration, factor: f64) -> Duration {
    let millis = (base.as_millis() as f64) * factor;
    Duration::from_millis(millis.max(0.0) as u64)
}

/// Overrides the computed backoff with a server-supplied `Retry-After`
/// value, accepting either form RFC 7231 §7.1.3 allows: a delta in
/// seconds, or an HTTP-date.
pub fn retry_after_override(header_value: &str) -> Option<Duration> {
    if let Ok(seconds) = header_value.trim().parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let parsed = chrono::DateTime::parse_from_rfc2822(header_value.trim()).ok()?;
    let now = chrono::Utc::now();
    let delta = parsed.with_timezone(&chrono::Utc) - now;
    delta.to_std().ok()
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn GIVEN_fixed_strategy_WHEN_delay_for_THEN_constant() {
        let policy = RetryPolicy {
            max_attempts: 5,
            strategy: BackoffStrategy::Fixed {
                delay: Duration::from_millis(100),
            },
            max_delay: Duration::from_secs(10),
            failover_on_legal_block: false,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(4), Duration::from_millis(100));
    }

    #[rstest]
    fn GIVEN_linear_strategy_WHEN_delay_for_THEN_grows_linearly() {
        let policy = RetryPolicy {
            max_attempts: 5,
            strategy: BackoffStrategy::Linear {
                base: Duration::from_millis(100),
                increment: Duration::from_millis(50),
            },
            max_delay: Duration::from_secs(10),
            failover_on_legal_block: false,
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
    }

    #[rstest]
    fn GIVEN_exponential_strategy_WHEN_delay_for_THEN_grows_exponentially() {
        let policy = RetryPolicy {
            max_attempts: 5,
            strategy: BackoffStrategy::Exponential {
                base: Duration::from_millis(100),
                factor: 2.0,
            },
            max_delay: Duration::from_secs(10),
            failover_on_legal_block: false,
        };
        // first retry waits exactly `base`, then doubles each attempt after.
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[rstest]
    fn GIVEN_exponential_strategy_WHEN_delay_exceeds_max_THEN_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            strategy: BackoffStrategy::Exponential {
                base: Duration::from_secs(1),
                factor: 2.0,
            },
            max_delay: Duration::from_secs(5),
            failover_on_legal_block: false,
        };
        assert_eq!(policy.delay_for(10), Duration::from_secs(5));
    }

    #[rstest]
    fn GIVEN_jitter_strategy_WHEN_delay_for_THEN_within_ceiling() {
        let policy = RetryPolicy {
            max_attempts: 5,
            strategy: BackoffStrategy::ExponentialJitter {
                base: Duration::from_millis(100),
                factor: 2.0,
            },
            max_delay: Duration::from_secs(10),
            failover_on_legal_block: false,
        };
        let delay = policy.delay_for(3);
        assert!(delay <= Duration::from_millis(400));
    }

    #[rstest]
    #[case(1, 2, true)]
    #[case(3, 3, false)]
    #[case(4, 3, false)]
    fn GIVEN_attempt_count_WHEN_should_retry_THEN_expected(
        #[case] attempt: u32,
        #[case] max_attempts: u32,
        #[case] expected: bool,
    ) {
        let policy = RetryPolicy {
            max_attempts,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.should_retry(attempt), expected);
    }

    #[rstest]
    fn GIVEN_delta_seconds_WHEN_retry_after_override_THEN_duration() {
        assert_eq!(retry_after_override("120"), Some(Duration::from_secs(120)));
    }

    #[rstest]
    fn GIVEN_http_date_in_future_WHEN_retry_after_override_THEN_some_duration() {
        let future = (chrono::Utc::now() + chrono::Duration::seconds(60)).to_rfc2822();
        let result = retry_after_override(&future);
        assert!(result.is_some());
    }

    #[rstest]
    fn GIVEN_garbage_WHEN_retry_after_override_THEN_none() {
        assert_eq!(retry_after_override("not-a-value"), None);
    }
}
