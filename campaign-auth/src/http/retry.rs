//! Backoff for transient outbound failures, bounded by a total time budget.
//!
//! Vendor exchanges and output deliveries run inside background tasks that are themselves
//! cut off after a fixed time, so a retry that would start after the budget is spent is
//! never scheduled.

use std::time::{Duration, SystemTime};

use reqwest_retry::{RetryDecision, RetryPolicy};

const BASE_DELAY: Duration = Duration::from_millis(250);
const MAX_DELAY: Duration = Duration::from_secs(4);

pub struct BackoffPolicy {
    max_retries: u32,
    budget: Option<Duration>,
}

impl BackoffPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            budget: None,
        }
    }

    /// No retry starts later than `budget` after the first attempt.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    /// 250ms, 500ms, 1s, ... capped at `MAX_DELAY`.
    fn delay(n_past_retries: u32) -> Duration {
        BASE_DELAY
            .checked_mul(1 << n_past_retries.min(16))
            .map_or(MAX_DELAY, |d| d.min(MAX_DELAY))
    }
}

impl RetryPolicy for BackoffPolicy {
    fn should_retry(&self, request_start_time: SystemTime, n_past_retries: u32) -> RetryDecision {
        if n_past_retries >= self.max_retries {
            return RetryDecision::DoNotRetry;
        }

        let execute_after = SystemTime::now() + Self::delay(n_past_retries);
        if let Some(budget) = self.budget {
            if execute_after > request_start_time + budget {
                return RetryDecision::DoNotRetry;
            }
        }
        RetryDecision::Retry { execute_after }
    }
}
