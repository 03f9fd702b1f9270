//! Bounded exponential backoff for transient fetch failures.
//!
//! [`RetryState`] is a plain state machine (attempt count, next delay) so the
//! schedule can be tested without timers; the loader wrapper in
//! [`crate::loader`] is the only place that actually sleeps.

use aula_core::FetchError;
use std::time::Duration;

/// Retry schedule for a loader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `1` disables retries.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Fresh state for one fetch.
    pub fn start(&self) -> RetryState {
        RetryState {
            policy: *self,
            attempt: 1,
            next_delay: self.initial_backoff.min(self.max_backoff),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Progress through a [`RetryPolicy`] for a single fetch.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
    next_delay: Duration,
}

impl RetryState {
    /// The attempt currently running (1-based).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn next_delay(&self) -> Duration {
        self.next_delay
    }

    /// Record a failure of the current attempt and decide the next step.
    /// Non-transient errors give up immediately.
    pub fn on_failure(&mut self, error: &FetchError) -> RetryDecision {
        if !error.is_transient() || self.attempt >= self.policy.max_attempts {
            return RetryDecision::GiveUp;
        }
        let delay = self.next_delay;
        self.attempt += 1;
        let grown = delay.as_secs_f64() * self.policy.multiplier.max(1.0);
        self.next_delay = Duration::try_from_secs_f64(grown)
            .unwrap_or(self.policy.max_backoff)
            .min(self.policy.max_backoff);
        RetryDecision::RetryAfter(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> FetchError {
        FetchError::status(503, "unavailable")
    }

    #[test]
    fn test_default_schedule_doubles_and_stops() {
        let mut state = RetryPolicy::default().start();
        assert_eq!(state.attempt(), 1);
        assert_eq!(
            state.on_failure(&transient()),
            RetryDecision::RetryAfter(Duration::from_secs(1))
        );
        assert_eq!(state.attempt(), 2);
        assert_eq!(
            state.on_failure(&transient()),
            RetryDecision::RetryAfter(Duration::from_secs(2))
        );
        assert_eq!(state.attempt(), 3);
        assert_eq!(state.on_failure(&transient()), RetryDecision::GiveUp);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::default()
            .with_max_attempts(10)
            .with_initial_backoff(Duration::from_secs(4))
            .with_max_backoff(Duration::from_secs(10));
        let mut state = policy.start();
        let mut delays = Vec::new();
        while let RetryDecision::RetryAfter(delay) = state.on_failure(&transient()) {
            delays.push(delay);
        }
        assert_eq!(delays.len(), 9);
        assert_eq!(delays[0], Duration::from_secs(4));
        assert_eq!(delays[1], Duration::from_secs(8));
        assert!(delays[2..].iter().all(|d| *d == Duration::from_secs(10)));
    }

    #[test]
    fn test_permanent_errors_give_up_immediately() {
        let mut state = RetryPolicy::default().start();
        let err = FetchError::status(404, "no such aula");
        assert_eq!(state.on_failure(&err), RetryDecision::GiveUp);
        assert_eq!(state.attempt(), 1);
    }

    #[test]
    fn test_none_policy_never_retries() {
        let mut state = RetryPolicy::none().start();
        assert_eq!(state.on_failure(&transient()), RetryDecision::GiveUp);
    }
}
