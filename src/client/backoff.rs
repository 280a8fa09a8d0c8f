//! Reconnection backoff policy.
//!
//! Capped exponential backoff with jitter. Deliberately explicit
//! rather than inherited from transport-library defaults: every retry
//! delay is computable and testable, and the jitter spreads clients
//! out so a gateway restart does not produce a thundering herd of
//! simultaneous reconnects.

use std::time::Duration;

use rand::Rng;

/// Parameters of the capped exponential backoff.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub initial: Duration,
    /// Hard ceiling on any retry delay, jitter included.
    pub max: Duration,
    /// Growth factor applied after every failed attempt.
    pub multiplier: f64,
    /// Jitter fraction: each delay is drawn uniformly from
    /// `base ± base * jitter`, then clamped to `max`.
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.25,
        }
    }
}

/// Retry-delay generator for one connection session.
///
/// [`Backoff::next_delay`] advances the attempt counter;
/// [`Backoff::reset`] is called after every successful connect so the
/// next failure starts again from the initial delay.
#[derive(Debug)]
pub struct Backoff {
    policy: BackoffPolicy,
    attempt: u32,
}

impl Backoff {
    /// Creates a fresh backoff sequence for the given policy.
    #[must_use]
    pub const fn new(policy: BackoffPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Returns the delay to sleep before the next attempt and advances
    /// the sequence.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.base_delay();
        self.attempt = self.attempt.saturating_add(1);

        let jitter = self.policy.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return base.min(self.policy.max);
        }
        let factor = rand::thread_rng().gen_range(1.0 - jitter..=1.0 + jitter);
        base.mul_f64(factor).min(self.policy.max)
    }

    /// Restarts the sequence from the initial delay.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Returns the un-jittered delay for the current attempt:
    /// `min(initial * multiplier^attempt, max)`.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        let factor = self.policy.multiplier.max(1.0).powi(self.attempt.min(32) as i32);
        self.policy.initial.mul_f64(factor).min(self.policy.max)
    }
}
