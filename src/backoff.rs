use std::time::Duration;

use rand::Rng;

/// Exponential reconnect backoff with randomized jitter.
///
/// # Examples
///
/// ```
/// use ledger_remote::backoff::ExponentialBackoff;
/// use std::time::Duration;
///
/// let mut backoff = ExponentialBackoff::new(
///     Duration::from_millis(100),
///     Duration::from_millis(5000),
///     2.0,
/// );
/// let delay = backoff.next_delay();
/// assert!(delay >= Duration::from_millis(75)); // 100ms * 0.75 jitter
/// assert!(delay <= Duration::from_millis(125)); // 100ms * 1.25 jitter
/// ```
#[derive(Debug)]
pub struct ExponentialBackoff {
    initial: Duration,
    max: Duration,
    factor: f64,
    current: Duration,
}

impl ExponentialBackoff {
    #[must_use]
    pub const fn new(initial: Duration, max: Duration, factor: f64) -> Self {
        Self {
            initial,
            max,
            factor,
            current: initial,
        }
    }

    /// Compute the next delay (with jitter) and advance the internal state.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn next_delay(&mut self) -> Duration {
        let current_ms = self.current.as_millis().min(u128::from(u64::MAX)) as u64;

        let jitter_factor = rand::thread_rng().gen_range(0.75..=1.25);
        let jittered_ms = (current_ms as f64 * jitter_factor) as u64;
        let delay = Duration::from_millis(jittered_ms);

        let next_ms = (current_ms as f64 * self.factor) as u64;
        let next = Duration::from_millis(next_ms.min(self.max.as_millis() as u64));
        self.current = next.min(self.max);

        delay
    }

    /// Reset the backoff to its initial delay.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
