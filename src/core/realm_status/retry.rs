use std::future::Future;
use std::time::Duration;

use super::realm_status_api::RealmStatusError;

/// Capped exponential backoff for calls made inside a single tick.
///
/// The whole retry budget has to fit inside one poll interval, so both the
/// attempt count and the per-attempt delay are bounded.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Longest one call can take when every attempt runs into `per_attempt`
    /// (the HTTP timeout) and every backoff is slept in full.
    pub fn worst_case(&self, per_attempt: Duration) -> Duration {
        let max_attempts = self.max_attempts.max(1);
        let backoff: Duration = (1..max_attempts).map(|attempt| self.delay_for(attempt)).sum();
        per_attempt.saturating_mul(max_attempts).saturating_add(backoff)
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// attempts run out. The last error is returned.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RealmStatusError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RealmStatusError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "{} failed, retrying",
                        label
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
