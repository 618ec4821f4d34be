use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// How often and how patiently to retry a provider call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total runs, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after every failure.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Outcome of one attempt that did not succeed.
#[derive(Debug)]
pub enum Attempt<E> {
    /// Worth trying again (timeouts, connection resets, 5xx).
    Transient(E),
    /// Trying again will not help.
    Fatal(E),
}

/// Runs `operation` until it succeeds, fails fatally, or the policy is exhausted.
///
/// Returns the last error seen.
pub async fn with_retry<F, Fut, T, E>(mut operation: F, policy: RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Attempt<E>>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(Attempt::Fatal(err)) => return Err(err),
            Err(Attempt::Transient(err)) => {
                if attempt >= max_attempts {
                    return Err(err);
                }
                let delay = policy.delay_after(attempt);
                debug!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}...",
                    attempt, max_attempts, err, delay
                );
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}
