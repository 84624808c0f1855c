use std::future::Future;
use std::time::Duration;

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    /// 12 attempts, 5 seconds apart: about a minute before giving up.
    fn default() -> Self {
        Self {
            max_attempts: 12,
            delay: Duration::from_secs(5),
        }
    }
}

/// Result of running an operation under a [`RetryPolicy`].
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Success { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_error: E },
}

impl RetryPolicy {
    /// Runs `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. The calling task sleeps for
    /// [`RetryPolicy::delay`] between attempts; there is no cancellation check, so a
    /// deadline has to be imposed by the caller (e.g. `tokio::time::timeout`).
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    return RetryOutcome::Success {
                        value,
                        attempts: attempt,
                    };
                }
                Err(last_error) if attempt >= max_attempts => {
                    return RetryOutcome::Exhausted {
                        attempts: attempt,
                        last_error,
                    };
                }
                Err(_) => {
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
