//! Fixed-count, fixed-delay retry shared by the completion client and the
//! message transport.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use parley_constant::defaults;
use tracing::warn;

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Policy for chat and image completion calls.
    pub fn completion() -> Self {
        Self::new(
            defaults::COMPLETION_ATTEMPTS,
            Duration::from_millis(defaults::RETRY_DELAY_MS),
        )
    }

    /// Policy for individual transport sends.
    pub fn delivery() -> Self {
        Self::new(
            defaults::DELIVERY_ATTEMPTS,
            Duration::from_millis(defaults::RETRY_DELAY_MS),
        )
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    /// The last error is returned unchanged.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(label, attempt, attempts, error = %e, "Transient failure, retrying");
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::completion()
    }
}
