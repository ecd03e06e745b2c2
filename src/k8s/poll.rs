//! Fixed-interval polling with a deadline and cancellation

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{BenchError, BenchResult};

#[derive(Debug, Clone, Copy)]
pub struct Poller {
    interval: Duration,
    timeout: Duration,
}

impl Poller {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Run `check` immediately and then every interval until it yields a value.
    ///
    /// Errors from `check` end the loop. Cancellation is observed between
    /// checks, never while one is in flight.
    pub async fn poll_until<T, F, Fut>(
        &self,
        what: &str,
        cancel: &CancellationToken,
        mut check: F,
    ) -> BenchResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = BenchResult<Option<T>>>,
    {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(value) = check().await? {
                return Ok(value);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(BenchError::Timeout(self.timeout, what.to_string()));
            }

            let wake = (now + self.interval).min(deadline);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BenchError::Cancelled),
                _ = tokio::time::sleep_until(wake) => {}
            }
        }
    }
}
