use crate::data::{PriceSource, Symbol};
use crate::error::FetchError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Bounded exponential backoff around a single price fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// First failure is final.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Pause after the `failed`-th failed attempt (1-based).
    pub fn delay_after(&self, failed: u32) -> Duration {
        let shift = failed.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }

    /// Fetches `symbol`, retrying transient failures. Returns `Ok(None)` if
    /// `cancel` fires first; an in-flight request is dropped in that case.
    pub async fn fetch<S>(
        &self,
        source: &S,
        symbol: Symbol,
        cancel: &CancellationToken,
    ) -> Result<Option<f64>, FetchError>
    where
        S: PriceSource + ?Sized,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(None),
                res = source.fetch(symbol) => res,
            };

            match result {
                Ok(price) => return Ok(Some(price)),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(%symbol, attempt, ?delay, "fetch failed, retrying: {}", e);
                    tokio::select! {
                        _ = cancel.cancelled() => return Ok(None),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
