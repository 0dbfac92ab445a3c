use crate::data::{BoundedWindow, PriceSource, RetryPolicy, Snapshot, Symbol};
use crate::error::FetchError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// What a sampler leaves behind when it stops. History and counts are kept
/// even when a fetch failure ended the loop.
#[derive(Debug)]
pub struct SamplerExit {
    pub window: Snapshot,
    pub fetched: u64,
    pub failure: Option<FetchError>,
}

/// Fetches one price per cadence tick into a window it owns exclusively.
pub struct Sampler<S: ?Sized> {
    source: Arc<S>,
    symbol: Symbol,
    window: BoundedWindow,
    cadence: Duration,
    retry: RetryPolicy,
}

impl<S> Sampler<S>
where
    S: PriceSource + ?Sized,
{
    pub fn new(
        source: Arc<S>,
        symbol: Symbol,
        window: BoundedWindow,
        cadence: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            symbol,
            window,
            cadence,
            retry,
        }
    }

    /// Runs until `cancel` fires, the snapshot receiver goes away, or a fetch
    /// fails for good. Each successful fetch publishes exactly one snapshot.
    pub async fn run(
        mut self,
        publish: watch::Sender<Snapshot>,
        cancel: CancellationToken,
    ) -> SamplerExit {
        let mut fetched = 0u64;
        let mut failure = None;
        tracing::debug!(
            symbol = %self.symbol,
            capacity = self.window.capacity(),
            cadence = ?self.cadence,
            "sampler started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let price = match self.retry.fetch(&*self.source, self.symbol, &cancel).await {
                Ok(Some(price)) => price,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(symbol = %self.symbol, fetched, "fetch failed: {}", e);
                    failure = Some(e);
                    break;
                }
            };
            if cancel.is_cancelled() {
                break;
            }

            fetched += 1;
            let snapshot = self.window.append(price);
            tracing::trace!(symbol = %self.symbol, price, len = self.window.len(), "sample");
            if publish.send(snapshot).is_err() {
                tracing::debug!(symbol = %self.symbol, "renderer gone, sampler stopping");
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.cadence) => {}
            }
        }

        SamplerExit {
            window: self.window.snapshot(),
            fetched,
            failure,
        }
    }
}
