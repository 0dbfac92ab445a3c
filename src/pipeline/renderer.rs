use crate::data::{Snapshot, Symbol};
use crate::error::RenderError;
use crate::ui::{FrameSink, PlotOptions, RenderedFrame};
use chrono::Local;
use tokio::sync::watch;

/// Draws one frame per observed snapshot.
///
/// Snapshots arrive through a latest-value channel: if drawing falls behind
/// the sampler, intermediate snapshots are skipped rather than queued, so
/// memory stays bounded and the sampler never waits on the terminal.
pub struct Renderer {
    symbol: Symbol,
    plot: PlotOptions,
    frames: u64,
}

impl Renderer {
    pub fn new(symbol: Symbol, plot: PlotOptions) -> Self {
        Self {
            symbol,
            plot,
            frames: 0,
        }
    }

    /// Frames drawn so far, including by a run that failed.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Draws until the sender is gone. A snapshot published right before the
    /// sender closed is still drawn.
    pub async fn run<F>(
        &mut self,
        mut snapshots: watch::Receiver<Snapshot>,
        sink: &mut F,
    ) -> Result<(), RenderError>
    where
        F: FrameSink + ?Sized,
    {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            let Some(frame) = RenderedFrame::compose(self.symbol, &snapshot, &self.plot, Local::now())
            else {
                continue;
            };
            sink.render(&frame)?;
            self.frames += 1;
        }

        tracing::debug!(symbol = %self.symbol, frames = self.frames, "snapshot stream closed");
        Ok(())
    }
}
