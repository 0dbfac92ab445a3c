use crate::data::{BoundedWindow, PriceSource, RetryPolicy, Snapshot, Symbol};
use crate::error::{RenderError, SessionError};
use crate::pipeline::renderer::Renderer;
use crate::pipeline::sampler::{Sampler, SamplerExit};
use crate::pipeline::watcher::{self, CancelReason};
use crate::ui::{FrameSink, PlotOptions};
use crossterm::event::Event;
use futures_util::Stream;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Draining,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cadence: Duration,
    pub capacity: usize,
    pub retry: RetryPolicy,
    pub plot: PlotOptions,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cadence: Duration::from_secs(1),
            capacity: crate::data::window::DEFAULT_CAPACITY,
            retry: RetryPolicy::default(),
            plot: PlotOptions::default(),
        }
    }
}

/// What ended a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    UserRequested,
    InputFailed,
    SamplerFailed,
    RendererFailed,
    /// Both stages stopped on their own with nothing to report.
    Drained,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EndReason::UserRequested => "user requested",
            EndReason::InputFailed => "keyboard failed",
            EndReason::SamplerFailed => "sampler failed",
            EndReason::RendererFailed => "renderer failed",
            EndReason::Drained => "drained",
        };
        f.write_str(text)
    }
}

/// Result of a session that ended without an error.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub symbol: Symbol,
    pub reason: EndReason,
    pub frames: u64,
    pub fetched: u64,
    pub window: Snapshot,
}

enum Trigger {
    Cancel(CancelReason),
    Sampler,
    Renderer,
}

fn joined(res: Result<SamplerExit, JoinError>) -> Result<SamplerExit, SessionError> {
    res.map_err(|e| SessionError::Panicked(e.to_string()))
}

/// One live chart for one symbol, from start to full teardown.
pub struct PipelineSession {
    symbol: Symbol,
    settings: SessionSettings,
    state: SessionState,
}

impl PipelineSession {
    pub fn new(symbol: Symbol, settings: SessionSettings) -> Self {
        Self {
            symbol,
            settings,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn advance(&mut self, next: SessionState) {
        use SessionState::*;
        debug_assert!(
            matches!(
                (self.state, next),
                (Idle, Running) | (Running, Draining) | (Draining, Stopped)
            ),
            "illegal session transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::info!(symbol = %self.symbol, from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    /// Runs the pipeline until the user cancels or a stage fails.
    ///
    /// `keys` is the session's keyboard lease. It is dropped, and so released,
    /// exactly once before this returns, whatever the outcome. The sampler
    /// task has always finished by then.
    pub async fn run<S, F, K>(
        &mut self,
        source: Arc<S>,
        sink: &mut F,
        mut keys: K,
    ) -> Result<SessionSummary, SessionError>
    where
        S: PriceSource + ?Sized + 'static,
        F: FrameSink + ?Sized,
        K: Stream<Item = io::Result<Event>> + Unpin,
    {
        self.advance(SessionState::Running);

        let cancel = CancellationToken::new();
        let (publish, snapshots) = watch::channel(Snapshot::default());
        let sampler = Sampler::new(
            source,
            self.symbol,
            BoundedWindow::new(self.settings.capacity),
            self.settings.cadence,
            self.settings.retry,
        );
        let mut sampler_task =
            AbortOnDropHandle::new(tokio::spawn(sampler.run(publish, cancel.clone())));
        let mut renderer = Renderer::new(self.symbol, self.settings.plot);

        let (trigger, sampler_exit, render_result) = {
            let render = renderer.run(snapshots, sink);
            tokio::pin!(render);

            let mut sampler_exit = None;
            let mut render_result = None;

            let trigger = tokio::select! {
                reason = watcher::watch(&mut keys) => Trigger::Cancel(reason),
                res = &mut sampler_task => {
                    sampler_exit = Some(joined(res));
                    Trigger::Sampler
                }
                res = &mut render => {
                    render_result = Some(res);
                    Trigger::Renderer
                }
            };

            self.advance(SessionState::Draining);
            cancel.cancel();

            let sampler_exit = match sampler_exit {
                Some(exit) => exit,
                None => joined((&mut sampler_task).await),
            };
            let render_result = match render_result {
                Some(res) => res,
                None => (&mut render).await,
            };
            (trigger, sampler_exit, render_result)
        };
        drop(keys);
        self.advance(SessionState::Stopped);

        self.conclude(trigger, sampler_exit, render_result, renderer.frames())
    }

    fn conclude(
        &self,
        trigger: Trigger,
        sampler: Result<SamplerExit, SessionError>,
        render: Result<(), RenderError>,
        frames: u64,
    ) -> Result<SessionSummary, SessionError> {
        let exit = match sampler {
            Ok(exit) => exit,
            Err(e) => {
                tracing::error!(symbol = %self.symbol, frames, "sampler task died: {}", e);
                return Err(e);
            }
        };

        // The stage that stopped first decides the error; the other one only
        // ran down after the cancel.
        let sampler_first = matches!(trigger, Trigger::Sampler);
        let (reason, outcome): (EndReason, Result<(), SessionError>) = match trigger {
            Trigger::Cancel(CancelReason::UserRequested) => {
                if let Some(e) = &exit.failure {
                    tracing::warn!(symbol = %self.symbol, "sampler failed while draining: {}", e);
                }
                if let Err(e) = &render {
                    tracing::warn!(symbol = %self.symbol, "renderer failed while draining: {}", e);
                }
                (EndReason::UserRequested, Ok(()))
            }
            Trigger::Cancel(CancelReason::InputError(e)) => {
                tracing::error!(symbol = %self.symbol, "keyboard failed: {}", e);
                (EndReason::InputFailed, Err(e.into()))
            }
            Trigger::Sampler | Trigger::Renderer => {
                match (exit.failure, render) {
                    (Some(fetch), Err(draw)) if sampler_first => {
                        tracing::warn!(symbol = %self.symbol, "renderer failed while draining: {}", draw);
                        (EndReason::SamplerFailed, Err(fetch.into()))
                    }
                    (Some(fetch), Err(draw)) => {
                        tracing::warn!(symbol = %self.symbol, "sampler failed while draining: {}", fetch);
                        (EndReason::RendererFailed, Err(draw.into()))
                    }
                    (Some(fetch), Ok(())) => (EndReason::SamplerFailed, Err(fetch.into())),
                    (None, Err(draw)) => (EndReason::RendererFailed, Err(draw.into())),
                    (None, Ok(())) => (EndReason::Drained, Ok(())),
                }
            }
        };

        tracing::info!(
            symbol = %self.symbol,
            %reason,
            frames,
            fetched = exit.fetched,
            samples = exit.window.len(),
            "session finished"
        );
        outcome.map(|()| SessionSummary {
            symbol: self.symbol,
            reason,
            frames,
            fetched: exit.fetched,
            window: exit.window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, InputError};
    use crate::pipeline::testing::{press, send_after, RecordingSink, ScriptedSource, Step, TestKeys};
    use crossterm::event::KeyCode;
    use std::sync::atomic::Ordering;
    use tokio::time::{sleep, Instant};

    fn settings(retry: RetryPolicy) -> SessionSettings {
        SessionSettings {
            retry,
            ..SessionSettings::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn three_ticks_render_three_frames() {
        let source = ScriptedSource::prices(&[10.0, 20.0, 30.0]);
        let (keys, tx, releases) = TestKeys::channel();
        send_after(tx, Duration::from_millis(2_500), press(KeyCode::Backspace));

        let mut sink = RecordingSink::default();
        let mut session = PipelineSession::new(Symbol::Btc, settings(RetryPolicy::none()));
        let summary = session.run(source.clone(), &mut sink, keys).await.unwrap();

        assert_eq!(summary.window.samples(), &[10.0, 20.0, 30.0]);
        assert_eq!(summary.reason, EndReason::UserRequested);
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.fetched, 3);
        assert_eq!(
            sink.headlines(),
            vec!["BTC_USD: 10.000", "BTC_USD: 20.000", "BTC_USD: 30.000"]
        );
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_fetch_after_cancel() {
        let source = ScriptedSource::prices(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let (keys, tx, _releases) = TestKeys::channel();
        send_after(tx, Duration::from_millis(1_200), press(KeyCode::Backspace));

        let mut sink = RecordingSink::default();
        let mut session = PipelineSession::new(Symbol::Eth, settings(RetryPolicy::none()));
        session.run(source.clone(), &mut sink, keys).await.unwrap();
        let fetched_at_stop = source.calls();
        sleep(Duration::from_secs(5)).await;

        assert_eq!(fetched_at_stop, 2);
        assert_eq!(source.calls(), fetched_at_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_error_on_second_tick_is_fatal() {
        let source = ScriptedSource::new(vec![Step::Price(10.0), Step::Fail(500), Step::Price(30.0)]);
        let (keys, releases) = TestKeys::idle();

        let mut sink = RecordingSink::default();
        let mut session = PipelineSession::new(Symbol::Btc, settings(RetryPolicy::none()));
        let err = session.run(source.clone(), &mut sink, keys).await.unwrap_err();
        sleep(Duration::from_secs(5)).await;

        assert!(matches!(err, SessionError::Fetch(FetchError::Status(500))));
        assert_eq!(source.calls(), 2);
        assert_eq!(sink.headlines(), vec!["BTC_USD: 10.000"]);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_error_is_retried_without_losing_history() {
        let source = ScriptedSource::new(vec![Step::Price(10.0), Step::Fail(503), Step::Price(20.0)]);
        let (keys, tx, _releases) = TestKeys::channel();
        send_after(tx, Duration::from_millis(1_800), press(KeyCode::Delete));

        let mut sink = RecordingSink::default();
        let mut session = PipelineSession::new(Symbol::Ltc, settings(RetryPolicy::default()));
        let summary = session.run(source.clone(), &mut sink, keys).await.unwrap();

        assert_eq!(summary.window.samples(), &[10.0, 20.0]);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_inflight_fetch_is_prompt() {
        let cadence = Duration::from_secs(1);
        let latency = Duration::from_secs(10);
        let source = ScriptedSource::new(vec![Step::Price(1.0), Step::Slow(latency, 2.0)]);
        let (keys, tx, releases) = TestKeys::channel();
        send_after(tx, Duration::from_millis(1_500), press(KeyCode::Backspace));

        let started = Instant::now();
        let mut sink = RecordingSink::default();
        let mut session = PipelineSession::new(Symbol::Btc, settings(RetryPolicy::none()));
        let summary = session.run(source.clone(), &mut sink, keys).await.unwrap();

        assert!(started.elapsed() <= cadence + latency);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(summary.window.samples(), &[1.0]);
        assert_eq!(source.calls(), 2);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn keyboard_failure_forces_shutdown() {
        let source = ScriptedSource::prices(&[1.0, 2.0, 3.0]);
        let (keys, tx, releases) = TestKeys::channel();
        send_after(tx, Duration::from_millis(500), Err(io::Error::other("tty lost")));

        let mut sink = RecordingSink::default();
        let mut session = PipelineSession::new(Symbol::Btc, settings(RetryPolicy::none()));
        let err = session.run(source.clone(), &mut sink, keys).await.unwrap_err();

        assert!(matches!(err, SessionError::Input(InputError::Io(_))));
        assert_eq!(source.calls(), 1);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn render_failure_stops_sampler() {
        let source = ScriptedSource::prices(&[1.0, 2.0, 3.0]);
        let (keys, releases) = TestKeys::idle();

        let mut sink = RecordingSink {
            fail_after: Some(1),
            ..Default::default()
        };
        let mut session = PipelineSession::new(Symbol::Btc, settings(RetryPolicy::none()));
        let err = session.run(source.clone(), &mut sink, keys).await.unwrap_err();
        sleep(Duration::from_secs(5)).await;

        assert!(matches!(err, SessionError::Render(_)));
        assert_eq!(sink.frames.len(), 1);
        assert_eq!(source.calls(), 2);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failures_while_draining_keep_progress() {
        let session = PipelineSession::new(Symbol::Btc, SessionSettings::default());
        let mut window = BoundedWindow::new(4);
        window.append(1.0);
        window.append(2.0);
        let exit = SamplerExit {
            window: window.append(3.0),
            fetched: 3,
            failure: Some(FetchError::Status(500)),
        };
        let render = Err(RenderError::Io(io::Error::other("terminal closed")));

        let summary = session
            .conclude(Trigger::Cancel(CancelReason::UserRequested), Ok(exit), render, 2)
            .unwrap();

        assert_eq!(summary.reason, EndReason::UserRequested);
        assert_eq!(summary.fetched, 3);
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.window.samples(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn first_stage_to_stop_decides_the_error() {
        let session = PipelineSession::new(Symbol::Btc, SessionSettings::default());
        let exit = || SamplerExit {
            window: Snapshot::default(),
            fetched: 1,
            failure: Some(FetchError::Status(404)),
        };
        let draw_failed = || Err(RenderError::Io(io::Error::other("terminal closed")));

        let err = session
            .conclude(Trigger::Sampler, Ok(exit()), draw_failed(), 1)
            .unwrap_err();
        assert!(matches!(err, SessionError::Fetch(FetchError::Status(404))));

        let err = session
            .conclude(Trigger::Renderer, Ok(exit()), draw_failed(), 1)
            .unwrap_err();
        assert!(matches!(err, SessionError::Render(_)));

        let err = session
            .conclude(Trigger::Renderer, Ok(exit()), Ok(()), 1)
            .unwrap_err();
        assert!(matches!(err, SessionError::Fetch(_)));
    }
}
