//! Test doubles for the pipeline collaborators.

use crate::data::{PriceSource, Symbol};
use crate::error::{FetchError, InputError, RenderError};
use crate::ui::{FrameSink, KeySource, MenuView, RenderedFrame, Screen};
use async_trait::async_trait;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use futures_util::{stream, Stream, StreamExt};
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;

pub enum Step {
    Price(f64),
    Fail(u16),
    Slow(Duration, f64),
}

/// Replays scripted replies; once they run out every fetch hangs.
pub struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn prices(values: &[f64]) -> Arc<Self> {
        Self::new(values.iter().map(|v| Step::Price(*v)).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    async fn fetch(&self, _symbol: Symbol) -> Result<f64, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Price(v)) => Ok(v),
            Some(Step::Fail(code)) => Err(FetchError::Status(code)),
            Some(Step::Slow(latency, v)) => {
                tokio::time::sleep(latency).await;
                Ok(v)
            }
            None => std::future::pending().await,
        }
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub frames: Vec<RenderedFrame>,
    pub menus: Vec<MenuView>,
    pub fail_after: Option<usize>,
}

impl RecordingSink {
    pub fn headlines(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.headline.as_str()).collect()
    }
}

impl FrameSink for RecordingSink {
    fn render(&mut self, frame: &RenderedFrame) -> Result<(), RenderError> {
        if self.fail_after == Some(self.frames.len()) {
            return Err(RenderError::Io(io::Error::other("terminal closed")));
        }
        self.frames.push(frame.clone());
        Ok(())
    }
}

impl Screen for RecordingSink {
    fn draw_menu(&mut self, view: &MenuView) -> Result<(), RenderError> {
        self.menus.push(view.clone());
        Ok(())
    }
}

type EventStream = Pin<Box<dyn Stream<Item = io::Result<Event>> + Send>>;

/// Key stream fed from a channel; counts how often it is released.
pub struct TestKeys {
    events: EventStream,
    releases: Arc<AtomicUsize>,
}

impl TestKeys {
    pub fn channel() -> (Self, mpsc::UnboundedSender<io::Result<Event>>, Arc<AtomicUsize>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let events = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });
        let releases = Arc::new(AtomicUsize::new(0));
        let keys = Self {
            events: Box::pin(events),
            releases: releases.clone(),
        };
        (keys, tx, releases)
    }

    pub fn idle() -> (Self, Arc<AtomicUsize>) {
        let releases = Arc::new(AtomicUsize::new(0));
        let keys = Self {
            events: Box::pin(stream::pending::<io::Result<Event>>()),
            releases: releases.clone(),
        };
        (keys, releases)
    }
}

impl Stream for TestKeys {
    type Item = io::Result<Event>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.as_mut().poll_next(cx)
    }
}

impl Drop for TestKeys {
    fn drop(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out one scripted lease per `acquire`. Each lease replays its script
/// and then stays open; a second lease while one is held is refused.
pub struct ScriptedKeys {
    scripts: Mutex<VecDeque<Vec<io::Result<Event>>>>,
    held: Arc<AtomicBool>,
    leases: AtomicUsize,
}

impl ScriptedKeys {
    pub fn new(scripts: Vec<Vec<io::Result<Event>>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            held: Arc::new(AtomicBool::new(false)),
            leases: AtomicUsize::new(0),
        }
    }

    pub fn leases(&self) -> usize {
        self.leases.load(Ordering::SeqCst)
    }

    pub fn held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

impl KeySource for ScriptedKeys {
    type Keys = ScriptedLease;

    fn acquire(&self) -> Result<ScriptedLease, InputError> {
        if self.held.swap(true, Ordering::SeqCst) {
            return Err(InputError::Busy);
        }
        self.leases.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        Ok(ScriptedLease {
            events: Box::pin(stream::iter(script).chain(stream::pending())),
            held: self.held.clone(),
        })
    }
}

pub struct ScriptedLease {
    events: EventStream,
    held: Arc<AtomicBool>,
}

impl Stream for ScriptedLease {
    type Item = io::Result<Event>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.as_mut().poll_next(cx)
    }
}

impl Drop for ScriptedLease {
    fn drop(&mut self) {
        self.held.store(false, Ordering::SeqCst);
    }
}

pub fn press(code: KeyCode) -> io::Result<Event> {
    Ok(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
}

/// Sends `event` on `tx` once `after` has elapsed.
pub fn send_after(tx: mpsc::UnboundedSender<io::Result<Event>>, after: Duration, event: io::Result<Event>) {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        let _ = tx.send(event);
    });
}
