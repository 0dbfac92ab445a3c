//! Scoped access to the raw keyboard.
//!
//! The terminal has one keyboard, so at most one [`KeyboardLease`] exists at
//! a time. Acquiring one enables raw mode and opens an event stream; dropping
//! it restores cooked mode on every exit path, unwinding included.

use crate::error::InputError;
use crossterm::event::{Event, EventStream};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use futures_util::Stream;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

static KEYBOARD_HELD: AtomicBool = AtomicBool::new(false);

/// Process-wide exclusivity token; released on drop.
#[derive(Debug)]
struct Claim;

impl Claim {
    fn try_take() -> Result<Self, InputError> {
        KEYBOARD_HELD
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Claim)
            .map_err(|_| InputError::Busy)
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        KEYBOARD_HELD.store(false, Ordering::Release);
    }
}

pub struct KeyboardLease {
    events: EventStream,
    // Dropped after raw mode is restored.
    _claim: Claim,
}

impl KeyboardLease {
    pub fn acquire() -> Result<Self, InputError> {
        let claim = Claim::try_take()?;
        enable_raw_mode()?;
        tracing::debug!("keyboard acquired");
        Ok(Self {
            events: EventStream::new(),
            _claim: claim,
        })
    }
}

/// Hands out keyboard leases, one at a time.
pub trait KeySource {
    type Keys: Stream<Item = io::Result<Event>> + Unpin;

    fn acquire(&self) -> Result<Self::Keys, InputError>;
}

/// The controlling terminal's keyboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keyboard;

impl KeySource for Keyboard {
    type Keys = KeyboardLease;

    fn acquire(&self) -> Result<KeyboardLease, InputError> {
        KeyboardLease::acquire()
    }
}

impl Stream for KeyboardLease {
    type Item = io::Result<Event>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl Drop for KeyboardLease {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            tracing::warn!("failed to leave raw mode: {}", e);
        }
        tracing::debug!("keyboard released");
    }
}
