use crate::error::InputError;
use crossterm::event::{Event, KeyCode, KeyEventKind};
use futures_util::{Stream, StreamExt};
use std::io;

#[derive(Debug)]
pub enum CancelReason {
    UserRequested,
    InputError(InputError),
}

fn is_cancel_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Backspace | KeyCode::Delete)
}

/// Resolves on the first cancel key press or input failure, whichever comes
/// first. Every other event is ignored.
pub async fn watch<K>(keys: &mut K) -> CancelReason
where
    K: Stream<Item = io::Result<Event>> + Unpin + ?Sized,
{
    while let Some(event) = keys.next().await {
        match event {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press && is_cancel_key(key.code) => {
                return CancelReason::UserRequested;
            }
            Ok(_) => {}
            Err(e) => return CancelReason::InputError(InputError::Io(e)),
        }
    }
    CancelReason::InputError(InputError::Closed)
}
