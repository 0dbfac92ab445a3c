use crate::data::Symbol;
use crate::error::InputError;
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use futures_util::{Stream, StreamExt};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Select(Symbol),
    Quit,
}

/// What the main menu shows besides the fixed options.
#[derive(Debug, Clone, Default)]
pub struct MenuView {
    pub last_symbol: Option<Symbol>,
    pub notice: Option<String>,
}

impl MenuView {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec!["Main menu".to_string()];
        for symbol in Symbol::all() {
            let marker = if self.last_symbol == Some(symbol) { " *" } else { "" };
            lines.push(format!("{}. {}{}", symbol.menu_key(), symbol.pair(), marker));
        }
        lines.push(String::new());
        lines.push("Press 1-3 to change symbol, press q to exit".to_string());
        if let Some(notice) = &self.notice {
            lines.push(String::new());
            lines.push(notice.clone());
        }
        lines
    }
}

/// Waits for a menu key. Anything that is not a symbol key or quit is ignored.
pub async fn read_choice<K>(keys: &mut K) -> Result<MenuChoice, InputError>
where
    K: Stream<Item = io::Result<Event>> + Unpin,
{
    while let Some(event) = keys.next().await {
        let Event::Key(key) = event? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Char('q') => return Ok(MenuChoice::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(MenuChoice::Quit)
            }
            KeyCode::Char(c) => {
                if let Some(symbol) = Symbol::from_menu_key(c) {
                    return Ok(MenuChoice::Select(symbol));
                }
            }
            _ => {}
        }
    }
    Err(InputError::Closed)
}
