use crate::data::{Snapshot, Symbol};
use crate::error::RenderError;
use crate::ui::menu::MenuView;
use crate::ui::plot::{plot, PlotOptions};
use chrono::{DateTime, Local};

/// Everything drawn for one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    pub headline: String,
    pub chart: Vec<String>,
    pub time: String,
    pub date: String,
}

impl RenderedFrame {
    pub fn compose(
        symbol: Symbol,
        snapshot: &Snapshot,
        opts: &PlotOptions,
        now: DateTime<Local>,
    ) -> Option<Self> {
        let latest = snapshot.latest()?;
        Some(Self {
            headline: format!("{}: {:.3}", symbol.pair(), latest),
            chart: plot(snapshot.samples(), opts),
            time: format!("Time: {}", now.format("%H:%M:%S")),
            date: format!("Date: {}", now.format("%Y-%m-%d")),
        })
    }
}

/// Destination of rendered frames. Each call replaces the previous frame.
pub trait FrameSink {
    fn render(&mut self, frame: &RenderedFrame) -> Result<(), RenderError>;
}

/// A frame sink that also shows the main menu between sessions.
pub trait Screen: FrameSink {
    fn draw_menu(&mut self, view: &MenuView) -> Result<(), RenderError>;
}
