pub mod frame;
pub mod keyboard;
pub mod menu;
pub mod plot;
pub mod terminal;

pub use frame::{FrameSink, RenderedFrame, Screen};
pub use keyboard::{KeySource, Keyboard};
pub use menu::{MenuChoice, MenuView};
pub use plot::PlotOptions;
pub use terminal::TerminalSink;
