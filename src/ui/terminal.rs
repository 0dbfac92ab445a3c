use crate::error::RenderError;
use crate::ui::{FrameSink, MenuView, RenderedFrame, Screen};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use std::io::{self, Stdout};

/// Alternate-screen terminal that redraws each frame in place.
pub struct TerminalSink {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSink {
    pub fn new() -> Result<Self, RenderError> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;
        Ok(Self { terminal })
    }
}

impl Screen for TerminalSink {
    fn draw_menu(&mut self, view: &MenuView) -> Result<(), RenderError> {
        let lines: Vec<Line> = view
            .lines()
            .into_iter()
            .enumerate()
            .map(|(idx, text)| {
                let style = if idx == 0 {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else if view.notice.as_deref() == Some(text.as_str()) {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(Span::styled(text, style))
            })
            .collect();

        self.terminal.draw(|frame| {
            let area = frame.area();
            let block = Block::default()
                .title("tickerplot")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta));
            frame.render_widget(Paragraph::new(lines).block(block), area);
        })?;
        Ok(())
    }
}

impl FrameSink for TerminalSink {
    fn render(&mut self, rendered: &RenderedFrame) -> Result<(), RenderError> {
        let mut lines = Vec::with_capacity(rendered.chart.len() + 5);
        lines.push(Line::from(Span::styled(
            rendered.headline.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));
        lines.extend(
            rendered
                .chart
                .iter()
                .map(|row| Line::from(Span::styled(row.clone(), Style::default().fg(Color::Red)))),
        );
        lines.push(Line::from(Span::styled(
            rendered.time.clone(),
            Style::default().fg(Color::Gray),
        )));
        lines.push(Line::from(Span::styled(
            rendered.date.clone(),
            Style::default().fg(Color::Gray),
        )));
        lines.push(Line::from(vec![
            Span::styled("Backspace", Style::default().fg(Color::Yellow)),
            Span::raw(":Menu"),
        ]));

        self.terminal.draw(|frame| {
            let area = frame.area();
            let height = (lines.len() as u16 + 2).min(area.height);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan));
            let para = Paragraph::new(lines).block(block);
            frame.render_widget(
                para,
                Rect {
                    x: area.x,
                    y: area.y,
                    width: area.width,
                    height,
                },
            );
        })?;
        Ok(())
    }
}

impl Drop for TerminalSink {
    fn drop(&mut self) {
        if let Err(e) = execute!(self.terminal.backend_mut(), LeaveAlternateScreen) {
            tracing::warn!("failed to leave alternate screen: {}", e);
        }
        let _ = self.terminal.show_cursor();
    }
}
