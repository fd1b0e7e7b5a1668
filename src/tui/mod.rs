//! Ratatui-based trace viewer.
//!
//! Shows one detector panel at a time with the same overlay as the saved
//! figure. Overlay layers can be toggled while browsing.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::error::AppError;
use crate::plot::{ChipPanel, Layers};

mod plotters_chart;

use plotters_chart::ChipPanelChart;

/// Start the viewer on `panels`; `title` names the trace file.
pub fn run(panels: Vec<ChipPanel>, title: String) -> Result<(), AppError> {
    if panels.is_empty() {
        return Err(AppError::new(3, "Nothing to show."));
    }

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(panels, title);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    panels: Vec<ChipPanel>,
    title: String,
    selected: usize,
    layers: Layers,
    status: String,
}

impl App {
    fn new(panels: Vec<ChipPanel>, title: String) -> Self {
        let selected = panels.iter().position(|p| p.overlay.is_some()).unwrap_or(0);
        Self {
            panels,
            title,
            selected,
            layers: Layers::default(),
            status: String::new(),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns true when the viewer should close.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        let n = self.panels.len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left => self.selected = (self.selected + n - 1) % n,
            KeyCode::Right => self.selected = (self.selected + 1) % n,
            KeyCode::Char('c') => {
                self.layers.segments = !self.layers.segments;
                self.status = format!("curvature: {}", on_off(self.layers.segments));
            }
            KeyCode::Char('w') => {
                self.layers.marks = !self.layers.marks;
                self.status = format!("wavelength marks: {}", on_off(self.layers.marks));
            }
            KeyCode::Char('l') => {
                self.layers.labels = !self.layers.labels;
                self.status = format!("labels: {}", on_off(self.layers.labels));
            }
            _ => {}
        }
        false
    }

    fn current(&self) -> &ChipPanel {
        &self.panels[self.selected]
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let panel = self.current();
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("trace-view", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" {}", self.title)),
        ]));

        let detail = match &panel.overlay {
            Some(overlay) => format!(
                "{} ({}/{}) | traces: {} | unlabeled: {}",
                panel.detector,
                self.selected + 1,
                self.panels.len(),
                overlay.traces.len(),
                overlay.unlabeled.len(),
            ),
            None => format!(
                "{} ({}/{}) | skipped: {}",
                panel.detector,
                self.selected + 1,
                self.panels.len(),
                panel.note.as_deref().unwrap_or("no data"),
            ),
        };
        lines.push(Line::from(Span::styled(detail, Style::default().fg(Color::Gray))));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::LEFT | Borders::RIGHT | Borders::TOP));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let panel = self.current();
        let block = Block::default().title(panel.detector.to_string()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        if panel.overlay.is_none() {
            let msg = Paragraph::new(format!(
                "{} skipped: {}",
                panel.detector,
                panel.note.as_deref().unwrap_or("no data")
            ))
            .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let widget = ChipPanelChart {
            panel,
            layers: self.layers,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ detector  c curvature  w wavelength  l labels  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn on_off(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}
