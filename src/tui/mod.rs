//! Terminal interface — note display, metronome dial, level gauges.
//!
//! The [`App`] struct holds all UI state and drives the event loop: crossterm
//! key events and pedal events in, engine commands and config saves out.

pub mod external_input;
pub mod help;
pub mod keybindings;

pub use external_input::{pedal_channel, PedalEvent, PedalReceiver, PedalSender};
pub use help::HelpScreen;
pub use keybindings::{map_key, Action};

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEventKind};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::Frame;

use crate::config;
use crate::drone::{Droner, MAX_BPM, MIN_BPM};
use crate::theory::Position;

/// How long to wait for a key event before re-polling the pedal channel.
const POLL_INTERVAL_MS: u64 = 50;

/// The main TUI application state.
pub struct App {
    droner: Droner,
    config_path: PathBuf,
    pedal: PedalReceiver,
    /// Connected pedal port name, if any.
    pedal_port: Option<String>,
    help: HelpScreen,
    /// Transient status message shown in the footer.
    notice: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(
        droner: Droner,
        config_path: PathBuf,
        pedal: PedalReceiver,
        pedal_port: Option<String>,
    ) -> Self {
        Self {
            droner,
            config_path,
            pedal,
            pedal_port,
            help: HelpScreen::new(),
            notice: None,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run until quit, saving settings on the way out.
    pub fn run(&mut self, terminal: &mut ratatui::DefaultTerminal) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;

            for pedal_event in self.pedal.drain() {
                self.handle_pedal(pedal_event);
            }

            if event::poll(Duration::from_millis(POLL_INTERVAL_MS))? {
                if let CrosstermEvent::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        if let Some(action) = map_key(key, self.help.visible) {
                            self.apply(action);
                        }
                    }
                }
            }
        }
        self.save_config();
        Ok(())
    }

    /// Apply one action, reporting failures in the footer instead of dying.
    pub fn apply(&mut self, action: Action) {
        self.notice = None;
        let result = match action {
            Action::Quit => {
                self.should_quit = true;
                Ok(())
            }
            Action::ToggleDrone => self.droner.toggle_drone(),
            Action::ToggleTick => self.droner.toggle_tick(),
            Action::ToggleLink => self.droner.toggle_linked(),
            Action::StepForward => self.droner.step(true).map(|_| ()),
            Action::StepBack => self.droner.step(false).map(|_| ()),
            Action::CycleSeries => self.droner.cycle_series().map(|_| ()),
            Action::FlipDirection => {
                self.droner.flip_direction();
                Ok(())
            }
            Action::CycleTimbre => self.droner.cycle_timbre(),
            Action::BpmNudge(delta) => self.droner.nudge_bpm(delta),
            Action::BpmScale(factor) => self.droner.scale_bpm(factor),
            Action::VolumeNudge(delta) => self.droner.nudge_volume(delta),
            Action::VelocityNudge(delta) => self.droner.nudge_velocity(delta),
            Action::ResetConfig => self.reset_config(),
            Action::ToggleHelp => {
                self.help.toggle();
                Ok(())
            }
        };

        if let Err(e) = result {
            self.notice = Some(e.to_string());
        } else if mutates_config(action) {
            self.save_config();
        }
    }

    pub fn handle_pedal(&mut self, pedal_event: PedalEvent) {
        let result = match pedal_event {
            PedalEvent::Step(delta) => self.droner.step(delta >= 0).map(|_| ()),
            PedalEvent::ToggleDrone => self.droner.toggle_drone(),
            PedalEvent::ToggleTick => self.droner.toggle_tick(),
        };
        if let Err(e) = result {
            self.notice = Some(e.to_string());
        }
    }

    fn reset_config(&mut self) -> Result<(), crate::audio::AudioError> {
        match config::reset(&self.config_path) {
            Ok(defaults) => {
                self.droner.apply_config(&defaults)?;
                self.notice = Some("settings reset to defaults".to_string());
                Ok(())
            }
            Err(e) => {
                self.notice = Some(format!("reset failed: {e}"));
                Ok(())
            }
        }
    }

    fn save_config(&mut self) {
        if let Err(e) = config::save(&self.config_path, &self.droner.to_config()) {
            self.notice = Some(format!("could not save settings: {e}"));
        }
    }

    // --- rendering ---------------------------------------------------------

    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(5),    // Notes
                Constraint::Length(3), // Tempo
                Constraint::Length(3), // Levels
                Constraint::Length(1), // Status
                Constraint::Length(1), // Footer
            ])
            .split(area);

        self.draw_title(frame, chunks[0]);
        self.draw_notes(frame, chunks[1]);
        self.draw_tempo(frame, chunks[2]);
        self.draw_levels(frame, chunks[3]);
        self.draw_status(frame, chunks[4]);
        self.draw_footer(frame, chunks[5]);

        if self.help.visible {
            self.draw_help(frame, area);
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let pedal = match &self.pedal_port {
            Some(port) => format!("pedal: {port}"),
            None => "no pedal".to_string(),
        };
        let line = Line::from(vec![
            Span::styled(
                format!(" droneroo v{} ", env!("CARGO_PKG_VERSION")),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("· {pedal}"), Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_notes(&self, frame: &mut Frame, area: Rect) {
        let position = self.droner.position();

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(40),
                Constraint::Percentage(30),
            ])
            .split(area);

        self.draw_neighbor(frame, columns[0], " previous ", position.previous_note);
        self.draw_current(frame, columns[1], &position);
        self.draw_neighbor(frame, columns[2], " next ", position.next_note);
    }

    fn draw_neighbor(&self, frame: &mut Frame, area: Rect, title: &str, name: &str) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let paragraph = Paragraph::new(pad_to_middle(name, inner.height))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, inner);
    }

    fn draw_current(&self, frame: &mut Frame, area: Rect, position: &Position) {
        let droning = self.droner.is_droning();
        let is_pivot = position.pivot_note == Some(position.current_note);

        let border_color = if droning { Color::Green } else { Color::DarkGray };
        let title = if droning { " drone ● " } else { " drone ○ " };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut style = Style::default().fg(if droning { Color::Green } else { Color::White });
        if is_pivot {
            style = style.add_modifier(Modifier::BOLD);
        }
        let paragraph = Paragraph::new(pad_to_middle(position.current_note, inner.height))
            .style(style)
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, inner);
    }

    fn draw_tempo(&self, frame: &mut Frame, area: Rect) {
        let bpm = self.droner.bpm();
        let ticking = self.droner.is_ticking();
        let label = format!("♩= {} {}", bpm as u32, if ticking { "●" } else { "○" });
        let color = if ticking { Color::Yellow } else { Color::DarkGray };

        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" tempo "))
            .gauge_style(Style::default().fg(color))
            .ratio((bpm - MIN_BPM) / (MAX_BPM - MIN_BPM))
            .label(label);
        frame.render_widget(gauge, area);
    }

    fn draw_levels(&self, frame: &mut Frame, area: Rect) {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let volume = self.droner.volume();
        let volume_gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" volume "))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(volume as f64)
            .label(format!("{:.0}%", volume * 100.0));
        frame.render_widget(volume_gauge, halves[0]);

        let velocity = self.droner.velocity();
        let velocity_gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" velocity "))
            .gauge_style(Style::default().fg(Color::Magenta))
            .ratio(velocity as f64)
            .label(format!("{:.0}%", velocity * 100.0));
        frame.render_widget(velocity_gauge, halves[1]);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let position = self.droner.position();
        let direction = if self.droner.direction() > 0 { "→" } else { "←" };
        let link = if self.droner.is_linked() { "linked" } else { "unlinked" };
        let pivot = position.pivot_note.unwrap_or("-");

        let line = Line::from(vec![
            Span::styled(
                format!(" {} ", self.droner.series_kind().label()),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(format!(
                "· {direction} · {link} · {} · pivot {pivot}",
                self.droner.timbre().label()
            )),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let text = match &self.notice {
            Some(notice) => notice.clone(),
            None => " Space drone · m metronome · ←/→ step · ? help".to_string(),
        };
        let paragraph =
            Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let width = (area.width * 60 / 100).max(44).min(area.width);
        let height = ((self.help.lines().len() + 2) as u16).min(area.height);
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let overlay = Rect::new(x, y, width, height);

        let block = Block::default()
            .style(Style::default().bg(Color::Black))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(" Help — press ? or Esc to close ");
        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        let lines: Vec<Line> = self
            .help
            .lines()
            .iter()
            .take(inner.height as usize)
            .map(|help_line| {
                let style = if help_line.is_header {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                Line::from(Span::styled(help_line.text.clone(), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// Vertically center a single line by padding with empty lines above it.
fn pad_to_middle(text: &str, height: u16) -> Vec<Line<'static>> {
    let mut lines = vec![Line::raw(""); (height.saturating_sub(1) / 2) as usize];
    lines.push(Line::raw(text.to_string()));
    lines
}

fn mutates_config(action: Action) -> bool {
    !matches!(action, Action::Quit | Action::ToggleHelp | Action::ResetConfig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::EngineCommand;
    use crate::config::Config;
    use ringbuf::{traits::Split, HeapRb};
    use tempfile::tempdir;

    fn test_app(dir: &std::path::Path) -> App {
        let rb = HeapRb::<EngineCommand>::new(256);
        let (prod, _cons) = rb.split();
        let droner = Droner::new(prod, &Config::default()).unwrap();
        let (_tx, rx) = pedal_channel();
        App::new(droner, dir.join("config.yaml"), rx, None)
    }

    #[test]
    fn quit_sets_the_flag() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        assert!(!app.should_quit());
        app.apply(Action::Quit);
        assert!(app.should_quit());
    }

    #[test]
    fn actions_persist_settings() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.apply(Action::BpmNudge(12.0));
        let saved = config::load(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(saved.bpm, 72.0);
    }

    #[test]
    fn pedal_events_step_the_series() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.handle_pedal(PedalEvent::Step(1));
        assert_eq!(app.droner.position().current_note, "F");
        app.handle_pedal(PedalEvent::Step(-1));
        assert_eq!(app.droner.position().current_note, "C");
    }

    #[test]
    fn pedal_toggles_drone_and_tick() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.handle_pedal(PedalEvent::ToggleDrone);
        assert!(app.droner.is_droning());
        // Linked by default, so the metronome came up too.
        assert!(app.droner.is_ticking());
        app.handle_pedal(PedalEvent::ToggleTick);
        assert!(!app.droner.is_droning());
    }

    #[test]
    fn reset_returns_to_defaults_and_removes_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut app = test_app(dir.path());
        app.apply(Action::BpmNudge(40.0));
        assert!(path.exists());

        app.apply(Action::ResetConfig);
        assert!(!path.exists());
        assert_eq!(app.droner.bpm(), 60.0);
        assert!(app.notice.is_some());
    }

    #[test]
    fn help_toggle_does_not_touch_the_session() {
        let dir = tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.apply(Action::ToggleHelp);
        assert!(app.help.visible);
        assert!(!dir.path().join("config.yaml").exists());
    }
}
