//! Key bindings — maps key events to application actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Application-level actions triggered by key events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Quit the application.
    Quit,
    /// Start/stop the drone.
    ToggleDrone,
    /// Start/stop the metronome.
    ToggleTick,
    /// Link/unlink drone and metronome.
    ToggleLink,
    /// Step to the next note (direction-aware).
    StepForward,
    /// Step to the previous note (direction-aware).
    StepBack,
    /// Cycle to the next tonal series.
    CycleSeries,
    /// Reverse the stepping direction.
    FlipDirection,
    /// Cycle the drone timbre.
    CycleTimbre,
    /// Adjust the tempo by a BPM delta.
    BpmNudge(f64),
    /// Scale the tempo (half/double).
    BpmScale(f64),
    /// Adjust master volume.
    VolumeNudge(f32),
    /// Adjust drone velocity.
    VelocityNudge(f32),
    /// Delete saved settings and return to defaults.
    ResetConfig,
    /// Toggle the help overlay.
    ToggleHelp,
}

/// Map a key event to an action. The help overlay swallows everything except
/// the keys that close it (and quit still works).
pub fn map_key(key: KeyEvent, help_visible: bool) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl {
        return match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    if help_visible {
        return match key.code {
            KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char(' ') => Some(Action::ToggleDrone),
        KeyCode::Char('m') => Some(Action::ToggleTick),
        KeyCode::Char('l') => Some(Action::ToggleLink),
        KeyCode::Right => Some(Action::StepForward),
        KeyCode::Left => Some(Action::StepBack),
        KeyCode::Char('s') => Some(Action::CycleSeries),
        KeyCode::Char('d') => Some(Action::FlipDirection),
        KeyCode::Char('i') => Some(Action::CycleTimbre),
        KeyCode::Up => Some(Action::BpmNudge(1.0)),
        KeyCode::Down => Some(Action::BpmNudge(-1.0)),
        KeyCode::PageUp => Some(Action::BpmScale(2.0)),
        KeyCode::PageDown => Some(Action::BpmScale(0.5)),
        KeyCode::Char(']') => Some(Action::VolumeNudge(0.05)),
        KeyCode::Char('[') => Some(Action::VolumeNudge(-0.05)),
        KeyCode::Char('}') => Some(Action::VelocityNudge(0.05)),
        KeyCode::Char('{') => Some(Action::VelocityNudge(-0.05)),
        KeyCode::Char('r') => Some(Action::ResetConfig),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        _ => None,
    }
}
