//! Droneroo — a practice drone and metronome for the terminal.
//!
//! Sustains a reference pitch, steps through a tonal series (circle of
//! fourths, flats-then-sharps, or chromatic), and ticks a metronome, driven
//! from a ratatui interface or a MIDI foot pedal.

pub mod audio;
pub mod config;
pub mod drone;
pub mod midi;
pub mod theory;
pub mod tui;
