//! Tonal series — the fixed note tables a practice session steps through.
//!
//! Each series is a 12-entry table of display names. Stepping wraps at both
//! ends, so "next" from the last entry lands on the first and vice versa.
//! Compound names like "D♯/E♭" resolve through the parser's leading-prefix
//! rule to their first spelling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::note::{note_to_midi, DRONE_OCTAVE_BASE};

/// Number of entries in every series table.
pub const SERIES_LEN: usize = 12;

const CIRCLE_OF_FOURTHS: [&str; SERIES_LEN] = [
    "C", "F", "A♯/B♭", "D♯/E♭", "G♯/A♭", "C♯/D♭", "F♯/G♭", "B", "E", "A", "D", "G",
];

const FLATS_THEN_SHARPS: [&str; SERIES_LEN] = [
    "C", "F", "B♭", "E♭", "A♭", "D♭", "G", "D", "A", "E", "B", "F♯",
];

const CHROMATIC: [&str; SERIES_LEN] = [
    "C", "C♯/D♭", "D", "D♯/E♭", "E", "F", "F♯/G♭", "G", "G♯/A♭", "A", "A♯/B♭", "B",
];

/// The tonal series a drone session can step through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesKind {
    #[default]
    CircleOfFourths,
    FlatsThenSharps,
    Chromatic,
}

impl SeriesKind {
    pub fn all() -> &'static [SeriesKind] {
        &[
            SeriesKind::CircleOfFourths,
            SeriesKind::FlatsThenSharps,
            SeriesKind::Chromatic,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeriesKind::CircleOfFourths => "Circle of Fourths",
            SeriesKind::FlatsThenSharps => "Flats, then Sharps",
            SeriesKind::Chromatic => "Chromatic",
        }
    }

    /// The display-name table for this series.
    pub fn names(&self) -> &'static [&'static str; SERIES_LEN] {
        match self {
            SeriesKind::CircleOfFourths => &CIRCLE_OF_FOURTHS,
            SeriesKind::FlatsThenSharps => &FLATS_THEN_SHARPS,
            SeriesKind::Chromatic => &CHROMATIC,
        }
    }

    pub fn next(&self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|k| k == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn prev(&self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|k| k == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SeriesKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fourths" | "circle" | "circle-of-fourths" => Ok(SeriesKind::CircleOfFourths),
            "flats" | "flats-then-sharps" | "ray-brown" => Ok(SeriesKind::FlatsThenSharps),
            "chromatic" => Ok(SeriesKind::Chromatic),
            _ => Err(format!(
                "unknown series {s:?} (expected fourths, flats, or chromatic)"
            )),
        }
    }
}

/// Snapshot of the current position, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub index: usize,
    pub previous_note: &'static str,
    pub current_note: &'static str,
    pub next_note: &'static str,
    /// Name of the entry where the drone was last started, if any.
    pub pivot_note: Option<&'static str>,
    /// MIDI note sounding at this position.
    pub midi_note: u8,
}

/// A series instance: the resolved note table plus a cursor and an optional
/// pivot marking where the drone was started.
#[derive(Debug, Clone)]
pub struct Series {
    kind: SeriesKind,
    notes: [u8; SERIES_LEN],
    index: usize,
    pivot: Option<usize>,
}

impl Series {
    pub fn new(kind: SeriesKind) -> Self {
        let mut notes = [DRONE_OCTAVE_BASE; SERIES_LEN];
        for (slot, name) in notes.iter_mut().zip(kind.names()) {
            // An unparseable table entry falls back to the base C drone.
            *slot = note_to_midi(name).unwrap_or(DRONE_OCTAVE_BASE);
        }
        Self {
            kind,
            notes,
            index: 0,
            pivot: None,
        }
    }

    /// Create a series with the cursor at `index` (wrapped into range).
    pub fn with_index(kind: SeriesKind, index: isize) -> Self {
        let mut series = Self::new(kind);
        series.index = wrap(index);
        series
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// MIDI note at the cursor.
    pub fn midi_note(&self) -> u8 {
        self.notes[self.index]
    }

    /// First index sounding the given MIDI note, if the series contains it.
    pub fn index_of(&self, midi: u8) -> Option<usize> {
        self.notes.iter().position(|&n| n == midi)
    }

    /// Move the cursor by `delta` entries, wrapping in either direction.
    pub fn step(&mut self, delta: isize) -> Position {
        self.index = wrap(self.index as isize + delta);
        self.position()
    }

    /// Place the cursor at an absolute index, wrapping in either direction.
    pub fn jump(&mut self, index: isize) -> Position {
        self.index = wrap(index);
        self.position()
    }

    /// Mark the current entry as the pivot.
    pub fn set_pivot(&mut self) {
        self.pivot = Some(self.index);
    }

    pub fn clear_pivot(&mut self) {
        self.pivot = None;
    }

    pub fn position(&self) -> Position {
        let names = self.kind.names();
        Position {
            index: self.index,
            previous_note: names[wrap(self.index as isize - 1)],
            current_note: names[self.index],
            next_note: names[wrap(self.index as isize + 1)],
            pivot_note: self.pivot.map(|p| names[p]),
            midi_note: self.notes[self.index],
        }
    }
}

fn wrap(index: isize) -> usize {
    index.rem_euclid(SERIES_LEN as isize) as usize
}
