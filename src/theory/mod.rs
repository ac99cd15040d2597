//! Music theory primitives — note-name parsing and tonal series.

pub mod note;
pub mod series;

pub use note::{note_to_midi, NoteParseError, DRONE_OCTAVE_BASE};
pub use series::{Position, Series, SeriesKind, SERIES_LEN};
