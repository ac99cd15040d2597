//! Note name parsing — converts "C", "D♭", "F𝄪" to MIDI note numbers.

use std::fmt;

/// MIDI note number the drone octave starts at (C2 in scientific pitch
/// notation). Every parse lands in `DRONE_OCTAVE_BASE..DRONE_OCTAVE_BASE + 12`.
pub const DRONE_OCTAVE_BASE: u8 = 48;

/// Error returned when a string does not begin with a recognized note name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteParseError {
    input: String,
}

impl NoteParseError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }

    /// The string that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for NoteParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized note name: {:?}", self.input)
    }
}

impl std::error::Error for NoteParseError {}

/// Accidental spellings in match priority order. Double-accidental spellings
/// come before the single spellings that prefix them, so "♭♭" is never read
/// as a lone "♭". Letters are case-insensitive; accidentals are not ("x" is
/// a double sharp, "X" is nothing).
const ACCIDENTALS: &[(&str, i32)] = &[
    ("𝄫", -2),
    ("♭♭", -2),
    ("bb", -2),
    ("𝄪", 2),
    ("##", 2),
    ("♯♯", 2),
    ("x", 2),
    ("♭", -1),
    ("b", -1),
    ("♯", 1),
    ("#", 1),
];

/// Parse the leading note name of `name` into a MIDI note number.
///
/// Format: `<letter><optional accidental>`
/// - Letter: C, D, E, F, G, A, B (either case)
/// - Accidental: flat/sharp, single or double, Unicode or ASCII
///
/// The result is always in the fixed drone octave, 48..=59; spellings that
/// cross an octave boundary wrap into it (C♭ → 59, B♯ → 48).
///
/// Matching stops after the accidental and ignores the rest of the string,
/// so compound display names like "D♯/E♭" resolve to their first spelling.
pub fn note_to_midi(name: &str) -> Result<u8, NoteParseError> {
    let mut chars = name.chars();
    let letter = chars.next().ok_or_else(|| NoteParseError::new(name))?;

    // White-key semitone offsets, not alphabetic positions.
    let natural: i32 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(NoteParseError::new(name)),
    };

    let pitch_class = (natural + accidental_delta(chars.as_str())).rem_euclid(12);
    Ok(DRONE_OCTAVE_BASE + pitch_class as u8)
}

/// Single pass over the ordered spelling table; the first match wins.
fn accidental_delta(rest: &str) -> i32 {
    ACCIDENTALS
        .iter()
        .find(|(spelling, _)| rest.starts_with(spelling))
        .map_or(0, |&(_, delta)| delta)
}
