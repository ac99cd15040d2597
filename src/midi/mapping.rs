//! Pedal message mapping — converts raw MIDI bytes to pedal events.

use serde::{Deserialize, Serialize};

use crate::tui::external_input::PedalEvent;

/// Mapping rule from MIDI messages to pedal events.
///
/// CC rules fire on the press edge only (value ≥ 64), so a pedal that sends
/// 127 on press and 0 on release steps exactly once per press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PedalMapping {
    /// A note press steps the series.
    NoteToStep { note: u8, delta: i8 },
    /// A note press toggles the drone.
    NoteToDrone { note: u8 },
    /// A controller press steps the series.
    CcToStep { cc: u8, delta: i8 },
    /// A controller press toggles the drone.
    CcToDrone { cc: u8 },
    /// A controller press toggles the metronome.
    CcToTick { cc: u8 },
}

/// Controller values at or above this count as "pedal down".
const CC_PRESS_THRESHOLD: u8 = 64;

/// Parse a raw MIDI message and apply mappings to produce a pedal event.
///
/// MIDI message format:
/// - Note On:  [0x90 | channel, note, velocity]
/// - Note Off: [0x80 | channel, note, velocity]
/// - CC:       [0xB0 | channel, cc_number, value]
pub fn apply_pedal_message(
    msg: &[u8],
    mappings: &[PedalMapping],
    channel_filter: Option<u8>,
) -> Option<PedalEvent> {
    if msg.len() < 3 {
        return None;
    }

    let status = msg[0] & 0xF0;
    let channel = msg[0] & 0x0F;

    if let Some(filter) = channel_filter {
        if channel != filter {
            return None;
        }
    }

    match status {
        // Note On with nonzero velocity; velocity 0 is a release in disguise.
        0x90 if msg[2] > 0 => {
            let note = msg[1];
            mappings.iter().find_map(|mapping| match mapping {
                PedalMapping::NoteToStep { note: n, delta } if *n == note => {
                    Some(PedalEvent::Step(*delta))
                }
                PedalMapping::NoteToDrone { note: n } if *n == note => {
                    Some(PedalEvent::ToggleDrone)
                }
                _ => None,
            })
        }
        // CC press edge.
        0xB0 if msg[2] >= CC_PRESS_THRESHOLD => {
            let cc_number = msg[1];
            mappings.iter().find_map(|mapping| match mapping {
                PedalMapping::CcToStep { cc, delta } if *cc == cc_number => {
                    Some(PedalEvent::Step(*delta))
                }
                PedalMapping::CcToDrone { cc } if *cc == cc_number => {
                    Some(PedalEvent::ToggleDrone)
                }
                PedalMapping::CcToTick { cc } if *cc == cc_number => {
                    Some(PedalEvent::ToggleTick)
                }
                _ => None,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::PedalConfig;

    fn defaults() -> Vec<PedalMapping> {
        PedalConfig::default().mappings
    }

    #[test]
    fn sustain_pedal_steps_forward() {
        let event = apply_pedal_message(&[0xB0, 64, 127], &defaults(), None);
        assert_eq!(event, Some(PedalEvent::Step(1)));
    }

    #[test]
    fn soft_pedal_steps_back() {
        let event = apply_pedal_message(&[0xB0, 67, 127], &defaults(), None);
        assert_eq!(event, Some(PedalEvent::Step(-1)));
    }

    #[test]
    fn sostenuto_toggles_the_drone() {
        let event = apply_pedal_message(&[0xB0, 66, 100], &defaults(), None);
        assert_eq!(event, Some(PedalEvent::ToggleDrone));
    }

    #[test]
    fn pedal_release_does_not_fire() {
        assert_eq!(apply_pedal_message(&[0xB0, 64, 0], &defaults(), None), None);
        assert_eq!(apply_pedal_message(&[0xB0, 64, 63], &defaults(), None), None);
    }

    #[test]
    fn note_mappings_fire_on_note_on() {
        let mappings = vec![
            PedalMapping::NoteToStep { note: 60, delta: 1 },
            PedalMapping::NoteToDrone { note: 61 },
        ];
        assert_eq!(
            apply_pedal_message(&[0x90, 60, 100], &mappings, None),
            Some(PedalEvent::Step(1))
        );
        assert_eq!(
            apply_pedal_message(&[0x90, 61, 1], &mappings, None),
            Some(PedalEvent::ToggleDrone)
        );
        // Note On with velocity 0 is a release.
        assert_eq!(apply_pedal_message(&[0x90, 60, 0], &mappings, None), None);
        // Real Note Off is ignored too.
        assert_eq!(apply_pedal_message(&[0x80, 60, 64], &mappings, None), None);
    }

    #[test]
    fn channel_filter_rejects_other_channels() {
        let event = apply_pedal_message(&[0xB1, 64, 127], &defaults(), Some(0));
        assert_eq!(event, None);
        let event = apply_pedal_message(&[0xB1, 64, 127], &defaults(), Some(1));
        assert_eq!(event, Some(PedalEvent::Step(1)));
    }

    #[test]
    fn unmapped_and_short_messages_are_ignored() {
        assert_eq!(apply_pedal_message(&[0xB0, 1, 127], &defaults(), None), None);
        assert_eq!(apply_pedal_message(&[0xF8], &defaults(), None), None);
        assert_eq!(apply_pedal_message(&[], &defaults(), None), None);
    }

    #[test]
    fn cc_to_tick_mapping() {
        let mappings = vec![PedalMapping::CcToTick { cc: 65 }];
        assert_eq!(
            apply_pedal_message(&[0xB0, 65, 127], &mappings, None),
            Some(PedalEvent::ToggleTick)
        );
    }
}
