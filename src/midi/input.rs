//! Pedal input — attaches a MIDI foot controller to the pedal channel.
//!
//! Port selection is done in two stages: every port that can report a name
//! is collected first, then [`pick_port`] resolves the configured device
//! name against that list. Ports midir cannot name are skipped entirely; a
//! pedal we cannot identify in the status line is not worth guessing at.

use std::fmt;

use midir::{MidiInput, MidiInputConnection, MidiInputPort};

use super::config::PedalConfig;
use super::mapping::apply_pedal_message;
use crate::tui::external_input::PedalSender;

/// Ways attaching the foot pedal can fail.
#[derive(Debug)]
pub enum PedalError {
    /// The MIDI backend refused to initialize.
    Backend(String),
    /// Nothing is plugged in (or no port would report a name).
    NoPorts,
    /// A device name is configured but no port matches it.
    NoMatch {
        wanted: String,
        available: Vec<String>,
    },
    /// The port exists but the connection could not be opened.
    Connect(String),
}

impl fmt::Display for PedalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PedalError::Backend(e) => write!(f, "MIDI backend unavailable: {e}"),
            PedalError::NoPorts => write!(f, "no MIDI input ports to attach a pedal to"),
            PedalError::NoMatch { wanted, available } => {
                write!(f, "no MIDI port matches {wanted:?} (available: ")?;
                if available.is_empty() {
                    write!(f, "none)")
                } else {
                    write!(f, "{})", available.join(", "))
                }
            }
            PedalError::Connect(e) => write!(f, "could not open MIDI port: {e}"),
        }
    }
}

impl std::error::Error for PedalError {}

/// Active pedal connection. Dropping it disconnects.
pub struct PedalInput {
    _connection: MidiInputConnection<()>,
    port_name: String,
}

impl PedalInput {
    /// Attach the pedal described by `config` and start translating its
    /// messages into pedal events on `sender`.
    pub fn start(config: &PedalConfig, sender: PedalSender) -> Result<Self, PedalError> {
        let midi_in =
            MidiInput::new("droneroo").map_err(|e| PedalError::Backend(e.to_string()))?;

        let mut candidates = named_ports(&midi_in);
        let names: Vec<String> = candidates.iter().map(|(_, name)| name.clone()).collect();
        let index = pick_port(&names, config.device_name.as_deref())?;
        let (port, port_name) = candidates.swap_remove(index);

        let mappings = config.mappings.clone();
        let channel_filter = config.channel_filter;

        let connection = midi_in
            .connect(
                &port,
                "droneroo-pedal",
                move |_timestamp, msg, _| {
                    if let Some(event) = apply_pedal_message(msg, &mappings, channel_filter) {
                        let _ = sender.send(event);
                    }
                },
                (),
            )
            .map_err(|e| PedalError::Connect(e.to_string()))?;

        Ok(Self {
            _connection: connection,
            port_name,
        })
    }

    /// The connected port name, for the status line.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Names of all MIDI input ports currently visible.
    pub fn list_devices() -> Vec<String> {
        match MidiInput::new("droneroo-list") {
            Ok(midi_in) => named_ports(&midi_in)
                .into_iter()
                .map(|(_, name)| name)
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Collect every port that reports a name, pairing it with that name.
fn named_ports(midi_in: &MidiInput) -> Vec<(MidiInputPort, String)> {
    midi_in
        .ports()
        .into_iter()
        .filter_map(|port| {
            let name = midi_in.port_name(&port).ok()?;
            Some((port, name))
        })
        .collect()
}

/// Resolve a configured device name against the visible port names.
///
/// No configured name takes the first port. A configured name matches by
/// case-insensitive substring, so `fcb1010` finds "Behringer FCB1010 MIDI 1".
fn pick_port(names: &[String], wanted: Option<&str>) -> Result<usize, PedalError> {
    if names.is_empty() {
        return Err(PedalError::NoPorts);
    }
    let Some(wanted) = wanted else {
        return Ok(0);
    };

    let needle = wanted.to_ascii_lowercase();
    names
        .iter()
        .position(|name| name.to_ascii_lowercase().contains(&needle))
        .ok_or_else(|| PedalError::NoMatch {
            wanted: wanted.to_string(),
            available: names.to_vec(),
        })
}
