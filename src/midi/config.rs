//! Pedal configuration — device selection and mapping rules loaded from
//! `~/.droneroo/pedal.yaml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::mapping::PedalMapping;

/// MIDI pedal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedalConfig {
    /// Preferred MIDI device name (substring match). None = first available.
    #[serde(default)]
    pub device_name: Option<String>,
    /// Only accept messages on this MIDI channel (0-15). None = all channels.
    #[serde(default)]
    pub channel_filter: Option<u8>,
    /// Mapping rules from MIDI messages to pedal events.
    #[serde(default = "PedalConfig::default_mappings")]
    pub mappings: Vec<PedalMapping>,
}

impl PedalConfig {
    /// Default path for the pedal configuration file.
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".droneroo");
        path.push("pedal.yaml");
        path
    }

    /// Load config from the standard path.
    /// Returns None if the file doesn't exist or doesn't parse.
    pub fn load() -> Option<Self> {
        let content = std::fs::read_to_string(Self::default_path()).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    /// Default mappings: sustain pedal steps forward, soft pedal steps back,
    /// sostenuto toggles the drone.
    fn default_mappings() -> Vec<PedalMapping> {
        vec![
            PedalMapping::CcToStep { cc: 64, delta: 1 },
            PedalMapping::CcToStep { cc: 67, delta: -1 },
            PedalMapping::CcToDrone { cc: 66 },
        ]
    }
}

impl Default for PedalConfig {
    fn default() -> Self {
        Self {
            device_name: None,
            channel_filter: None,
            mappings: Self::default_mappings(),
        }
    }
}
