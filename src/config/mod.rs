//! Session settings — YAML load/save/reset under `~/.droneroo/`.
//!
//! Everything the app remembers between runs lives in one small file.
//! Missing file means defaults; missing fields mean their defaults; values
//! out of range are clamped on load rather than rejected.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::Timbre;
use crate::drone::{MAX_BPM, MIN_BPM};
use crate::theory::{SeriesKind, SERIES_LEN};

/// Saved session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub series: SeriesKind,
    /// Cursor position within the series.
    #[serde(default)]
    pub index: usize,
    /// +1 or -1: which way "forward" steps.
    #[serde(default = "default_direction")]
    pub direction: i8,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_velocity")]
    pub velocity: f32,
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    /// Drone and metronome start/stop together.
    #[serde(default = "default_true")]
    pub linked: bool,
    #[serde(default)]
    pub timbre: Timbre,
}

fn default_direction() -> i8 {
    1
}

fn default_volume() -> f32 {
    1.0
}

fn default_velocity() -> f32 {
    0.8
}

fn default_bpm() -> f64 {
    60.0
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            series: SeriesKind::default(),
            index: 0,
            direction: default_direction(),
            volume: default_volume(),
            velocity: default_velocity(),
            bpm: default_bpm(),
            linked: default_true(),
            timbre: Timbre::default(),
        }
    }
}

impl Config {
    /// Clamp every field into its valid range.
    pub fn sanitized(mut self) -> Self {
        self.index %= SERIES_LEN;
        self.direction = if self.direction < 0 { -1 } else { 1 };
        self.volume = self.volume.clamp(0.0, 1.0);
        self.velocity = self.velocity.clamp(0.0, 1.0);
        self.bpm = self.bpm.clamp(MIN_BPM, MAX_BPM);
        self
    }
}

/// Default path for the settings file.
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".droneroo");
    path.push("config.yaml");
    path
}

/// Load settings from a YAML file. A missing file yields defaults.
pub fn load(path: &Path) -> Result<Config, io::Error> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_yaml::from_str(&content)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(config.sanitized())
}

/// Save settings, creating parent directories as needed.
pub fn save(path: &Path, config: &Config) -> Result<(), io::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(config).map_err(io::Error::other)?;
    std::fs::write(path, yaml)
}

/// Remove the settings file and return defaults.
pub fn reset(path: &Path) -> Result<Config, io::Error> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn load_nonexistent_returns_defaults() {
        let dir = tempdir().unwrap();
        let config = load(&dir.path().join("missing.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn save_and_load_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let config = Config {
            series: SeriesKind::Chromatic,
            index: 7,
            direction: -1,
            volume: 0.5,
            velocity: 0.6,
            bpm: 144.0,
            linked: false,
            timbre: Timbre::Beep,
        };
        save(file.path(), &config).unwrap();
        assert_eq!(load(file.path()).unwrap(), config);
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        save(&path, &Config::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "bpm: 90\nseries: Chromatic\n").unwrap();
        let config = load(file.path()).unwrap();
        assert_eq!(config.bpm, 90.0);
        assert_eq!(config.series, SeriesKind::Chromatic);
        assert_eq!(config.velocity, 0.8);
        assert!(config.linked);
    }

    #[test]
    fn malformed_yaml_is_invalid_data() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "series: [not, a, series").unwrap();
        let err = load(file.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "index: 27\ndirection: -3\nvolume: 2.5\nvelocity: -1.0\nbpm: 1000\n",
        )
        .unwrap();
        let config = load(file.path()).unwrap();
        assert_eq!(config.index, 3);
        assert_eq!(config.direction, -1);
        assert_eq!(config.volume, 1.0);
        assert_eq!(config.velocity, 0.0);
        assert_eq!(config.bpm, MAX_BPM);
    }

    #[test]
    fn reset_removes_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        save(&path, &Config::default()).unwrap();
        assert!(path.exists());

        let fresh = reset(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(fresh, Config::default());

        // Resetting again is fine.
        assert!(reset(&path).is_ok());
    }
}
