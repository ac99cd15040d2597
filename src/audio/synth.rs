//! Drone and click synthesis — everything that turns state into samples.
//!
//! The drone voice sustains the selected note plus its octave double. Gate
//! transitions go through short one-pole ramps so starts, stops, and note
//! changes never click. The metronome click is rendered once up front and
//! replayed by the callback.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Drone timbre presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timbre {
    /// Detuned-saw ensemble, a nod to the string patch of old practice apps.
    #[default]
    Strings,
    /// Plain sine beep.
    Beep,
}

impl Timbre {
    pub fn all() -> &'static [Timbre] {
        &[Timbre::Strings, Timbre::Beep]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Timbre::Strings => "Strings",
            Timbre::Beep => "Beep",
        }
    }

    pub fn next(&self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|t| t == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }
}

impl std::str::FromStr for Timbre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strings" => Ok(Timbre::Strings),
            "beep" => Ok(Timbre::Beep),
            _ => Err(format!("unknown timbre {s:?} (expected strings or beep)")),
        }
    }
}

/// Convert a MIDI note number to frequency in Hz.
///
/// Standard tuning: A4 (MIDI 69) = 440 Hz.
pub fn midi_to_freq(note: u8) -> f64 {
    440.0 * 2.0f64.powf((note as f64 - 69.0) / 12.0)
}

/// Detune ratio between the paired saws of the strings timbre (~0.3%).
const STRINGS_DETUNE: f64 = 1.003;

/// Attack ramp time constant in seconds.
const ATTACK_TAU: f64 = 0.010;

/// Release ramp time constant in seconds.
const RELEASE_TAU: f64 = 0.040;

/// Gain below which a released voice counts as silent.
const QUIET_FLOOR: f32 = 1.0e-4;

/// The sustained drone voice: root note plus octave double.
pub struct DroneVoice {
    sample_rate: f64,
    timbre: Timbre,
    freq: f64,
    velocity: f32,
    /// Oscillator phases: root, root detuned, octave, octave detuned.
    phases: [f64; 4],
    /// Smoothed gate level.
    gain: f32,
    /// Gate target: 1.0 while the drone is held, 0.0 after release.
    gate: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

impl DroneVoice {
    pub fn new(sample_rate: u32, timbre: Timbre) -> Self {
        let sr = sample_rate as f64;
        Self {
            sample_rate: sr,
            timbre,
            freq: 0.0,
            velocity: 1.0,
            phases: [0.0; 4],
            gain: 0.0,
            gate: 0.0,
            attack_coeff: one_pole_coeff(ATTACK_TAU, sr),
            release_coeff: one_pole_coeff(RELEASE_TAU, sr),
        }
    }

    /// Hold the drone at `note`. Retriggering with a new note while held
    /// changes pitch without re-attacking.
    pub fn note_on(&mut self, note: u8) {
        self.freq = midi_to_freq(note);
        self.gate = 1.0;
    }

    /// Release the drone; the gain ramps down over the release time.
    pub fn note_off(&mut self) {
        self.gate = 0.0;
    }

    pub fn set_timbre(&mut self, timbre: Timbre) {
        self.timbre = timbre;
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = velocity.clamp(0.0, 1.0);
    }

    /// True once the release ramp has decayed to the floor.
    pub fn is_quiet(&self) -> bool {
        self.gate == 0.0 && self.gain < QUIET_FLOOR
    }

    /// Mix this voice into an interleaved output buffer.
    pub fn render(&mut self, output: &mut [f32], channels: usize) {
        if self.is_quiet() || self.freq <= 0.0 {
            return;
        }

        let root_inc = self.freq / self.sample_rate;
        let increments = [
            root_inc,
            root_inc * STRINGS_DETUNE,
            root_inc * 2.0,
            root_inc * 2.0 * STRINGS_DETUNE,
        ];

        for frame in output.chunks_mut(channels) {
            let coeff = if self.gate > self.gain {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.gain += (self.gate - self.gain) * coeff;

            let sample = self.sample_once() * self.gain * self.velocity;
            for slot in frame.iter_mut() {
                *slot += sample;
            }

            for (phase, inc) in self.phases.iter_mut().zip(increments) {
                *phase += inc;
                if *phase >= 1.0 {
                    *phase -= 1.0;
                }
            }
        }
    }

    /// One mono sample at the current phases, before gain and velocity.
    fn sample_once(&self) -> f32 {
        let [p_root, p_root_det, p_oct, p_oct_det] = self.phases;
        let value = match self.timbre {
            Timbre::Strings => {
                // Octave double at half weight, like the two sampler notes
                // it replaces.
                (saw(p_root) + saw(p_root_det)) * 0.25 + (saw(p_oct) + saw(p_oct_det)) * 0.125
            }
            Timbre::Beep => sine(p_root) * 0.5 + sine(p_oct) * 0.25,
        };
        value as f32
    }
}

fn sine(phase: f64) -> f64 {
    (phase * 2.0 * PI).sin()
}

fn saw(phase: f64) -> f64 {
    2.0 * phase - 1.0
}

fn one_pole_coeff(tau: f64, sample_rate: f64) -> f32 {
    (1.0 - (-1.0 / (tau * sample_rate)).exp()) as f32
}

/// Click length in seconds, including the decay tail.
const CLICK_SECONDS: f64 = 0.06;

/// Carrier frequency of the click blip. Bright enough to cut through a drone.
const CLICK_FREQ: f64 = 2500.0;

/// Pre-render the metronome click: a decaying sine blip with a short seeded
/// noise transient on top. Deterministic for a given seed.
pub fn build_click(sample_rate: u32, seed: u64) -> Vec<f32> {
    let sr = sample_rate as f64;
    let len = (CLICK_SECONDS * sr) as usize;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut click = Vec::with_capacity(len);
    for i in 0..len {
        let t = i as f64 / sr;
        let blip = (2.0 * PI * CLICK_FREQ * t).sin() * (-t / 0.008).exp();
        let transient = if t < 0.003 {
            rng.gen_range(-1.0f64..1.0) * (-t / 0.001).exp() * 0.3
        } else {
            0.0
        };
        click.push(((blip * 0.8 + transient) * 0.9) as f32);
    }
    click
}
