//! Engine commands — control messages sent from the UI thread to the audio
//! thread over the lock-free ring buffer.

use super::synth::Timbre;

/// A control message for the audio thread.
///
/// Commands are drained at the start of every callback, so each takes effect
/// within one audio block of being pushed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCommand {
    /// Start sustaining the drone at the given MIDI note (plus its octave).
    DroneOn(u8),
    /// Release the drone voice.
    DroneOff,
    /// Start the metronome; the first click fires immediately.
    TickOn,
    /// Stop the metronome.
    TickOff,
    /// Set the metronome tempo in beats per minute.
    SetBpm(f64),
    /// Set the drone velocity (0.0..=1.0).
    SetVelocity(f32),
    /// Set the master volume (0.0..=1.0).
    SetVolume(f32),
    /// Switch the drone timbre.
    SetTimbre(Timbre),
}
