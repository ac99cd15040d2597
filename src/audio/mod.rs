//! Audio engine — cpal output stream fed by a lock-free command queue.
//!
//! The engine owns the stream; the audio thread owns all synthesis state
//! (see [`callback`]). The rest of the app talks to the audio thread only by
//! pushing [`EngineCommand`]s into the ring buffer producer the engine hands
//! back on startup.

pub mod bounce;
pub mod callback;
pub mod command;
pub mod limiter;
pub mod synth;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{traits::Split, HeapProd, HeapRb};

pub use bounce::{bounce, BounceError, BounceOptions};
pub use callback::EngineCallback;
pub use command::EngineCommand;
pub use limiter::Limiter;
pub use synth::{midi_to_freq, DroneVoice, Timbre};

/// Ring buffer capacity (number of commands).
const RING_BUFFER_CAPACITY: usize = 256;

/// Producer half of the command queue, held by the session controller.
pub type CommandSender = HeapProd<EngineCommand>;

/// Ways the drone can fail to reach the speakers.
#[derive(Debug)]
pub enum AudioError {
    /// No output device to play the drone through.
    NoDevice,
    /// The output device would not report a usable configuration.
    DeviceConfig(String),
    /// The output stream could not be opened or started.
    Stream(String),
    /// The engine command queue is full; the audio thread has stalled.
    CommandQueueFull,
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::NoDevice => {
                write!(f, "no audio output device to play the drone through")
            }
            AudioError::DeviceConfig(e) => {
                write!(f, "unusable output device configuration: {e}")
            }
            AudioError::Stream(e) => write!(f, "audio output stream failed: {e}"),
            AudioError::CommandQueueFull => {
                write!(f, "engine command queue full; audio thread is not draining")
            }
        }
    }
}

impl std::error::Error for AudioError {}

/// The running audio engine. Dropping it stops the stream.
pub struct AudioEngine {
    _stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
}

impl AudioEngine {
    /// Open the default output device and start the stream.
    ///
    /// Returns the engine plus the command producer to hand to the session
    /// controller.
    pub fn start() -> Result<(Self, CommandSender), AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        let rb = HeapRb::<EngineCommand>::new(RING_BUFFER_CAPACITY);
        let (producer, consumer) = rb.split();

        let mut engine_callback = EngineCallback::new(consumer, channels, sample_rate);

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_fn = |err: cpal::StreamError| {
            eprintln!("audio stream error: {err}");
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    engine_callback.process(data);
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        Ok((
            Self {
                _stream: stream,
                sample_rate,
                channels,
            },
            producer,
        ))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires an audio device — run manually with `cargo test -- --ignored`
    fn engine_starts_on_default_device() {
        let engine = AudioEngine::start();
        assert!(engine.is_ok(), "AudioEngine::start failed: {:?}", engine.err());
        let (engine, _sender) = engine.unwrap();
        assert!(engine.sample_rate() > 0);
        assert!(engine.channels() > 0);
    }

    #[test]
    fn error_display() {
        assert_eq!(
            AudioError::NoDevice.to_string(),
            "no audio output device to play the drone through"
        );
        assert_eq!(
            AudioError::CommandQueueFull.to_string(),
            "engine command queue full; audio thread is not draining"
        );
        assert_eq!(
            AudioError::Stream("boom".into()).to_string(),
            "audio output stream failed: boom"
        );
    }
}
