//! Offline bounce — render a drone session straight to a WAV file.
//!
//! Drives the same [`EngineCallback`] the live stream uses, block by block,
//! with no audio device involved.

use std::path::Path;

use ringbuf::{
    traits::{Producer, Split},
    HeapRb,
};

use super::callback::EngineCallback;
use super::command::EngineCommand;
use super::synth::Timbre;

const BLOCK_FRAMES: usize = 1024;
const CHANNELS: u16 = 2;

/// What to render.
#[derive(Debug, Clone)]
pub struct BounceOptions {
    /// MIDI note of the drone root.
    pub note: u8,
    pub seconds: f64,
    pub bpm: f64,
    /// Include the metronome click.
    pub tick: bool,
    pub timbre: Timbre,
    pub velocity: f32,
    pub sample_rate: u32,
}

impl Default for BounceOptions {
    fn default() -> Self {
        Self {
            note: 48,
            seconds: 10.0,
            bpm: 60.0,
            tick: false,
            timbre: Timbre::Strings,
            velocity: 0.8,
            sample_rate: 44100,
        }
    }
}

/// Offline render errors.
#[derive(Debug)]
pub enum BounceError {
    /// Zero or negative duration requested.
    EmptyRender,
    /// WAV encoding or I/O failure.
    Wav(hound::Error),
}

impl std::fmt::Display for BounceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BounceError::EmptyRender => write!(f, "nothing to render: duration must be positive"),
            BounceError::Wav(e) => write!(f, "wav error: {e}"),
        }
    }
}

impl std::error::Error for BounceError {}

impl From<hound::Error> for BounceError {
    fn from(e: hound::Error) -> Self {
        BounceError::Wav(e)
    }
}

/// Render `opts` to a 16-bit stereo WAV at `path`.
pub fn bounce(opts: &BounceOptions, path: &Path) -> Result<(), BounceError> {
    if opts.seconds <= 0.0 {
        return Err(BounceError::EmptyRender);
    }

    let samples = render(opts);

    let spec = hound::WavSpec {
        channels: CHANNELS,
        sample_rate: opts.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &samples {
        let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(quantized)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Render `opts` to interleaved stereo samples in memory.
pub fn render(opts: &BounceOptions) -> Vec<f32> {
    let rb = HeapRb::<EngineCommand>::new(16);
    let (mut producer, consumer) = rb.split();

    // The queue has room for the whole setup burst; pushes cannot fail.
    let _ = producer.try_push(EngineCommand::SetTimbre(opts.timbre));
    let _ = producer.try_push(EngineCommand::SetVelocity(opts.velocity));
    let _ = producer.try_push(EngineCommand::SetBpm(opts.bpm));
    let _ = producer.try_push(EngineCommand::DroneOn(opts.note));
    if opts.tick {
        let _ = producer.try_push(EngineCommand::TickOn);
    }

    let mut callback = EngineCallback::new(consumer, CHANNELS, opts.sample_rate);

    let total_frames = (opts.seconds * opts.sample_rate as f64) as usize;
    let mut samples = Vec::with_capacity(total_frames * CHANNELS as usize);
    let mut block = vec![0.0f32; BLOCK_FRAMES * CHANNELS as usize];

    let mut rendered = 0;
    while rendered < total_frames {
        let frames = BLOCK_FRAMES.min(total_frames - rendered);
        let len = frames * CHANNELS as usize;
        callback.process(&mut block[..len]);
        samples.extend_from_slice(&block[..len]);
        rendered += frames;
    }
    samples
}
