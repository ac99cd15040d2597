//! Audio callback — runs on the cpal audio thread.
//!
//! Drains commands from the ring buffer, renders the drone voice and the
//! metronome into the output, then applies master volume and the limiter.
//! All synthesis state lives here and is touched by no other thread.

use ringbuf::traits::Consumer;
use ringbuf::HeapCons;

use super::command::EngineCommand;
use super::limiter::Limiter;
use super::synth::{build_click, DroneVoice, Timbre};

/// Seed for the click's noise transient. Fixed so every run sounds the same.
const CLICK_SEED: u64 = 42;

/// Metronome tempo the callback starts with until a SetBpm arrives.
const DEFAULT_BPM: f64 = 60.0;

/// Beat clock plus the pre-rendered click it replays.
///
/// The period is tracked in fractional frames; the remainder carries over
/// from beat to beat, so the tick does not drift over long sessions.
struct Ticker {
    click: Vec<f32>,
    period_frames: f64,
    countdown: f64,
    play_pos: Option<usize>,
    enabled: bool,
    sample_rate: f64,
}

impl Ticker {
    fn new(sample_rate: u32, bpm: f64) -> Self {
        let sr = sample_rate as f64;
        Self {
            click: build_click(sample_rate, CLICK_SEED),
            period_frames: sr * 60.0 / bpm,
            countdown: 0.0,
            play_pos: None,
            enabled: false,
            sample_rate: sr,
        }
    }

    /// Change tempo, preserving the fraction of the beat already elapsed so
    /// a nudge never double-fires.
    fn set_bpm(&mut self, bpm: f64) {
        let bpm = bpm.max(1.0);
        let new_period = self.sample_rate * 60.0 / bpm;
        let remaining = (self.countdown / self.period_frames).clamp(0.0, 1.0);
        self.period_frames = new_period;
        self.countdown = remaining * new_period;
    }

    fn enable(&mut self) {
        self.enabled = true;
        // First click lands on the very next frame.
        self.countdown = 0.0;
    }

    fn disable(&mut self) {
        self.enabled = false;
        // Let an in-flight click ring out rather than cutting it.
    }

    /// Mix the metronome into an interleaved output buffer.
    fn render(&mut self, output: &mut [f32], channels: usize) {
        if !self.enabled && self.play_pos.is_none() {
            return;
        }

        for frame in output.chunks_mut(channels) {
            if self.enabled {
                self.countdown -= 1.0;
                if self.countdown <= 0.0 {
                    self.countdown += self.period_frames;
                    self.play_pos = Some(0);
                }
            }

            if let Some(pos) = self.play_pos {
                let sample = self.click[pos];
                for slot in frame.iter_mut() {
                    *slot += sample;
                }
                self.play_pos = if pos + 1 < self.click.len() {
                    Some(pos + 1)
                } else {
                    None
                };
            }
        }
    }
}

/// State that lives on the audio thread. Accessed only from the cpal callback
/// (or a headless render loop in tests and offline bounces).
pub struct EngineCallback {
    consumer: HeapCons<EngineCommand>,
    drone: DroneVoice,
    ticker: Ticker,
    volume: f32,
    limiter: Limiter,
    channels: u16,
    sample_rate: u32,
}

impl EngineCallback {
    /// Create a callback with the given ring buffer consumer.
    pub fn new(consumer: HeapCons<EngineCommand>, channels: u16, sample_rate: u32) -> Self {
        Self {
            consumer,
            drone: DroneVoice::new(sample_rate, Timbre::default()),
            ticker: Ticker::new(sample_rate, DEFAULT_BPM),
            volume: 1.0,
            limiter: Limiter::default(),
            channels,
            sample_rate,
        }
    }

    /// Called by cpal for each audio block. Fills `output` with samples.
    pub fn process(&mut self, output: &mut [f32]) {
        while let Some(cmd) = self.consumer.try_pop() {
            self.apply(cmd);
        }

        output.fill(0.0);
        let channels = self.channels as usize;
        self.drone.render(output, channels);
        self.ticker.render(output, channels);

        for sample in output.iter_mut() {
            *sample = self.limiter.process(*sample * self.volume);
        }
    }

    fn apply(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::DroneOn(note) => self.drone.note_on(note),
            EngineCommand::DroneOff => self.drone.note_off(),
            EngineCommand::TickOn => self.ticker.enable(),
            EngineCommand::TickOff => self.ticker.disable(),
            EngineCommand::SetBpm(bpm) => self.ticker.set_bpm(bpm),
            EngineCommand::SetVelocity(v) => self.drone.set_velocity(v),
            EngineCommand::SetVolume(v) => self.volume = v.clamp(0.0, 1.0),
            EngineCommand::SetTimbre(timbre) => self.drone.set_timbre(timbre),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}
