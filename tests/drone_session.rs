//! Full session integration tests — controller → ring buffer → audio
//! callback, rendered headlessly with no audio device involved.

use droneroo::audio::{EngineCallback, EngineCommand};
use droneroo::config::Config;
use droneroo::drone::Droner;
use droneroo::theory::SeriesKind;

use ringbuf::{traits::Split, HeapRb};

const SAMPLE_RATE: u32 = 44100;
const CHANNELS: u16 = 2;
const BLOCK_SIZE: usize = 1024;

/// Helper: build a fully wired session plus the callback that consumes it.
fn build_session(config: &Config) -> (Droner, EngineCallback) {
    let rb = HeapRb::<EngineCommand>::new(256);
    let (prod, cons) = rb.split();
    let droner = Droner::new(prod, config).expect("session setup");
    let callback = EngineCallback::new(cons, CHANNELS, SAMPLE_RATE);
    (droner, callback)
}

/// Helper: render `count` blocks and return them concatenated.
fn render_blocks(callback: &mut EngineCallback, count: usize) -> Vec<f32> {
    let mut all = Vec::with_capacity(count * BLOCK_SIZE * CHANNELS as usize);
    let mut block = vec![0.0f32; BLOCK_SIZE * CHANNELS as usize];
    for _ in 0..count {
        callback.process(&mut block);
        all.extend_from_slice(&block);
    }
    all
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
}

#[test]
fn session_is_silent_until_started() {
    let (_droner, mut callback) = build_session(&Config::default());
    let samples = render_blocks(&mut callback, 8);
    assert_eq!(peak(&samples), 0.0);
}

#[test]
fn toggling_the_drone_is_audible() {
    let (mut droner, mut callback) = build_session(&Config::default());

    droner.toggle_drone().unwrap();
    let playing = render_blocks(&mut callback, 16);
    assert!(peak(&playing) > 0.05, "drone inaudible");

    droner.toggle_drone().unwrap();
    // Skip past the release ramp, then expect true silence.
    render_blocks(&mut callback, 40);
    let silent = render_blocks(&mut callback, 8);
    assert_eq!(peak(&silent), 0.0);
}

#[test]
fn stepping_while_playing_keeps_sound_and_walks_the_circle() {
    let (mut droner, mut callback) = build_session(&Config::default());
    droner.toggle_drone().unwrap();

    // Circle of fourths from C: F, then A♯/B♭.
    let pos = droner.step(true).unwrap();
    assert_eq!(pos.current_note, "F");
    assert_eq!(pos.midi_note, 53);
    let samples = render_blocks(&mut callback, 16);
    assert!(peak(&samples) > 0.05);

    let pos = droner.step(true).unwrap();
    assert_eq!(pos.current_note, "A♯/B♭");
    assert_eq!(pos.midi_note, 58);

    // Back two brings us home with the pivot still at C.
    droner.step(false).unwrap();
    let pos = droner.step(false).unwrap();
    assert_eq!(pos.current_note, "C");
    assert_eq!(pos.pivot_note, Some("C"));
}

#[test]
fn linked_session_ticks_while_droning() {
    let config = Config {
        bpm: 120.0,
        ..Config::default()
    };
    let (mut droner, mut callback) = build_session(&config);

    droner.toggle_drone().unwrap();
    assert!(droner.is_ticking(), "link should start the metronome");

    // Two seconds at 120 BPM: drone plus four clicks. The click's 2.5 kHz
    // blip rides far above the drone, so the peak with ticks beats the
    // drone-only peak.
    let with_ticks = render_blocks(&mut callback, 87);
    assert!(peak(&with_ticks) > 0.05);

    droner.toggle_tick().unwrap();
    // Linked: stopping the metronome stops the drone too.
    assert!(!droner.is_droning());
    render_blocks(&mut callback, 40);
    let silent = render_blocks(&mut callback, 8);
    assert_eq!(peak(&silent), 0.0);
}

#[test]
fn unlinked_metronome_ticks_alone_at_the_beat_period() {
    let config = Config {
        linked: false,
        bpm: 120.0,
        ..Config::default()
    };
    let (mut droner, mut callback) = build_session(&config);

    droner.toggle_tick().unwrap();
    assert!(!droner.is_droning());

    // 1.2 s at 120 BPM → clicks at 0.0, 0.5, 1.0 s.
    let frames = (SAMPLE_RATE as f64 * 1.2) as usize;
    let blocks = frames.div_ceil(BLOCK_SIZE);
    let samples = render_blocks(&mut callback, blocks);

    let mut onsets = Vec::new();
    let mut quiet = true;
    for (i, frame) in samples.chunks(CHANNELS as usize).enumerate() {
        let level = frame[0].abs();
        if quiet && level > 0.05 {
            onsets.push(i);
            quiet = false;
        } else if !quiet && level < 1.0e-3 {
            quiet = true;
        }
    }
    assert!(onsets.len() >= 3, "onsets: {onsets:?}");
    let beat = SAMPLE_RATE as usize / 2;
    for pair in onsets.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(
            (gap as i64 - beat as i64).abs() <= 2,
            "beat gap {gap}, expected ~{beat}"
        );
    }
}

#[test]
fn series_switch_mid_session_changes_the_notes() {
    let (mut droner, mut callback) = build_session(&Config::default());
    droner.toggle_drone().unwrap();
    droner.set_series(SeriesKind::Chromatic, Some(3)).unwrap();

    let pos = droner.position();
    assert_eq!(pos.current_note, "D♯/E♭");
    assert_eq!(pos.midi_note, 51);

    let samples = render_blocks(&mut callback, 16);
    assert!(peak(&samples) > 0.05, "drone lost across series switch");
}

#[test]
fn velocity_zero_silences_the_drone_but_not_the_click() {
    let config = Config {
        velocity: 0.0,
        linked: false,
        ..Config::default()
    };
    let (mut droner, mut callback) = build_session(&config);

    droner.toggle_drone().unwrap();
    let drone_only = render_blocks(&mut callback, 16);
    assert_eq!(peak(&drone_only), 0.0);

    droner.toggle_tick().unwrap();
    let with_click = render_blocks(&mut callback, 16);
    assert!(peak(&with_click) > 0.05, "click should ignore velocity");
}
